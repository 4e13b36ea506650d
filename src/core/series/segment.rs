use chrono::TimeDelta;
use itertools::Itertools;

use crate::core::{observation::Observation, session::Session};

impl<T> Segment for T where T: ?Sized {}

pub trait Segment {
    /// Sort the observations and split them wherever the gap to the predecessor exceeds `idle_threshold`.
    ///
    /// A gap equal to the threshold stays within the session. Session IDs count up from zero.
    #[must_use]
    fn segment(self, idle_threshold: TimeDelta) -> Vec<Session>
    where
        Self: Sized + Iterator<Item = Observation>,
    {
        let mut sessions: Vec<Session> = Vec::new();
        for observation in self.sorted_by_key(|observation| observation.timestamp) {
            if let Some(session) = sessions.last_mut()
                && !session.is_idle_before(observation.timestamp, idle_threshold)
            {
                session.push(observation);
            } else {
                sessions.push(Session::new(sessions.len(), observation));
            }
        }
        sessions
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::quantity::power::Kilowatts;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(hour, minute, 0).unwrap()
    }

    fn observation(hour: u32, minute: u32, watts: f64) -> Observation {
        Observation::new(at(hour, minute), Kilowatts::from_watts(watts))
    }

    fn session_sizes(sessions: &[Session]) -> Vec<usize> {
        sessions.iter().map(|session| session.observations.len()).collect()
    }

    #[test]
    fn test_empty() {
        assert!(std::iter::empty::<Observation>().segment(TimeDelta::minutes(10)).is_empty());
    }

    #[test]
    fn test_single_observation() {
        let sessions = [observation(3, 0, 500.0)].into_iter().segment(TimeDelta::minutes(10));
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, 0);
        assert_eq!(sessions[0].observations, [observation(3, 0, 500.0)]);
    }

    #[test]
    fn test_gap_equal_to_threshold_does_not_split() {
        let sessions = [observation(8, 0, 1.0), observation(8, 10, 2.0), observation(8, 20, 3.0)]
            .into_iter()
            .segment(TimeDelta::minutes(10));
        assert_eq!(session_sizes(&sessions), [3]);
    }

    #[test]
    fn test_gap_above_threshold_splits() {
        let sessions = [
            observation(8, 0, 1.0),
            observation(8, 5, 2.0),
            observation(8, 16, 3.0),
            observation(9, 0, 4.0),
            observation(9, 1, 5.0),
        ]
        .into_iter()
        .segment(TimeDelta::minutes(10));
        assert_eq!(session_sizes(&sessions), [2, 1, 2]);
        assert_eq!(sessions.iter().map(|session| session.id).collect::<Vec<_>>(), [0, 1, 2]);
    }

    #[test]
    fn test_sorts_unordered_input() {
        let sessions = [observation(9, 0, 3.0), observation(8, 0, 1.0), observation(8, 5, 2.0)]
            .into_iter()
            .segment(TimeDelta::minutes(10));
        assert_eq!(session_sizes(&sessions), [2, 1]);
        assert_eq!(sessions[0].observations[0], observation(8, 0, 1.0));
        assert_eq!(sessions[1].observations[0], observation(9, 0, 3.0));
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let sessions = [observation(8, 0, 1.0), observation(8, 0, 2.0), observation(7, 55, 0.0)]
            .into_iter()
            .segment(TimeDelta::minutes(10));
        assert_eq!(
            sessions[0].observations,
            [observation(7, 55, 0.0), observation(8, 0, 1.0), observation(8, 0, 2.0)],
        );
    }

    #[test]
    fn test_session_count_matches_gap_count() {
        let minutes = [0_i64, 3, 30, 31, 32, 60, 200, 205, 216, 217];
        let observations = minutes
            .iter()
            .map(|minute| Observation::new(at(0, 0) + TimeDelta::minutes(*minute), Kilowatts::ZERO))
            .collect::<Vec<_>>();
        let n_gaps = minutes.iter().tuple_windows().filter(|(lhs, rhs)| *rhs - *lhs > 10).count();

        let sessions = observations.clone().into_iter().segment(TimeDelta::minutes(10));
        assert_eq!(sessions.len(), 1 + n_gaps);

        let flattened = sessions
            .into_iter()
            .flat_map(|session| session.observations)
            .collect::<Vec<_>>();
        assert_eq!(flattened, observations);
    }
}
