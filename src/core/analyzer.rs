use bon::Builder;
use chrono::TimeDelta;

use crate::{
    core::{
        observation::Observation,
        series::Segment,
        session::{ResampledSession, Session},
        summary::SessionSummary,
        tariff::TariffSchedule,
    },
    prelude::*,
};

#[derive(Builder)]
pub struct Analyzer<'a> {
    /// Gap between neighbouring observations above which a new session starts.
    #[builder(default = TimeDelta::minutes(10))]
    idle_threshold: TimeDelta,

    #[builder(default = TimeDelta::minutes(30))]
    bucket_width: TimeDelta,

    tariff: &'a TariffSchedule,
}

/// Bucket series and summaries, both ordered by session ID.
#[derive(Default)]
pub struct Analysis {
    pub sessions: Vec<ResampledSession>,
    pub summaries: Vec<SessionSummary>,
}

impl Analyzer<'_> {
    pub const MAX_BUCKET_WIDTH: TimeDelta = TimeDelta::days(366);

    /// Segment, resample, and price the observations.
    ///
    /// A session that fails an internal check is logged and left out, the others are unaffected.
    #[instrument(skip_all, fields(n_observations = observations.len()))]
    pub fn analyze(&self, observations: Vec<Observation>) -> Result<Analysis> {
        ensure!(
            self.idle_threshold > TimeDelta::zero(),
            "idle threshold must be positive, got {}",
            self.idle_threshold,
        );
        ensure!(
            self.bucket_width >= TimeDelta::milliseconds(1),
            "bucket width must be at least 1ms, got {}",
            self.bucket_width,
        );
        ensure!(
            self.bucket_width.subsec_nanos() % 1_000_000 == 0,
            "bucket width must be whole milliseconds, got {}",
            self.bucket_width,
        );
        ensure!(
            self.bucket_width <= Self::MAX_BUCKET_WIDTH,
            "bucket width must not exceed {}, got {}",
            Self::MAX_BUCKET_WIDTH,
            self.bucket_width,
        );

        let sessions = observations.into_iter().segment(self.idle_threshold);
        info!(n_sessions = sessions.len(), "segmented");

        let mut analysis = Analysis::default();
        for session in &sessions {
            match self.analyze_session(session) {
                Ok((resampled, summary)) => {
                    analysis.sessions.push(resampled);
                    analysis.summaries.push(summary);
                }
                Err(error) => {
                    error!(session.id, "skipping the session: {error:#}");
                }
            }
        }
        Ok(analysis)
    }

    fn analyze_session(&self, session: &Session) -> Result<(ResampledSession, SessionSummary)> {
        let resampled = session
            .resample(self.bucket_width)
            .with_context(|| format!("failed to resample session #{}", session.id))?;
        debug!(
            session.id,
            n_observations = session.observations.len(),
            n_buckets = resampled.buckets.len(),
            "resampled"
        );
        let summary = SessionSummary::try_calculate(&resampled, self.tariff, self.bucket_width)
            .with_context(|| format!("failed to summarize session #{}", session.id))?;
        Ok((resampled, summary))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, NaiveDateTime};
    use itertools::Itertools;

    use super::*;
    use crate::quantity::power::Kilowatts;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(hour, minute, 0).unwrap()
    }

    fn observation(hour: u32, minute: u32, watts: f64) -> Observation {
        Observation::new(at(hour, minute), Kilowatts::from_watts(watts))
    }

    #[test]
    fn test_empty_input() {
        let tariff = TariffSchedule::default();
        let analysis = Analyzer::builder().tariff(&tariff).build().analyze(Vec::new()).unwrap();
        assert!(analysis.sessions.is_empty());
        assert!(analysis.summaries.is_empty());
    }

    #[test]
    fn test_single_session() {
        let tariff = TariffSchedule::default();
        let analysis = Analyzer::builder()
            .idle_threshold(TimeDelta::minutes(30))
            .tariff(&tariff)
            .build()
            .analyze(vec![
                observation(8, 45, 150.0),
                observation(8, 0, 100.0),
                observation(8, 15, 200.0),
            ])
            .unwrap();

        assert_eq!(analysis.sessions.len(), 1);
        let starts = analysis.sessions[0].buckets.iter().map(|bucket| bucket.start()).collect_vec();
        assert_eq!(starts, [at(8, 0), at(8, 30)]);

        assert_eq!(analysis.summaries.len(), 1);
        let totals = analysis.summaries[0].totals.unwrap();
        assert_eq!(totals.start, at(8, 0));
        assert_eq!(totals.end, at(8, 30));
        assert_abs_diff_eq!(totals.duration_hours(), 0.5);
        assert_abs_diff_eq!(totals.mean_power.watts(), 150.0, epsilon = 1e-9);
        assert_abs_diff_eq!(totals.energy.0, 0.075, epsilon = 1e-12);
        assert_abs_diff_eq!(
            totals.cost.0,
            2.0 * 0.15 * 0.5 * TariffSchedule::DEFAULT_PEAK_RATE.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_default_idle_threshold_splits_sessions() {
        let tariff = TariffSchedule::default();
        let analysis = Analyzer::builder()
            .tariff(&tariff)
            .build()
            .analyze(vec![
                observation(8, 0, 100.0),
                observation(8, 15, 200.0),
                observation(8, 45, 150.0),
                observation(3, 0, 500.0),
            ])
            .unwrap();

        let ids = analysis.summaries.iter().map(|summary| summary.session_id).collect_vec();
        assert_eq!(ids, [0, 1, 2, 3]);

        let night = analysis.summaries[0].totals.unwrap();
        assert_eq!(night.start, at(3, 0));
        assert_abs_diff_eq!(night.energy.0, 0.0);
        assert_abs_diff_eq!(
            night.cost.0,
            0.5 * 0.5 * TariffSchedule::DEFAULT_OFF_PEAK_RATE.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_every_observation_lands_in_one_bucket() {
        let tariff = TariffSchedule::default();
        let observations = (0..120_i64)
            .filter(|minute| minute % 7 != 0)
            .map(|minute| {
                Observation::new(at(10, 0) + TimeDelta::minutes(minute * 3), Kilowatts::from(0.1))
            })
            .collect_vec();
        let analysis = Analyzer::builder()
            .tariff(&tariff)
            .build()
            .analyze(observations.clone())
            .unwrap();

        for session in &analysis.sessions {
            for (lhs, rhs) in session.buckets.iter().tuple_windows() {
                let offset = rhs.start() - lhs.start();
                assert!(offset > TimeDelta::zero());
                assert_eq!(offset.num_seconds() % TimeDelta::minutes(30).num_seconds(), 0);
            }
        }
        for observation in &observations {
            let n_buckets = analysis
                .sessions
                .iter()
                .flat_map(|session| &session.buckets)
                .filter(|bucket| {
                    (bucket.interval.start..bucket.interval.end).contains(&observation.timestamp)
                })
                .count();
            assert_eq!(n_buckets, 1);
        }
    }

    #[test]
    fn test_invalid_configuration() {
        let tariff = TariffSchedule::default();
        let analyzer = Analyzer::builder().bucket_width(TimeDelta::zero()).tariff(&tariff).build();
        assert!(analyzer.analyze(vec![observation(8, 0, 1.0)]).is_err());

        let analyzer =
            Analyzer::builder().idle_threshold(TimeDelta::minutes(-1)).tariff(&tariff).build();
        assert!(analyzer.analyze(vec![observation(8, 0, 1.0)]).is_err());
    }

    #[test]
    fn test_sub_millisecond_bucket_width_is_rejected() {
        let tariff = TariffSchedule::default();
        for bucket_width in [TimeDelta::microseconds(500), TimeDelta::microseconds(1500)] {
            let analyzer = Analyzer::builder().bucket_width(bucket_width).tariff(&tariff).build();
            let result = analyzer.analyze(vec![observation(8, 0, 1.0), observation(9, 0, 2.0)]);
            assert!(result.is_err(), "{bucket_width}");
        }
    }

    #[test]
    fn test_huge_bucket_width_is_rejected() {
        let tariff = TariffSchedule::default();
        let bucket_width = TimeDelta::days(100_000 * 365);
        let analyzer = Analyzer::builder().bucket_width(bucket_width).tariff(&tariff).build();
        assert!(analyzer.analyze(vec![observation(8, 0, 1.0)]).is_err());

        let analyzer =
            Analyzer::builder().bucket_width(Analyzer::MAX_BUCKET_WIDTH).tariff(&tariff).build();
        let analysis = analyzer.analyze(vec![observation(8, 0, 1.0)]).unwrap();
        assert_eq!(analysis.summaries.len(), 1);
    }

    #[test]
    fn test_failing_session_is_skipped() {
        let tariff = TariffSchedule::default();
        let last_minute = NaiveDateTime::MAX - TimeDelta::minutes(1);
        let analysis = Analyzer::builder()
            .tariff(&tariff)
            .build()
            .analyze(vec![
                observation(8, 0, 100.0),
                Observation::new(last_minute, Kilowatts::from_watts(50.0)),
                observation(8, 5, 300.0),
            ])
            .unwrap();

        assert_eq!(analysis.sessions.len(), 1);
        assert_eq!(analysis.sessions[0].id, 0);
        assert_eq!(analysis.summaries.len(), 1);
        assert_eq!(analysis.summaries[0].session_id, 0);
        let totals = analysis.summaries[0].totals.unwrap();
        assert_abs_diff_eq!(totals.mean_power.watts(), 200.0, epsilon = 1e-9);
    }
}
