use chrono::{NaiveDateTime, TimeDelta};

use crate::{
    core::{interval::Interval, observation::Observation, series::ResampleMean},
    prelude::*,
    quantity::power::Kilowatts,
};

/// Contiguous run of observations without an idle gap inside.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: usize,

    /// Sorted by timestamp.
    pub observations: Vec<Observation>,
}

impl Session {
    pub fn new(id: usize, first: Observation) -> Self {
        Self { id, observations: vec![first] }
    }

    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    /// First observation timestamp, the grid anchor for resampling.
    #[must_use]
    pub fn anchor(&self) -> Option<NaiveDateTime> {
        self.observations.first().map(|observation| observation.timestamp)
    }

    /// Check whether the gap between the last observation and `timestamp` exceeds the threshold.
    #[must_use]
    pub fn is_idle_before(&self, timestamp: NaiveDateTime, idle_threshold: TimeDelta) -> bool {
        self.observations
            .last()
            .is_some_and(|observation| (timestamp - observation.timestamp) > idle_threshold)
    }

    pub fn resample(&self, bucket_width: TimeDelta) -> Result<ResampledSession> {
        let Some(anchor) = self.anchor() else {
            return Ok(ResampledSession { id: self.id, buckets: Vec::new() });
        };
        let buckets = self
            .observations
            .iter()
            .copied()
            .resample_mean(anchor, bucket_width)?
            .into_iter()
            .map(|(interval, mean_power)| Bucket { session_id: self.id, interval, mean_power })
            .collect();
        Ok(ResampledSession { id: self.id, buckets })
    }
}

/// Fixed-width window inside a session.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bucket {
    pub session_id: usize,
    pub interval: Interval,
    pub mean_power: Kilowatts,
}

impl Bucket {
    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.interval.start
    }
}

#[derive(Clone, Debug)]
pub struct ResampledSession {
    pub id: usize,

    /// Strictly increasing in start time, empty windows omitted.
    pub buckets: Vec<Bucket>,
}
