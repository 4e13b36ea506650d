use chrono::{NaiveDateTime, TimeDelta};
use itertools::Itertools;

use crate::{
    core::{session::ResampledSession, tariff::TariffSchedule},
    prelude::*,
    quantity::{cost::Cost, energy::KilowattHours, power::Kilowatts},
};

/// Per-session energy and cost.
#[derive(Copy, Clone, Debug)]
pub struct SessionSummary {
    pub session_id: usize,
    pub n_buckets: usize,

    /// `None` when the session produced no buckets.
    pub totals: Option<SessionTotals>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SessionTotals {
    /// First bucket start.
    pub start: NaiveDateTime,

    /// Last bucket start, not the end of the last window.
    pub end: NaiveDateTime,

    /// Unweighted mean over the buckets.
    pub mean_power: Kilowatts,

    /// Mean power over the span between the first and the last bucket starts.
    pub energy: KilowattHours,

    /// Every bucket is billed for its full width at the rate of its start time,
    /// so the implied energy differs from [`SessionTotals::energy`].
    pub cost: Cost,
}

impl SessionTotals {
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        self.duration().as_seconds_f64() / 3600.0
    }
}

impl SessionSummary {
    #[instrument(skip_all, fields(session_id = session.id))]
    pub fn try_calculate(
        session: &ResampledSession,
        tariff: &TariffSchedule,
        bucket_width: TimeDelta,
    ) -> Result<Self> {
        ensure!(bucket_width > TimeDelta::zero(), "bucket width must be positive, got {bucket_width}");
        for bucket in &session.buckets {
            ensure!(
                bucket.session_id == session.id,
                "bucket at {} belongs to session #{}",
                bucket.start(),
                bucket.session_id,
            );
        }
        for (lhs, rhs) in session.buckets.iter().tuple_windows() {
            ensure!(
                lhs.start() < rhs.start(),
                "bucket starts are not increasing: {} then {}",
                lhs.start(),
                rhs.start(),
            );
        }

        let n_buckets = session.buckets.len();
        let (Some(first), Some(last)) = (session.buckets.first(), session.buckets.last()) else {
            warn!("no buckets, leaving the summary empty");
            return Ok(Self { session_id: session.id, n_buckets, totals: None });
        };

        let duration = last.start() - first.start();
        ensure!(duration >= TimeDelta::zero(), "negative session duration: {duration}");

        #[expect(clippy::cast_precision_loss)]
        let mean_power = session.buckets.iter().map(|bucket| bucket.mean_power).sum::<Kilowatts>()
            / n_buckets as f64;
        let energy = mean_power * duration;
        let cost = session
            .buckets
            .iter()
            .map(|bucket| bucket.mean_power * bucket_width * tariff.rate_at(bucket.start()))
            .sum::<Cost>();

        let totals =
            SessionTotals { start: first.start(), end: last.start(), mean_power, energy, cost };
        debug!(n_buckets, ?totals, "calculated");
        Ok(Self { session_id: session.id, n_buckets, totals: Some(totals) })
    }
}
