use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};
use derive_more::AddAssign;

use crate::{
    core::{interval::Interval, observation::Observation},
    prelude::*,
    quantity::power::Kilowatts,
};

impl<T> ResampleMean for T where T: ?Sized {}

pub trait ResampleMean {
    /// Average the observations over right-open windows `[anchor + k * width, anchor + (k + 1) * width)`.
    ///
    /// Windows without observations are skipped, the rest come out in time order.
    fn resample_mean(
        self,
        anchor: NaiveDateTime,
        width: TimeDelta,
    ) -> Result<Vec<(Interval, Kilowatts)>>
    where
        Self: Sized + Iterator<Item = Observation>,
    {
        let width_millis = width.num_milliseconds();
        ensure!(width_millis > 0, "bucket width must be positive, got {width}");
        ensure!(
            TimeDelta::milliseconds(width_millis) == width,
            "bucket width must be whole milliseconds, got {width}",
        );

        let mut accumulators: BTreeMap<i64, PowerAccumulator> = BTreeMap::new();
        for observation in self {
            let index = (observation.timestamp - anchor).num_milliseconds().div_euclid(width_millis);
            *accumulators.entry(index).or_default() += PowerAccumulator::from(observation.power);
        }

        accumulators
            .into_iter()
            .filter_map(|(index, accumulator)| Some((index, accumulator.average()?)))
            .map(|(index, mean)| {
                let interval = index
                    .checked_mul(width_millis)
                    .and_then(TimeDelta::try_milliseconds)
                    .and_then(|offset| anchor.checked_add_signed(offset))
                    .and_then(|start| Interval::with_duration(start, width))
                    .with_context(|| format!("window #{index} from {anchor} is out of range"))?;
                Ok((interval, mean))
            })
            .collect()
    }
}

#[derive(Copy, Clone, AddAssign)]
struct PowerAccumulator {
    n_samples: u32,
    total: Kilowatts,
}

impl Default for PowerAccumulator {
    fn default() -> Self {
        Self { n_samples: 0, total: Kilowatts::ZERO }
    }
}

impl From<Kilowatts> for PowerAccumulator {
    fn from(power: Kilowatts) -> Self {
        Self { n_samples: 1, total: power }
    }
}

impl PowerAccumulator {
    fn average(self) -> Option<Kilowatts> {
        if self.n_samples == 0 { None } else { Some(self.total / f64::from(self.n_samples)) }
    }
}
