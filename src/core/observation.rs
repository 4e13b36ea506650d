use chrono::NaiveDateTime;

use crate::quantity::power::Kilowatts;

/// Single power-draw sample, CPU and GPU combined.
#[derive(Copy, Clone, Debug, PartialEq, derive_more::Constructor)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub power: Kilowatts,
}
