use bon::Builder;
use chrono::{NaiveDateTime, NaiveTime};

use crate::quantity::rate::KilowattHourRate;

/// Two-band time-of-day tariff.
#[derive(Copy, Clone, Debug, Builder)]
#[must_use]
pub struct TariffSchedule {
    #[builder(default = TariffSchedule::DEFAULT_PEAK_RATE)]
    pub peak_rate: KilowattHourRate,

    #[builder(default = TariffSchedule::DEFAULT_OFF_PEAK_RATE)]
    pub off_peak_rate: KilowattHourRate,

    /// Inclusive.
    #[builder(default = TariffSchedule::DEFAULT_OFF_PEAK_START)]
    pub off_peak_start: NaiveTime,

    /// Exclusive.
    #[builder(default = TariffSchedule::DEFAULT_OFF_PEAK_END)]
    pub off_peak_end: NaiveTime,
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TariffSchedule {
    pub const DEFAULT_PEAK_RATE: KilowattHourRate = KilowattHourRate::new(0.2146);
    pub const DEFAULT_OFF_PEAK_RATE: KilowattHourRate = KilowattHourRate::new(0.1696);
    pub const DEFAULT_OFF_PEAK_START: NaiveTime = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
    pub const DEFAULT_OFF_PEAK_END: NaiveTime = NaiveTime::from_hms_opt(7, 30, 0).unwrap();

    /// The off-peak band may wrap past midnight. Equal edges mean there is no off-peak band.
    #[must_use]
    pub fn is_off_peak(&self, time: NaiveTime) -> bool {
        if self.off_peak_start <= self.off_peak_end {
            (self.off_peak_start <= time) && (time < self.off_peak_end)
        } else {
            (self.off_peak_start <= time) || (time < self.off_peak_end)
        }
    }

    pub fn rate_at(&self, timestamp: NaiveDateTime) -> KilowattHourRate {
        if self.is_off_peak(timestamp.time()) { self.off_peak_rate } else { self.peak_rate }
    }
}
