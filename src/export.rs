use std::io::Write;

use serde::Serialize;

use crate::{core::session::ResampledSession, prelude::*};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Serialize)]
struct SeriesRow {
    session_id: usize,
    bucket_start: String,
    bucket_end: String,
    mean_power_watts: String,
}

/// Write the bucket series of all the sessions as CSV, one row per bucket.
pub fn write_series(sessions: &[ResampledSession], writer: impl Write) -> Result {
    let mut writer = csv::Writer::from_writer(writer);
    let mut n_rows = 0_usize;
    for bucket in sessions.iter().flat_map(|session| &session.buckets) {
        writer.serialize(SeriesRow {
            session_id: bucket.session_id,
            bucket_start: bucket.interval.start.format(TIMESTAMP_FORMAT).to_string(),
            bucket_end: bucket.interval.end.format(TIMESTAMP_FORMAT).to_string(),
            mean_power_watts: format!("{:.3}", bucket.mean_power.watts()),
        })?;
        n_rows += 1;
    }
    if n_rows == 0 {
        writer.write_record(["session_id", "bucket_start", "bucket_end", "mean_power_watts"])?;
    }
    writer.flush().context("failed to flush the series")?;
    debug!(n_rows, "exported the series");
    Ok(())
}
