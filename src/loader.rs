use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use itertools::Itertools;

use crate::{core::observation::Observation, prelude::*, quantity::power::Kilowatts};

/// Day-first formats go before ISO.
const DATE_FORMATS: [&str; 4] = ["%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Column names to read the samples from.
#[derive(Clone, Debug)]
pub struct Columns {
    pub date: String,
    pub time: String,

    /// Summed up into the total power.
    pub power: Vec<String>,
}

impl Columns {
    fn try_locate(&self, headers: &csv::ByteRecord) -> Option<ColumnIndices> {
        let names = headers
            .iter()
            .map(|header| String::from_utf8_lossy(header).trim().to_owned())
            .collect_vec();
        let position = |name: &str| names.iter().position(|header| header == name.trim());
        Some(ColumnIndices {
            date: position(&self.date)?,
            time: position(&self.time)?,
            power: self.power.iter().map(|name| position(name)).collect::<Option<_>>()?,
        })
    }
}

struct ColumnIndices {
    date: usize,
    time: usize,
    power: Vec<usize>,
}

impl ColumnIndices {
    fn parse(&self, record: &csv::ByteRecord) -> Option<Observation> {
        let field = |index: usize| record.get(index).and_then(|field| std::str::from_utf8(field).ok());
        let timestamp = parse_timestamp(field(self.date)?, field(self.time)?)?;
        let watts = self
            .power
            .iter()
            .map(|index| field(*index)?.trim().parse::<f64>().ok())
            .sum::<Option<f64>>()?;
        (watts.is_finite() && watts >= 0.0)
            .then(|| Observation::new(timestamp, Kilowatts::from_watts(watts)))
    }
}

fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let (date, time) = (date.trim(), time.trim());
    let date = DATE_FORMATS.iter().find_map(|format| NaiveDate::parse_from_str(date, format).ok())?;
    let time = TIME_FORMATS.iter().find_map(|format| NaiveTime::parse_from_str(time, format).ok())?;
    Some(date.and_time(time))
}

/// List the CSV files to load: the path itself if it is a file, or the CSV files directly inside.
pub fn discover(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut paths = Vec::new();
    for entry in fs::read_dir(path).with_context(|| format!("failed to list `{}`", path.display()))?
    {
        let path = entry?.path();
        let is_csv = path.extension().is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load the observations from all the files, skipping the unreadable ones.
///
/// The result is not sorted.
#[instrument(skip_all, fields(n_files = paths.len()))]
pub fn load_all(paths: &[PathBuf], columns: &Columns) -> Vec<Observation> {
    let mut observations = Vec::new();
    for path in paths {
        match load_file(path, columns) {
            Ok(Some(loaded)) => {
                info!(path = %path.display(), n_observations = loaded.len(), "loaded");
                observations.extend(loaded);
            }
            Ok(None) => {
                warn!(path = %path.display(), "required columns are missing, skipping");
            }
            Err(error) => {
                error!(path = %path.display(), "failed to read, skipping: {error:#}");
            }
        }
    }
    observations
}

fn load_file(path: &Path, columns: &Columns) -> Result<Option<Vec<Observation>>> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    read(file, columns)
}

/// Read the observations, dropping the rows that do not parse.
///
/// Returns `None` when any of the columns is missing.
pub fn read(reader: impl Read, columns: &Columns) -> Result<Option<Vec<Observation>>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let Some(indices) = columns.try_locate(reader.byte_headers()?) else {
        return Ok(None);
    };

    let mut observations = Vec::new();
    let mut n_dropped = 0_usize;
    for record in reader.byte_records() {
        match indices.parse(&record?) {
            Some(observation) => observations.push(observation),
            None => n_dropped += 1,
        }
    }
    if n_dropped != 0 {
        debug!(n_dropped, "dropped malformed rows");
    }
    Ok(Some(observations))
}
