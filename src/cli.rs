use std::path::PathBuf;

use chrono::{NaiveTime, TimeDelta};
use clap::{Parser, Subcommand};

use crate::{
    core::{
        analyzer::{Analysis, Analyzer},
        tariff::TariffSchedule,
    },
    loader::{self, Columns},
    prelude::*,
    quantity::rate::KilowattHourRate,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the per-session energy and cost table.
    #[clap(name = "report")]
    Report(Box<AnalysisArgs>),

    /// Write the resampled per-session power series as CSV.
    #[clap(name = "series")]
    Series(Box<SeriesArgs>),
}

#[derive(Parser)]
pub struct SeriesArgs {
    /// Output file, standard output if omitted.
    #[clap(long, short, env = "SERIES_OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    #[clap(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Parser)]
pub struct AnalysisArgs {
    /// CSV file, or a directory to load all the CSV files from.
    #[clap(long, short, env = "INPUT_PATH", default_value = ".")]
    pub input: PathBuf,

    #[clap(flatten)]
    pub columns: ColumnArgs,

    #[clap(flatten)]
    pub sessions: SessionArgs,

    #[clap(flatten)]
    pub tariff: TariffArgs,
}

impl AnalysisArgs {
    pub fn load_and_analyze(&self) -> Result<Analysis> {
        let paths = loader::discover(&self.input)?;
        info!(n_files = paths.len(), input = %self.input.display(), "discovered");
        let observations = loader::load_all(&paths, &self.columns.to_columns());
        if observations.is_empty() {
            warn!("no valid records found");
        }
        let tariff = self.tariff.to_schedule();
        Analyzer::builder()
            .idle_threshold(self.sessions.idle_threshold()?)
            .bucket_width(self.sessions.bucket_width()?)
            .tariff(&tariff)
            .build()
            .analyze(observations)
    }
}

#[derive(Parser)]
pub struct ColumnArgs {
    #[clap(long = "date-column", env = "DATE_COLUMN", default_value = "Date")]
    pub date: String,

    #[clap(long = "time-column", env = "TIME_COLUMN", default_value = "Time")]
    pub time: String,

    /// Power columns in watts, summed up into the total power draw.
    #[clap(
        long = "power-column",
        env = "POWER_COLUMNS",
        value_delimiter = ';',
        num_args = 1..,
        default_values = ["Consommation d'énergie totale du CPU [W]", "GPU Consommation d'énergie [W]"],
    )]
    pub power: Vec<String>,
}

impl ColumnArgs {
    fn to_columns(&self) -> Columns {
        Columns { date: self.date.clone(), time: self.time.clone(), power: self.power.clone() }
    }
}

#[derive(Parser)]
pub struct SessionArgs {
    /// Gap between samples after which a new session starts.
    #[clap(long, env = "IDLE_THRESHOLD", default_value = "10m")]
    idle_threshold: humantime::Duration,

    /// Resampling bucket width.
    #[clap(long, env = "BUCKET_WIDTH", default_value = "30m")]
    bucket_width: humantime::Duration,
}

impl SessionArgs {
    fn idle_threshold(&self) -> Result<TimeDelta> {
        TimeDelta::from_std(self.idle_threshold.into()).context("idle threshold is out of range")
    }

    fn bucket_width(&self) -> Result<TimeDelta> {
        TimeDelta::from_std(self.bucket_width.into()).context("bucket width is out of range")
    }
}

#[derive(Copy, Clone, Parser)]
pub struct TariffArgs {
    /// Peak rate in euro per kilowatt-hour.
    #[clap(long = "peak-rate", env = "PEAK_RATE", default_value = "0.2146")]
    pub peak_rate: KilowattHourRate,

    /// Off-peak rate in euro per kilowatt-hour.
    #[clap(long = "off-peak-rate", env = "OFF_PEAK_RATE", default_value = "0.1696")]
    pub off_peak_rate: KilowattHourRate,

    /// Off-peak band start, inclusive.
    #[clap(long = "off-peak-start", env = "OFF_PEAK_START", default_value = "23:30:00")]
    pub off_peak_start: NaiveTime,

    /// Off-peak band end, exclusive.
    #[clap(long = "off-peak-end", env = "OFF_PEAK_END", default_value = "07:30:00")]
    pub off_peak_end: NaiveTime,
}

impl TariffArgs {
    fn to_schedule(self) -> TariffSchedule {
        TariffSchedule::builder()
            .peak_rate(self.peak_rate)
            .off_peak_rate(self.off_peak_rate)
            .off_peak_start(self.off_peak_start)
            .off_peak_end(self.off_peak_end)
            .build()
    }
}
