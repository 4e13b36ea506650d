mod cli;
mod core;
mod export;
mod loader;
mod prelude;
mod quantity;
mod tables;

use std::{
    fs::File,
    io::{self, BufWriter},
};

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command},
    export::write_series,
    prelude::*,
    tables::build_summary_table,
};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().with_writer(io::stderr).init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Report(args) => {
            let analysis = args.load_and_analyze()?;
            if !analysis.summaries.is_empty() {
                println!("{}", build_summary_table(&analysis.summaries));
            }
        }
        Command::Series(args) => {
            let analysis = args.analysis.load_and_analyze()?;
            if let Some(path) = &args.output {
                let file = File::create(path)
                    .with_context(|| format!("failed to create `{}`", path.display()))?;
                write_series(&analysis.sessions, BufWriter::new(file))?;
                info!(path = %path.display(), "written");
            } else {
                write_series(&analysis.sessions, io::stdout().lock())?;
            }
        }
    }

    info!("done!");
    Ok(())
}
