//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use indicatif::ProgressBar;

use crate::download::{FallbackPolicy, DEFAULT_BASE_URL};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub options: Options,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the data, print death rates and plot the trajectories (default)
    Plot {},
    /// Download the data and print death rates only
    Summary {},
    /// Save the threshold-aligned series to a parquet file
    Export {
        /// Output file
        file: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct Options {
    /// Report date to request, YYYY-MM-DD [default: today]
    #[arg(long, global = true)]
    pub date: Option<NaiveDate>,

    /// Comma separated geoIds to compare
    #[arg(long, global = true, value_delimiter = ',', default_value = "DE,IT,KR,UK,ES,EG,US")]
    pub countries: Vec<String>,

    /// Cumulative case count that marks day zero
    #[arg(long, global = true, default_value_t = 100, value_parser = clap::value_parser!(i64).range(1..))]
    pub min_count: i64,

    /// Moving average window in days
    #[arg(long, global = true, default_value_t = 5, value_parser = parse_window)]
    pub window: usize,

    /// Daily growth rate of the exponential reference curve
    #[arg(long, global = true, default_value_t = 0.25)]
    pub growth_rate: f64,

    /// Directory for the downloaded workbook and the chart
    #[arg(long, global = true, default_value = ".")]
    pub output_dir: PathBuf,

    /// Location of the ECDC files
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Only fall back to the previous day when the file does not exist
    #[arg(long, global = true)]
    pub strict_fallback: bool,

    /// Do not open the chart after saving it
    #[arg(long, global = true)]
    pub no_show: bool,
}

impl Options {
    pub fn fallback_policy(&self) -> FallbackPolicy {
        if self.strict_fallback {
            FallbackPolicy::NotFoundOnly
        } else {
            FallbackPolicy::AnyError
        }
    }

    pub fn date_or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

fn parse_window(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("window must be at least 1".to_string()),
        Ok(w) => Ok(w),
        Err(e) => Err(e.to_string()),
    }
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

// -- Tests -------------------------------------------------------------------
