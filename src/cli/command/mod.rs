pub mod export;
pub mod plot;
pub mod summary;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use tracing::warn;

pub use export::export;
pub use plot::plot;
pub use summary::summary;

use crate::{
    cli::{create_spinner, Options},
    dataset::Dataset,
    download::{self, Snapshot},
    series::{CountrySeries, CountrySummary},
};

const PREVIEW_ROWS: usize = 5;

/// Downloads today's workbook (or yesterday's) and prints the report header.
pub async fn load(options: &Options) -> Result<(NaiveDate, Snapshot)> {
    std::fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("cannot create {}", options.output_dir.display()))?;

    let client = Client::new();
    let client = &client;
    let base_url = options.base_url.as_str();
    let dir = options.output_dir.as_path();
    let bar = create_spinner("Downloading ECDC data...".to_string());
    let bar_ref = &bar;

    let result = download::fetch_with_fallback(options.date_or_today(), options.fallback_policy(), move |date| {
        download::retrieve(client, base_url, date, dir, bar_ref)
    })
    .await;
    bar.finish_and_clear();

    let (date, snapshot) = result.context("cannot retrieve ECDC data")?;
    if snapshot.dataset.is_empty() {
        warn!("{} has no records", snapshot.path.display());
    }

    println!("Latest data as reported on {}", date.format("%d-%m-%Y"));
    println!("{}", snapshot.dataset.preview(PREVIEW_ROWS));

    Ok((date, snapshot))
}

/// Computes and prints the summary of every requested country.
pub fn summarise(dataset: &Dataset, options: &Options) -> Vec<CountrySummary> {
    country_codes(options)
        .iter()
        .map(|geo_id| {
            let series = CountrySeries::from_dataset(dataset, geo_id);
            if series.is_empty() {
                warn!("no records for {}", geo_id);
            }
            let summary = CountrySummary::new(&series, options.min_count);
            println!("{} death rate: {}", summary.geo_id, summary.death_rate_label(3));

            summary
        })
        .collect()
}

fn country_codes(options: &Options) -> Vec<String> {
    options
        .countries
        .iter()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect()
}

pub fn make_plot_file_name(options: &Options, date: NaiveDate) -> PathBuf {
    options
        .output_dir
        .join(format!("{}_plot.png", date.format("%Y%m%d")))
}

// -- Tests -------------------------------------------------------------------
