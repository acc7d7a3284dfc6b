use anyhow::Result;

use crate::cli::Options;

use super::{load, summarise};

/// Prints the per-country table and returns the path of the downloaded workbook.
pub async fn summary(options: &Options) -> Result<String> {
    let (_, snapshot) = load(options).await?;
    let summaries = summarise(&snapshot.dataset, options);

    println!();
    println!(
        "{:<6}  {:>10}  {:>8}  {:>10}  {:>6}",
        "geoId", "cases", "deaths", "day zero", "days"
    );
    for s in &summaries {
        let (start, days) = match &s.trajectory {
            Some(t) => (
                t.start_date()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                t.len(),
            ),
            None => ("-".to_string(), 0),
        };
        println!(
            "{:<6}  {:>10}  {:>8}  {:>10}  {:>6}",
            s.geo_id, s.total_cases, s.total_deaths, start, days
        );
    }

    Ok(snapshot.path.to_string_lossy().to_string())
}
