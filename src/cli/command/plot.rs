use anyhow::Result;
use chrono::Local;
use tracing::warn;

use crate::{
    cli::Options,
    plot::{self, Figure, FigureConfig},
};

use super::{load, make_plot_file_name, summarise};

const WIDTH: u32 = 1536;
const HEIGHT: u32 = 759;

pub async fn plot(options: &Options) -> Result<String> {
    let (date, snapshot) = load(options).await?;
    let summaries = summarise(&snapshot.dataset, options);

    let mut figure = Figure::new(FigureConfig {
        width: WIDTH,
        height: HEIGHT,
        date,
        threshold: options.min_count,
        window: options.window,
        growth_rate: options.growth_rate,
        caption: format!(
            "source: www.ecdc.europa.eu, accessed {}",
            Local::now().format("%Y-%m-%dT%H:%M")
        ),
    });
    for summary in &summaries {
        figure.add_country(summary);
    }
    if figure.is_empty() {
        warn!("no countries to plot");
    }

    let file_name = make_plot_file_name(options, date);
    figure.render(&file_name)?;

    if !options.no_show {
        plot::show(&file_name);
    }

    Ok(file_name.to_string_lossy().to_string())
}
