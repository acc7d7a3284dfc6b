use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::{cli::Options, parquet};

use super::{load, summarise};

pub async fn export(options: &Options, file: &Path) -> Result<String> {
    let (_, snapshot) = load(options).await?;
    let summaries = summarise(&snapshot.dataset, options);

    let rows = parquet::save_trajectories(&summaries, file)
        .with_context(|| format!("cannot write {}", file.display()))?;
    info!("wrote {} rows", rows);

    Ok(file.to_string_lossy().to_string())
}
