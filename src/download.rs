//! Downloads the ECDC daily workbook, falling back to the previous day's
//! file when today's cannot be retrieved.

use std::{
    fs,
    future::Future,
    path::{Path, PathBuf},
};

use chrono::{Days, NaiveDate};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dataset::{Dataset, LoadError};

pub const DEFAULT_BASE_URL: &str = "https://www.ecdc.europa.eu/sites/default/files/documents";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} not found")]
    NotFound { url: String },
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("no day before {0}")]
    NoPreviousDay(NaiveDate),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Which failures of the first attempt lead to requesting the previous day.
pub enum FallbackPolicy {
    #[default]
    AnyError,
    NotFoundOnly,
}

impl FallbackPolicy {
    fn applies_to(&self, err: &FetchError) -> bool {
        match self {
            FallbackPolicy::AnyError => true,
            FallbackPolicy::NotFoundOnly => err.is_not_found(),
        }
    }
}

#[derive(Debug)]
/// A parsed workbook and where its download was saved.
pub struct Snapshot {
    pub dataset: Dataset,
    pub path: PathBuf,
}

pub fn file_name(date: NaiveDate) -> String {
    format!(
        "COVID-19-geographic-disbtribution-worldwide-{}.xlsx",
        date.format("%Y-%m-%d")
    )
}

pub fn source_url(base_url: &str, date: NaiveDate) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), file_name(date))
}

/// Runs `fetch` for `date` and, if the policy allows, once more for the day
/// before. Returns the date that was actually retrieved.
pub async fn fetch_with_fallback<T, F, Fut>(
    date: NaiveDate,
    policy: FallbackPolicy,
    mut fetch: F,
) -> Result<(NaiveDate, T), FetchError>
where
    F: FnMut(NaiveDate) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    match fetch(date).await {
        Ok(value) => Ok((date, value)),
        Err(err) if policy.applies_to(&err) => {
            let previous = date
                .checked_sub_days(Days::new(1))
                .ok_or(FetchError::NoPreviousDay(date))?;
            warn!("{} unavailable ({}), trying {}", date, err, previous);

            let value = fetch(previous).await?;
            Ok((previous, value))
        }
        Err(err) => Err(err),
    }
}

/// Downloads the workbook for `date` into `dir` and parses it.
pub async fn retrieve(
    client: &Client,
    base_url: &str,
    date: NaiveDate,
    dir: &Path,
    progress_bar: &ProgressBar,
) -> Result<Snapshot, FetchError> {
    let url = source_url(base_url, date);
    let path = dir.join(file_name(date));

    progress_bar.set_message(format!("Downloading {}", file_name(date)));
    let bytes = download_with_progress(client, &url, &path, progress_bar).await?;
    info!("saved {} bytes to {}", bytes.len(), path.display());

    let dataset = Dataset::from_xlsx(bytes)?;
    info!("parsed {} records", dataset.len());

    Ok(Snapshot { dataset, path })
}

/// Streams `url` to `file_path`, converting the spinner to a byte bar when the
/// content length is known. Returns the downloaded body.
pub async fn download_with_progress(
    client: &Client,
    url: &str,
    file_path: &Path,
    progress_bar: &ProgressBar,
) -> Result<Vec<u8>, FetchError> {
    debug!("GET {}", url);
    let response = client.get(url).send().await?;

    match response.status() {
        status if status.is_success() => {}
        StatusCode::NOT_FOUND => return Err(FetchError::NotFound { url: url.to_string() }),
        status => {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            })
        }
    }

    let total_size = response.content_length().unwrap_or(0);
    if total_size > 0 {
        progress_bar.set_length(total_size);
        progress_bar.set_position(0);
        if let Ok(style) =
            ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}")
        {
            progress_bar.set_style(style.progress_chars("=> "));
        }
    }

    let mut body = Vec::with_capacity(total_size as usize);
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        body.extend_from_slice(&chunk);
        progress_bar.set_position(body.len() as u64);
    }

    fs::write(file_path, &body)?;

    Ok(body)
}

// -- Tests -------------------------------------------------------------------
