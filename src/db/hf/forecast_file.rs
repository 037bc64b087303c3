// Quantile forecasts produced by the model, published as one parquet file per
// commodity in a Hugging Face dataset repository.  Columns are
// valid_time, q10, q50, q90.

use duckdb::Connection;
use jiff::Timestamp;
use log::info;
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::elia::client::TIMEOUT;
use crate::error::FeedError;
use crate::timeseries::series::{Series, TimestampedRecord};

pub const HF_BASE_URL: &str = "https://huggingface.co/datasets";
pub const FORECAST_COLUMNS: [&str; 3] = ["q10", "q50", "q90"];

/// Source of the model forecast for a commodity.
pub trait ForecastSource {
    /// All forecast rows in the file, keyed by `valid_time`.
    fn load_forecast(&self, namespace: &str) -> Result<Series, FeedError>;
}

pub struct HfForecastArchive {
    pub base_url: String,
    pub repo_id: String,
    pub token: Option<String>,
    /// Where downloaded files are kept.
    pub cache_dir: PathBuf,
}

impl HfForecastArchive {
    /// Name of the parquet file for the commodity, e.g. `wind-forecasts.parquet`
    pub fn filename(&self, namespace: &str) -> String {
        format!("{namespace}-forecasts.parquet")
    }

    pub fn url(&self, namespace: &str) -> String {
        format!(
            "{}/{}/resolve/main/{}",
            self.base_url.trim_end_matches('/'),
            self.repo_id,
            self.filename(namespace)
        )
    }

    /// Download the latest file into the cache directory, overwriting any
    /// previous copy.
    pub fn download_file(&self, namespace: &str) -> Result<PathBuf, FeedError> {
        let client = Client::builder().timeout(TIMEOUT).build()?;
        let mut builder = client.get(self.url(namespace));
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = builder.send()?.error_for_status()?;
        let bytes = response.bytes()?;

        let path = self.cache_dir.join(self.filename(namespace));
        fs::create_dir_all(&self.cache_dir)?;
        fs::write(&path, &bytes)?;
        info!("Downloaded {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Read the parquet file.  `valid_time` is taken to be in UTC.
    pub fn read_file(&self, path: &Path) -> Result<Series, FeedError> {
        let conn = Connection::open_in_memory()?;
        let query = format!(
            r"
            SELECT
                epoch_ms(valid_time::TIMESTAMP) AS valid_time,
                q10::DOUBLE,
                q50::DOUBLE,
                q90::DOUBLE
            FROM read_parquet('{}')
            ORDER BY valid_time;
            ",
            path.display().to_string().replace('\'', "''")
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<usize, i64>(0)?,
                row.get::<usize, Option<f64>>(1)?,
                row.get::<usize, Option<f64>>(2)?,
                row.get::<usize, Option<f64>>(3)?,
            ))
        })?;

        let mut records: Vec<TimestampedRecord> = Vec::new();
        for row in rows {
            let (millis, q10, q50, q90) = row?;
            records.push(
                TimestampedRecord::new(Timestamp::from_millisecond(millis)?)
                    .with("q10", q10)
                    .with("q50", q50)
                    .with("q90", q90),
            );
        }
        let columns = FORECAST_COLUMNS.iter().map(|c| c.to_string()).collect();
        Ok(Series::from_records(columns, records))
    }
}

impl ForecastSource for HfForecastArchive {
    fn load_forecast(&self, namespace: &str) -> Result<Series, FeedError> {
        let path = self.download_file(namespace)?;
        let series = self.read_file(&path)?;
        info!("Read {} forecast rows from {}", series.len(), path.display());
        Ok(series)
    }
}
