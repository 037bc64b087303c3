use std::env;
use std::path::{Path, PathBuf};

use log::info;

use crate::db::elia::dataset::BASE_URL;
use crate::db::hf::forecast_file::HF_BASE_URL;
use crate::error::FeedError;
use crate::interval::date_tz::time_zone;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HF_REPO_ID: &str = "rexsovietskiy/wind-forecast";
pub const DEFAULT_TZ: &str = "CET";

/// Settings read from the environment, see `.env/{env}.env`.
///
/// | variable       | default                       |
/// |----------------|-------------------------------|
/// | `DATA_DIR`     | `./data`                      |
/// | `HF_TOKEN`     | none                          |
/// | `HF_REPO_ID`   | `rexsovietskiy/wind-forecast` |
/// | `FORECAST_TZ`  | `CET`                         |
/// | `ELIA_URL`     | the Elia open data endpoint   |
/// | `HF_URL`       | the Hugging Face datasets url |
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub hf_token: Option<String>,
    pub hf_repo_id: String,
    pub forecast_tz: String,
    pub elia_base_url: String,
    pub hf_base_url: String,
}

impl Config {
    /// Load `.env/{env_name}.env` into the process environment if it exists,
    /// then read the settings.
    pub fn load(env_name: &str) -> Result<Config, FeedError> {
        let path = format!(".env/{env_name}.env");
        match dotenvy::from_path(Path::new(&path)) {
            Ok(_) => info!("Loaded environment from {}", path),
            Err(e) if e.not_found() => info!("No {} file, using the process environment", path),
            Err(e) => return Err(FeedError::Config(format!("failed to read {path}: {e}"))),
        }
        Config::from_vars(|key| env::var(key).ok())
    }

    /// Build the settings from a variable lookup.  Fails if the timezone is
    /// unknown.
    pub fn from_vars<F>(var: F) -> Result<Config, FeedError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let config = Config {
            data_dir: PathBuf::from(non_empty("DATA_DIR").unwrap_or(DEFAULT_DATA_DIR.to_string())),
            hf_token: non_empty("HF_TOKEN"),
            hf_repo_id: non_empty("HF_REPO_ID").unwrap_or(DEFAULT_HF_REPO_ID.to_string()),
            forecast_tz: non_empty("FORECAST_TZ").unwrap_or(DEFAULT_TZ.to_string()),
            elia_base_url: non_empty("ELIA_URL").unwrap_or(BASE_URL.to_string()),
            hf_base_url: non_empty("HF_URL").unwrap_or(HF_BASE_URL.to_string()),
        };
        time_zone(&config.forecast_tz)?;
        Ok(config)
    }
}
