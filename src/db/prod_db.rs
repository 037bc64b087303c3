use crate::config::Config;
use crate::error::FeedError;

use super::{
    elia::client::EliaClient,
    hf::forecast_file::HfForecastArchive,
    renewables::commodity::{Commodity, RenewablesArchive},
};

/// Wire the production archives and clients from the configuration.
pub struct ProdDb {}

impl ProdDb {
    pub fn renewables(config: &Config, commodity: Commodity) -> RenewablesArchive {
        RenewablesArchive {
            base_dir: config.data_dir.clone(),
            commodity,
        }
    }

    pub fn hf_forecasts(config: &Config) -> HfForecastArchive {
        HfForecastArchive {
            base_url: config.hf_base_url.clone(),
            repo_id: config.hf_repo_id.clone(),
            token: config.hf_token.clone(),
            cache_dir: config.data_dir.join("cache"),
        }
    }

    pub fn elia(config: &Config) -> Result<EliaClient, FeedError> {
        EliaClient::with_base_url(&config.elia_base_url)
    }
}
