use std::fmt::{self, Display};
use std::path::PathBuf;
use std::str::FromStr;

use crate::db::elia::dataset::EliaDataset;
use crate::error::FeedError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Commodity {
    Wind,
    Solar,
}

/// Where the data for one commodity comes from and where it goes.
#[derive(Debug, Clone, PartialEq)]
pub struct CommodityConfig {
    pub commodity: Commodity,
    pub realtime_dataset: EliaDataset,
    pub history_dataset: EliaDataset,
    /// Sub directory for the json files, also the prefix of the model
    /// forecast file.
    pub namespace: &'static str,
}

static COMMODITIES: [CommodityConfig; 2] = [
    CommodityConfig {
        commodity: Commodity::Wind,
        realtime_dataset: EliaDataset::WindRealtime,
        history_dataset: EliaDataset::WindHistory,
        namespace: "wind",
    },
    CommodityConfig {
        commodity: Commodity::Solar,
        realtime_dataset: EliaDataset::SolarRealtime,
        history_dataset: EliaDataset::SolarHistory,
        namespace: "solar",
    },
];

impl Commodity {
    /// In the order they get updated.
    pub fn all() -> [Commodity; 2] {
        [Commodity::Wind, Commodity::Solar]
    }

    pub fn config(&self) -> &'static CommodityConfig {
        match self {
            Commodity::Wind => &COMMODITIES[0],
            Commodity::Solar => &COMMODITIES[1],
        }
    }
}

impl Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config().namespace)
    }
}

impl FromStr for Commodity {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wind" => Ok(Commodity::Wind),
            "solar" => Ok(Commodity::Solar),
            _ => Err(FeedError::Config(format!("Failed to parse {s} as Commodity"))),
        }
    }
}

/// The three json files kept for a commodity.
#[derive(Debug, Clone)]
pub struct RenewablesArchive {
    pub base_dir: PathBuf,
    pub commodity: Commodity,
}

impl RenewablesArchive {
    fn dir(&self) -> PathBuf {
        self.base_dir.join(self.commodity.config().namespace)
    }

    /// Model forecast, next day quantiles.
    pub fn forecast_file(&self) -> PathBuf {
        self.dir().join("forecast.json")
    }

    /// Elia day-ahead forecast.
    pub fn benchmark_file(&self) -> PathBuf {
        self.dir().join("benchmark.json")
    }

    /// Measured generation.
    pub fn actual_file(&self) -> PathBuf {
        self.dir().join("actual.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_table() {
        let wind = Commodity::Wind.config();
        assert_eq!(wind.realtime_dataset, EliaDataset::WindRealtime);
        assert_eq!(wind.history_dataset, EliaDataset::WindHistory);
        let solar = Commodity::Solar.config();
        assert_eq!(solar.namespace, "solar");
        assert_eq!(solar.history_dataset, EliaDataset::SolarHistory);
    }

    #[test]
    fn parse_commodity() {
        assert_eq!("Wind".parse::<Commodity>().unwrap(), Commodity::Wind);
        assert!("hydro".parse::<Commodity>().is_err());
        assert_eq!(Commodity::Solar.to_string(), "solar");
    }

    #[test]
    fn file_paths() {
        let archive = RenewablesArchive {
            base_dir: PathBuf::from("./data"),
            commodity: Commodity::Wind,
        };
        assert_eq!(archive.forecast_file(), PathBuf::from("./data/wind/forecast.json"));
        assert_eq!(archive.benchmark_file(), PathBuf::from("./data/wind/benchmark.json"));
        assert_eq!(archive.actual_file(), PathBuf::from("./data/wind/actual.json"));
    }
}
