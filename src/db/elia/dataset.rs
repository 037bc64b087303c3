// Elia open data datasets for wind and solar generation.
// https://opendata.elia.be/explore/?refine.theme=Generation

use std::fmt::{self, Display};

use jiff::civil::Date;

pub const BASE_URL: &str = "https://opendata.elia.be/api/explore/v2.1/catalog/datasets";

/// Numeric columns every wind/solar dataset provides besides the measurement.
const FORECAST_COLUMNS: [&str; 5] = [
    "dayahead11hforecast",
    "dayahead11hconfidence10",
    "dayahead11hconfidence90",
    "monitoredcapacity",
    "loadfactor",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EliaDataset {
    WindRealtime,
    SolarRealtime,
    WindHistory,
    SolarHistory,
}

/// How to query one dataset.
#[derive(Debug)]
pub struct DatasetSpec {
    pub id: &'static str,
    pub refine_field: &'static str,
    pub refine_value: &'static str,
    /// Name of the measured value column, `realtime` or `measured`.
    pub value_column: &'static str,
    /// Non numeric columns requested from the API and ignored.
    pub extra_columns: &'static [&'static str],
}

static WIND_REALTIME: DatasetSpec = DatasetSpec {
    id: "ods086",
    refine_field: "offshoreonshore",
    refine_value: "Offshore",
    value_column: "realtime",
    extra_columns: &["decrementalbidid"],
};

static SOLAR_REALTIME: DatasetSpec = DatasetSpec {
    id: "ods087",
    refine_field: "region",
    refine_value: "Belgium",
    value_column: "realtime",
    extra_columns: &[],
};

static WIND_HISTORY: DatasetSpec = DatasetSpec {
    id: "ods031",
    refine_field: "offshoreonshore",
    refine_value: "Offshore",
    value_column: "measured",
    extra_columns: &["decrementalbidid"],
};

static SOLAR_HISTORY: DatasetSpec = DatasetSpec {
    id: "ods032",
    refine_field: "region",
    refine_value: "Belgium",
    value_column: "measured",
    extra_columns: &[],
};

impl EliaDataset {
    pub fn spec(&self) -> &'static DatasetSpec {
        match self {
            EliaDataset::WindRealtime => &WIND_REALTIME,
            EliaDataset::SolarRealtime => &SOLAR_REALTIME,
            EliaDataset::WindHistory => &WIND_HISTORY,
            EliaDataset::SolarHistory => &SOLAR_HISTORY,
        }
    }

    /// The measurement column plus the day-ahead forecast columns.
    pub fn numeric_columns(&self) -> Vec<&'static str> {
        let mut columns = vec![self.spec().value_column];
        columns.extend(FORECAST_COLUMNS);
        columns
    }

    fn select(&self) -> String {
        let mut columns = vec!["datetime"];
        columns.extend(self.numeric_columns());
        columns.extend(self.spec().extra_columns);
        columns.join(",")
    }

    fn refine(&self) -> String {
        let spec = self.spec();
        format!("{}%3A%22{}%22", spec.refine_field, spec.refine_value)
    }

    /// Latest snapshot of the dataset, all rows as one JSON array.
    pub fn realtime_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/exports/json?limit=-1&timezone=UTC&refine={}&select={}",
            base_url,
            self.spec().id,
            self.refine(),
            self.select()
        )
    }

    /// Records for one calendar day, wrapped in a `results` array.
    pub fn history_url(&self, base_url: &str, day: Date) -> String {
        format!(
            "{}/{}/records?refine={}&limit=-1&refine=datetime%3A%22{}%22&select={}",
            base_url,
            self.spec().id,
            self.refine(),
            day.strftime("%Y%%2F%m%%2F%d"),
            self.select()
        )
    }
}

impl Display for EliaDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spec().id)
    }
}
