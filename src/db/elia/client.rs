use std::time::Duration;

use jiff::{tz::TimeZone, Timestamp, ToSpan};
use log::info;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::db::elia::dataset::{EliaDataset, BASE_URL};
use crate::error::FeedError;
use crate::timeseries::series::{Series, TimestampedRecord};

pub const TIMEOUT: Duration = Duration::from_secs(20);

/// Source of realtime and historical measurements.
pub trait MeasurementSource {
    /// Latest snapshot, with the measurement renamed to `value`.
    fn load_realtime_measurements(&self, dataset: EliaDataset) -> Result<Series, FeedError>;

    /// All the records for the UTC days touching `[start, end]`, with the
    /// measurement renamed to `value`.
    fn load_history_measurements(
        &self,
        dataset: EliaDataset,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Series, FeedError>;
}

pub struct EliaClient {
    client: Client,
    base_url: String,
}

impl EliaClient {
    pub fn new() -> Result<EliaClient, FeedError> {
        EliaClient::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<EliaClient, FeedError> {
        let client = Client::builder().timeout(TIMEOUT).build()?;
        Ok(EliaClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_json(&self, url: &str) -> Result<Value, FeedError> {
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.json::<Value>()?)
    }
}

impl MeasurementSource for EliaClient {
    fn load_realtime_measurements(&self, dataset: EliaDataset) -> Result<Series, FeedError> {
        let url = dataset.realtime_url(&self.base_url);
        info!("Loading realtime measurements for dataset {}", dataset);
        let body = self.get_json(&url)?;
        let rows = match body {
            Value::Array(rows) => rows,
            _ => return Err(FeedError::Schema(format!("expected a JSON array from {url}"))),
        };
        parse_rows(&rows, dataset)
    }

    fn load_history_measurements(
        &self,
        dataset: EliaDataset,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Series, FeedError> {
        let mut rows: Vec<Value> = Vec::new();
        for day in utc_days(start, end) {
            info!("Loading historical data for dataset {} on {}", dataset, day);
            let url = dataset.history_url(&self.base_url, day);
            let body = self.get_json(&url)?;
            match body.get("results") {
                Some(Value::Array(results)) => rows.extend(results.iter().cloned()),
                _ => {
                    return Err(FeedError::Schema(format!(
                        "no results array in response from {url}"
                    )))
                }
            }
        }
        parse_rows(&rows, dataset)
    }
}

/// The UTC calendar days from the day of `start` to the day of `end`,
/// inclusive.
pub fn utc_days(start: Timestamp, end: Timestamp) -> Vec<jiff::civil::Date> {
    let first = start.to_zoned(TimeZone::UTC).date();
    let last = end.to_zoned(TimeZone::UTC).date();
    first.series(1.day()).take_while(|d| *d <= last).collect()
}

/// Turn the JSON rows of an Elia dataset into a series.  The measurement
/// column (`realtime` or `measured`) is renamed to `value`.
pub fn parse_rows(rows: &[Value], dataset: EliaDataset) -> Result<Series, FeedError> {
    let columns = dataset.numeric_columns();
    let mut records: Vec<TimestampedRecord> = Vec::with_capacity(rows.len());
    for row in rows {
        let timestamp: Timestamp = match row.get("datetime") {
            Some(Value::String(s)) => s
                .parse()
                .map_err(|e| FeedError::Schema(format!("invalid datetime {s}: {e}")))?,
            _ => return Err(FeedError::Schema(format!("row without a datetime: {row}"))),
        };
        let mut record = TimestampedRecord::new(timestamp);
        for column in &columns {
            record = record.with(column, read_number(row.get(*column), column)?);
        }
        records.push(record);
    }
    let series = Series::from_records(columns.iter().map(|c| c.to_string()).collect(), records);
    Ok(series.rename(&[(dataset.spec().value_column, "value")]))
}

fn read_number(value: Option<&Value>, column: &str) -> Result<Option<f64>, FeedError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(x)) => Ok(x.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| FeedError::Schema(format!("{column} is not a number: {s}"))),
        Some(v) => Err(FeedError::Schema(format!("{column} is not a number: {v}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use serde_json::json;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn parse_realtime_rows() -> Result<(), FeedError> {
        let rows = json!([
            {"datetime": "2024-06-15T22:15:00+00:00", "realtime": 1200.5,
             "dayahead11hforecast": 1100.0, "dayahead11hconfidence10": 900.0,
             "dayahead11hconfidence90": 1300.0, "monitoredcapacity": 2261.8,
             "loadfactor": 53.1, "decrementalbidid": null},
            {"datetime": "2024-06-15T22:00:00+00:00", "realtime": null,
             "dayahead11hforecast": "1050.25", "dayahead11hconfidence10": 880.0,
             "dayahead11hconfidence90": 1250.0, "monitoredcapacity": 2261.8,
             "loadfactor": null, "decrementalbidid": "A-12"}
        ]);
        let series = parse_rows(rows.as_array().unwrap(), EliaDataset::WindRealtime)?;
        assert_eq!(series.len(), 2);
        assert!(series.columns().contains(&"value".to_string()));
        assert!(!series.columns().contains(&"realtime".to_string()));
        let first = series.first().unwrap();
        assert_eq!(first.timestamp, ts("2024-06-15T22:00:00Z"));
        assert_eq!(first.get("value"), None);
        assert_eq!(first.get("dayahead11hforecast"), Some(1050.25));
        assert!(!first.fields.contains_key("decrementalbidid"));
        assert_eq!(series.last().unwrap().get("value"), Some(1200.5));
        Ok(())
    }

    #[test]
    fn parse_history_rows_with_offset() -> Result<(), FeedError> {
        let rows = json!([
            {"datetime": "2024-06-15T00:00:00+02:00", "measured": 10.0}
        ]);
        let series = parse_rows(rows.as_array().unwrap(), EliaDataset::SolarHistory)?;
        let first = series.first().unwrap();
        assert_eq!(first.timestamp, ts("2024-06-14T22:00:00Z"));
        assert_eq!(first.get("value"), Some(10.0));
        assert_eq!(first.get("loadfactor"), None);
        Ok(())
    }

    #[test]
    fn bad_rows_are_schema_errors() {
        let no_datetime = json!([{"realtime": 1.0}]);
        let res = parse_rows(no_datetime.as_array().unwrap(), EliaDataset::SolarRealtime);
        assert!(matches!(res, Err(FeedError::Schema(_))));

        let not_a_number = json!([{"datetime": "2024-06-15T00:00:00+00:00", "realtime": [1]}]);
        let res = parse_rows(not_a_number.as_array().unwrap(), EliaDataset::SolarRealtime);
        assert!(matches!(res, Err(FeedError::Schema(_))));
    }

    #[test]
    fn days_spanned_by_window() {
        let days = utc_days(ts("2024-06-13T22:00:00Z"), ts("2024-06-14T22:00:00Z"));
        assert_eq!(days, vec![date(2024, 6, 13), date(2024, 6, 14)]);
        let days = utc_days(ts("2024-06-14T00:00:00Z"), ts("2024-06-14T05:00:00Z"));
        assert_eq!(days, vec![date(2024, 6, 14)]);
    }

    #[test]
    fn unreachable_host_is_fetch_error() -> Result<(), FeedError> {
        let client = EliaClient::with_base_url("http://127.0.0.1:9")?;
        let res = client.load_realtime_measurements(EliaDataset::WindRealtime);
        assert!(matches!(res, Err(FeedError::Fetch(_))));
        Ok(())
    }

    #[ignore]
    #[test]
    fn download_realtime() -> Result<(), FeedError> {
        let client = EliaClient::new()?;
        let series = client.load_realtime_measurements(EliaDataset::SolarRealtime)?;
        assert!(!series.is_empty());
        Ok(())
    }

    #[ignore]
    #[test]
    fn download_history() -> Result<(), FeedError> {
        let client = EliaClient::new()?;
        let start = ts("2024-06-13T22:00:00Z");
        let end = ts("2024-06-14T22:00:00Z");
        let series = client.load_history_measurements(EliaDataset::WindHistory, start, end)?;
        assert!(series.len() >= 96);
        Ok(())
    }
}
