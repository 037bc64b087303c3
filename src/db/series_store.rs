// Persistence for the forecast/benchmark/actual datasets.  Each file looks like
//
// {"metadata": {"last_update": "2024-06-15T10:00:00Z"},
//  "data": [{"datetime": "2024-06-15T22:00:00Z", "value": 1.5}, ...]}

use jiff::Timestamp;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::FeedError;
use crate::timeseries::series::{Series, TimestampedRecord};

pub const DATETIME_COLUMN: &str = "datetime";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<Timestamp>,
    /// Anything else found in the file, written back untouched.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesFile {
    pub metadata: Metadata,
    pub data: Series,
}

#[derive(Serialize, Deserialize)]
struct RawFile {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    data: Vec<Map<String, Value>>,
}

impl SeriesFile {
    /// Read a dataset file.  A file that doesn't exist yet or is empty is an
    /// empty series.
    pub fn load(path: &Path) -> Result<SeriesFile, FeedError> {
        let buffer = match fs::read_to_string(path) {
            Ok(buffer) => buffer,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No file {}, starting from an empty series", path.display());
                return Ok(SeriesFile::default());
            }
            Err(e) => {
                return Err(FeedError::Persistence(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        if buffer.trim().is_empty() {
            return Ok(SeriesFile::default());
        }
        SeriesFile::from_json(&buffer)
            .map_err(|e| FeedError::Persistence(format!("invalid file {}: {}", path.display(), e)))
    }

    /// Write the file, stamping `metadata.last_update` with the current time.
    pub fn save(&mut self, path: &Path) -> Result<(), FeedError> {
        self.metadata.last_update = Some(Timestamp::from_second(Timestamp::now().as_second())?);
        let json = self.to_json()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                FeedError::Persistence(format!("failed to create {}: {}", dir.display(), e))
            })?;
        }
        fs::write(path, json)
            .map_err(|e| FeedError::Persistence(format!("failed to write {}: {}", path.display(), e)))?;
        info!("{} records written to {}", self.data.len(), path.display());
        Ok(())
    }

    pub fn from_json(s: &str) -> Result<SeriesFile, FeedError> {
        let raw: RawFile = serde_json::from_str(s)?;
        let columns: Vec<String> = match raw.data.first() {
            Some(obj) => obj.keys().filter(|k| *k != DATETIME_COLUMN).cloned().collect(),
            None => Vec::new(),
        };
        let records = raw
            .data
            .iter()
            .map(read_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SeriesFile {
            metadata: raw.metadata,
            data: Series::from_records(columns, records),
        })
    }

    /// Pretty printed with a 2 space indent.
    pub fn to_json(&self) -> Result<String, FeedError> {
        let data = self.data.iter().map(|r| write_record(r, self.data.columns())).collect();
        let raw = RawFile {
            metadata: self.metadata.clone(),
            data,
        };
        Ok(serde_json::to_string_pretty(&raw)?)
    }
}

pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.strftime(DATETIME_FORMAT).to_string()
}

fn read_record(obj: &Map<String, Value>) -> Result<TimestampedRecord, FeedError> {
    let timestamp: Timestamp = match obj.get(DATETIME_COLUMN) {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|e| FeedError::Schema(format!("invalid datetime {s}: {e}")))?,
        _ => {
            return Err(FeedError::Schema(format!(
                "record without a datetime: {}",
                Value::Object(obj.clone())
            )))
        }
    };
    let mut record = TimestampedRecord::new(timestamp);
    for (k, v) in obj.iter().filter(|(k, _)| *k != DATETIME_COLUMN) {
        let value = match v {
            Value::Null => None,
            Value::Number(x) => x.as_f64(),
            _ => return Err(FeedError::Schema(format!("{k} is not a number: {v}"))),
        };
        record = record.with(k, value);
    }
    Ok(record)
}

fn write_record(record: &TimestampedRecord, columns: &[String]) -> Map<String, Value> {
    let mut obj = Map::new();
    obj.insert(
        DATETIME_COLUMN.to_string(),
        Value::String(format_timestamp(&record.timestamp)),
    );
    for column in columns {
        let value = record
            .get(column)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        obj.insert(column.clone(), value);
    }
    obj
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn missing_file_is_empty() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let file = SeriesFile::load(&dir.path().join("wind/actual.json"))?;
        assert!(file.data.is_empty());
        assert_eq!(file.metadata.last_update, None);
        Ok(())
    }

    #[test]
    fn empty_file_is_empty() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("actual.json");
        fs::write(&path, "")?;
        assert!(SeriesFile::load(&path)?.data.is_empty());
        Ok(())
    }

    #[test]
    fn malformed_file_is_persistence_error() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("actual.json");
        fs::write(&path, "{\"data\": [")?;
        assert!(matches!(SeriesFile::load(&path), Err(FeedError::Persistence(_))));
        Ok(())
    }

    #[test]
    fn read_file() -> Result<(), Box<dyn Error>> {
        let json = r#"{
  "metadata": {"last_update": "2024-06-15T10:00:00Z", "source": "elia"},
  "data": [
    {"datetime": "2024-06-15T22:15:00Z", "ci_lower": 1.0, "forecast": 2.0, "ci_upper": 3.0},
    {"datetime": "2024-06-15T22:00:00Z", "ci_lower": null, "forecast": 2.5, "ci_upper": 3.5}
  ]
}"#;
        let file = SeriesFile::from_json(json)?;
        assert_eq!(file.metadata.last_update, Some(ts("2024-06-15T10:00:00Z")));
        assert_eq!(file.metadata.other.get("source"), Some(&Value::from("elia")));
        assert_eq!(
            file.data.columns(),
            &["ci_lower".to_string(), "forecast".to_string(), "ci_upper".to_string()]
        );
        // sorted on load
        assert_eq!(file.data.first().unwrap().timestamp, ts("2024-06-15T22:00:00Z"));
        assert_eq!(file.data.first().unwrap().get("ci_lower"), None);
        Ok(())
    }

    #[test]
    fn save_stamps_last_update() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("solar/forecast.json");
        let mut file = SeriesFile::default();
        file.metadata.other.insert("note".into(), Value::from("keep me"));
        file.data = Series::from_records(
            vec!["value".into()],
            vec![TimestampedRecord::new(ts("2024-01-01T00:00:00Z")).with("value", Some(12.5))],
        );
        let before = Timestamp::now().as_second();
        file.save(&path)?;

        let text = fs::read_to_string(&path)?;
        assert!(text.contains("\"datetime\": \"2024-01-01T00:00:00Z\""));
        assert!(text.contains("\n  \"metadata\""));

        let loaded = SeriesFile::load(&path)?;
        let stamp = loaded.metadata.last_update.unwrap();
        assert!(stamp.as_second() >= before);
        assert_eq!(stamp.subsec_nanosecond(), 0);
        assert_eq!(loaded.metadata.other.get("note"), Some(&Value::from("keep me")));
        assert_eq!(loaded.data, file.data);
        Ok(())
    }

    #[test]
    fn nulls_are_written() -> Result<(), Box<dyn Error>> {
        let file = SeriesFile {
            metadata: Metadata::default(),
            data: Series::from_records(
                vec!["value".into(), "forecast".into()],
                vec![TimestampedRecord::new(ts("2024-01-01T00:00:00Z")).with("value", Some(1.0))],
            ),
        };
        let v: Value = serde_json::from_str(&file.to_json()?)?;
        assert_eq!(v["data"][0]["forecast"], Value::Null);
        assert_eq!(v["data"][0]["value"], Value::from(1.0));
        Ok(())
    }
}
