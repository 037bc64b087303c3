use std::collections::BTreeMap;
use std::slice::Iter;

use itertools::Itertools;
use jiff::Timestamp;

/// One observation: a UTC instant plus named, nullable measurements.
#[derive(Clone, Debug, PartialEq)]
pub struct TimestampedRecord {
    pub timestamp: Timestamp,
    pub fields: BTreeMap<String, Option<f64>>,
}

impl TimestampedRecord {
    pub fn new(timestamp: Timestamp) -> Self {
        TimestampedRecord {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: Option<f64>) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Value of a column, `None` if the column is missing or null.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied().flatten()
    }

    fn has_nulls(&self) -> bool {
        self.fields.values().any(|v| v.is_none())
    }
}

/// A time series sorted strictly ascending by timestamp.
///
/// Every record holds a value (possibly null) for each of the series
/// `columns`.  All constructors enforce this, keeping the last record when
/// the same timestamp shows up more than once.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Series {
    columns: Vec<String>,
    records: Vec<TimestampedRecord>,
}

impl Series {
    /// An empty series with a fixed schema.
    pub fn empty(columns: &[&str]) -> Series {
        Series {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records: Vec::new(),
        }
    }

    /// Build a series from records in any order.  Columns not listed in
    /// `columns` but present on some record are appended in name order.
    pub fn from_records(columns: Vec<String>, records: Vec<TimestampedRecord>) -> Series {
        let mut by_timestamp: BTreeMap<Timestamp, TimestampedRecord> = BTreeMap::new();
        for record in records {
            by_timestamp.insert(record.timestamp, record);
        }
        Series::from_unique(columns, by_timestamp.into_values())
    }

    /// `records` must already be sorted and unique by timestamp.
    pub(crate) fn from_unique<I>(mut columns: Vec<String>, records: I) -> Series
    where
        I: IntoIterator<Item = TimestampedRecord>,
    {
        let records: Vec<TimestampedRecord> = records.into_iter().collect();
        let extra: Vec<String> = records
            .iter()
            .flat_map(|r| r.fields.keys())
            .filter(|k| !columns.contains(k))
            .sorted()
            .dedup()
            .cloned()
            .collect();
        columns.extend(extra);

        let records = records
            .into_iter()
            .map(|mut r| {
                for column in &columns {
                    r.fields.entry(column.clone()).or_insert(None);
                }
                r
            })
            .collect();
        Series { columns, records }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[TimestampedRecord] {
        &self.records
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<TimestampedRecord>) {
        (self.columns, self.records)
    }

    pub fn iter(&self) -> Iter<'_, TimestampedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&TimestampedRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&TimestampedRecord> {
        self.records.last()
    }

    pub fn get(&self, timestamp: Timestamp) -> Option<&TimestampedRecord> {
        self.records
            .binary_search_by_key(&timestamp, |r| r.timestamp)
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn timestamps(&self) -> Vec<Timestamp> {
        self.records.iter().map(|r| r.timestamp).collect()
    }

    /// Rename columns, e.g. `[("q50", "forecast")]`.  Names not in the
    /// series are ignored.
    pub fn rename(self, mapping: &[(&str, &str)]) -> Series {
        let new_name = |name: &str| -> String {
            mapping
                .iter()
                .find(|(from, _)| *from == name)
                .map(|(_, to)| to.to_string())
                .unwrap_or_else(|| name.to_string())
        };
        let columns = self.columns.iter().map(|c| new_name(c.as_str())).collect();
        let records = self
            .records
            .into_iter()
            .map(|r| TimestampedRecord {
                timestamp: r.timestamp,
                fields: r.fields.into_iter().map(|(k, v)| (new_name(k.as_str()), v)).collect(),
            })
            .collect();
        Series { columns, records }
    }

    /// Project onto exactly `columns`, in that order.  A requested column the
    /// series doesn't have comes out as all nulls.
    pub fn select(self, columns: &[&str]) -> Series {
        let records = self
            .records
            .into_iter()
            .map(|mut r| TimestampedRecord {
                timestamp: r.timestamp,
                fields: columns
                    .iter()
                    .map(|c| (c.to_string(), r.fields.remove(*c).flatten()))
                    .collect(),
            })
            .collect();
        Series {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }

    /// Keep only the records without a null in any column.
    pub fn drop_nulls(self) -> Series {
        let records = self.records.into_iter().filter(|r| !r.has_nulls()).collect();
        Series {
            columns: self.columns,
            records,
        }
    }

    pub(crate) fn retain<F>(self, keep: F) -> Series
    where
        F: Fn(&TimestampedRecord) -> bool,
    {
        let records = self.records.into_iter().filter(|r| keep(r)).collect();
        Series {
            columns: self.columns,
            records,
        }
    }
}

impl FromIterator<TimestampedRecord> for Series {
    fn from_iter<I: IntoIterator<Item = TimestampedRecord>>(iter: I) -> Self {
        Series::from_records(Vec::new(), iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a TimestampedRecord;
    type IntoIter = Iter<'a, TimestampedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
