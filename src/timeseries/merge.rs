use std::collections::BTreeMap;

use jiff::Timestamp;

use crate::interval::window::UtcWindow;
use crate::timeseries::series::{Series, TimestampedRecord};

/// Merge freshly fetched data into a persisted series.
///
/// When a timestamp exists in both inputs the `incoming` record replaces the
/// `existing` one entirely.  Columns are the outer union of both inputs, a
/// record missing a column gets a null for it.  The result is sorted and has
/// unique timestamps.
pub fn merge(existing: Series, incoming: Series) -> Series {
    if incoming.is_empty() {
        return existing;
    }
    if existing.is_empty() {
        return incoming;
    }

    let (mut columns, existing) = existing.into_parts();
    let (incoming_columns, incoming) = incoming.into_parts();
    for column in incoming_columns {
        if !columns.contains(&column) {
            columns.push(column);
        }
    }

    let mut by_timestamp: BTreeMap<Timestamp, TimestampedRecord> = BTreeMap::new();
    for record in existing.into_iter().chain(incoming) {
        by_timestamp.insert(record.timestamp, record);
    }
    Series::from_unique(columns, by_timestamp.into_values())
}

/// Keep the records with `start <= t < end`.
pub fn filter_to_window(series: Series, start: Timestamp, end: Timestamp) -> Series {
    series.retain(|r| r.timestamp >= start && r.timestamp < end)
}

pub fn filter_to(series: Series, window: &UtcWindow) -> Series {
    filter_to_window(series, window.start, window.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn values(xs: &[(&str, f64)]) -> Series {
        let records = xs
            .iter()
            .map(|(t, v)| TimestampedRecord::new(ts(t)).with("value", Some(*v)))
            .collect();
        Series::from_records(vec!["value".to_string()], records)
    }

    #[test]
    fn incoming_wins_on_shared_timestamp() {
        let existing = values(&[("2024-01-01T00:00:00Z", 10.0)]);
        let incoming = values(&[("2024-01-01T00:00:00Z", 99.0), ("2024-01-01T01:00:00Z", 20.0)]);
        let res = merge(existing, incoming);
        assert_eq!(
            res,
            values(&[("2024-01-01T00:00:00Z", 99.0), ("2024-01-01T01:00:00Z", 20.0)])
        );
    }

    #[test]
    fn empty_existing() {
        let incoming = values(&[("2024-01-01T00:00:00Z", 1.5)]);
        let res = merge(Series::empty(&["value"]), incoming.clone());
        assert_eq!(res, incoming);
        assert_eq!(res.len(), 1);
    }

    #[test]
    fn empty_incoming_leaves_existing_alone() {
        let existing = values(&[("2024-01-01T00:00:00Z", 1.0), ("2024-01-02T00:00:00Z", 2.0)]);
        let res = merge(existing.clone(), Series::empty(&["value", "other"]));
        assert_eq!(res, existing);
    }

    #[test]
    fn whole_record_replaced_not_field_merged() {
        let existing = Series::from_records(
            vec!["a".into(), "b".into()],
            vec![TimestampedRecord::new(ts("2024-01-01T00:00:00Z"))
                .with("a", Some(1.0))
                .with("b", Some(2.0))],
        );
        let incoming = Series::from_records(
            vec!["a".into()],
            vec![TimestampedRecord::new(ts("2024-01-01T00:00:00Z")).with("a", Some(5.0))],
        );
        let res = merge(existing, incoming);
        let record = res.first().unwrap();
        assert_eq!(record.get("a"), Some(5.0));
        // b came from the old record only, so it is gone
        assert_eq!(record.fields.get("b"), Some(&None));
    }

    #[test]
    fn outer_union_of_columns() {
        let existing = values(&[("2024-01-01T00:00:00Z", 1.0)]);
        let incoming = Series::from_records(
            vec!["forecast".into()],
            vec![TimestampedRecord::new(ts("2024-01-01T01:00:00Z")).with("forecast", Some(7.0))],
        );
        let res = merge(existing, incoming);
        assert_eq!(res.columns(), &["value".to_string(), "forecast".to_string()]);
        assert_eq!(res.records()[0].fields.get("forecast"), Some(&None));
        assert_eq!(res.records()[1].fields.get("value"), Some(&None));
    }

    #[test]
    fn later_merge_wins() {
        let base = values(&[("2024-01-01T00:00:00Z", 1.0)]);
        let history = values(&[("2024-01-01T01:00:00Z", 2.0)]);
        let realtime = values(&[("2024-01-01T01:00:00Z", 3.0)]);
        let res = merge(merge(base, history), realtime);
        assert_eq!(res.get(ts("2024-01-01T01:00:00Z")).unwrap().get("value"), Some(3.0));
    }

    #[test]
    fn window_is_half_open() {
        let series = values(&[
            ("2024-01-01T23:00:00Z", 0.0),
            ("2024-01-02T00:00:00Z", 1.0),
            ("2024-01-02T12:00:00Z", 2.0),
            ("2024-01-03T00:00:00Z", 3.0),
        ]);
        let res = filter_to_window(series, ts("2024-01-02T00:00:00Z"), ts("2024-01-03T00:00:00Z"));
        assert_eq!(
            res.timestamps(),
            vec![ts("2024-01-02T00:00:00Z"), ts("2024-01-02T12:00:00Z")]
        );
    }

    #[test]
    fn filter_by_utc_window() {
        let window = UtcWindow::new(ts("2024-01-02T00:00:00Z"), ts("2024-01-03T00:00:00Z")).unwrap();
        let series = values(&[("2024-01-01T00:00:00Z", 0.0), ("2024-01-02T05:00:00Z", 1.0)]);
        let res = filter_to(series, &window);
        assert_eq!(res.len(), 1);
        assert_eq!(res.columns(), &["value".to_string()]);
    }
}
