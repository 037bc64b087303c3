use jiff::{tz::TimeZone, ToSpan, Zoned};

use crate::error::FeedError;

/// A calendar day in a given timezone, represented by its zoned midnight.
#[derive(Clone, Debug, PartialEq)]
pub struct DateTz(Zoned);

impl PartialOrd for DateTz {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl DateTz {
    pub fn containing(zoned: &Zoned) -> Result<Self, FeedError> {
        let midnight = zoned
            .start_of_day()
            .map_err(|e| FeedError::Config(format!("no midnight for {zoned}: {e}")))?;
        Ok(DateTz(midnight))
    }

    pub fn next(&self) -> DateTz {
        DateTz(self.0.saturating_add(1.day()))
    }

    pub fn previous(&self) -> DateTz {
        DateTz(self.0.saturating_sub(1.day()))
    }

    pub fn start(&self) -> Zoned {
        self.0.clone()
    }

    pub fn end(&self) -> Zoned {
        self.0.saturating_add(1.day())
    }
}

/// Look up a timezone in the tz database.  An unknown name is a fatal
/// configuration error.
pub fn time_zone(name: &str) -> Result<TimeZone, FeedError> {
    TimeZone::get(name).map_err(|e| FeedError::Config(format!("invalid timezone {name}: {e}")))
}
