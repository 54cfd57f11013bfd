//! Inclusive calendar-date windows used for every report request.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire format for dates in query strings and reporting payloads.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq)]
pub enum DateRangeError {
    #[error("start date {since} is after end date {until}")]
    Inverted { since: NaiveDate, until: NaiveDate },

    #[error("invalid date '{input}', expected YYYY-MM-DD")]
    Parse { input: String },

    #[error("a date window must cover at least one day")]
    Empty,
}

/// An inclusive window of calendar days, `since..=until`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl DateRange {
    pub fn new(since: NaiveDate, until: NaiveDate) -> Result<Self, DateRangeError> {
        if since > until {
            return Err(DateRangeError::Inverted { since, until });
        }
        Ok(Self { since, until })
    }

    /// Parses two `YYYY-MM-DD` strings.
    pub fn parse(since: &str, until: &str) -> Result<Self, DateRangeError> {
        Self::new(parse_date(since)?, parse_date(until)?)
    }

    /// The `n` days ending at `today` (inclusive).
    pub fn last_n_days(today: NaiveDate, n: u32) -> Result<Self, DateRangeError> {
        if n == 0 {
            return Err(DateRangeError::Empty);
        }
        Ok(Self {
            since: today - Duration::days(i64::from(n) - 1),
            until: today,
        })
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.until - self.since).num_days() + 1
    }

    /// The window of equal length that ends the day before this one starts.
    pub fn previous(&self) -> Self {
        let until = self.since - Duration::days(1);
        Self {
            since: until - Duration::days(self.days() - 1),
            until,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.since <= date && date <= self.until
    }

    pub fn since_str(&self) -> String {
        self.since.format(DATE_FORMAT).to_string()
    }

    pub fn until_str(&self) -> String {
        self.until.format(DATE_FORMAT).to_string()
    }
}

pub fn parse_date(input: &str) -> Result<NaiveDate, DateRangeError> {
    // Connectors sometimes send full timestamps ("2025-03-01 00:00:00").
    let head = input.trim().get(..10).unwrap_or(input.trim());
    NaiveDate::parse_from_str(head, DATE_FORMAT).map_err(|_| DateRangeError::Parse {
        input: input.to_string(),
    })
}
