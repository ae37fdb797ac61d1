//! Date window validation for heat-data requests.
//!
//! A [`DateRange`] can only be built through [`validate`], so holding one
//! means the window is ordered and no longer than [`MAX_SPAN_DAYS`].

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::RangeError;

/// Longest window the backend is asked to aggregate, measured as `end - start`.
pub const MAX_SPAN_DAYS: i64 = 365;

/// Wire and form format for dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A validated, immutable analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = RangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        validate(start, end)?;
        Ok(Self { start, end })
    }

    /// Parse the two form inputs (`YYYY-MM-DD`) and validate the window.
    pub fn parse(start: &str, end: &str) -> Result<Self, RangeError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// The window ending `today` and starting `days` earlier, capped at the maximum span.
    pub fn last_days(today: NaiveDate, days: i64) -> Self {
        let days = days.clamp(0, MAX_SPAN_DAYS);
        Self {
            start: today - Duration::days(days),
            end: today,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn start_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_param(), self.end_param())
    }
}

/// Check ordering and span. Pure; the caller reports the reason and skips the request.
pub fn validate(start: NaiveDate, end: NaiveDate) -> Result<(), RangeError> {
    if start > end {
        return Err(RangeError::InvalidOrder);
    }
    let days = (end - start).num_days();
    if days > MAX_SPAN_DAYS {
        return Err(RangeError::RangeTooLarge { days });
    }
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate, RangeError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| RangeError::InvalidDate(trimmed.to_string()))
}
