//! ISO week identifiers of the form `YYYY-Www`.
//!
//! Every date derivation (month, calendar ranges) is anchored to the Monday
//! of the week.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{HotspotError, Result};

/// An ISO-8601 week. Orders chronologically (year, then week number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IsoWeek {
    year: i32,
    week: u32,
}

impl IsoWeek {
    /// Build a week, rejecting week numbers that do not exist in `year`
    /// (e.g. W53 in a 52-week year).
    pub fn new(year: i32, week: u32) -> Result<Self> {
        if NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_none() {
            return Err(HotspotError::InvalidWeek(format!("{year}-W{week:02}")));
        }
        Ok(Self { year, week })
    }

    /// The ISO week containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self { year: iso.year(), week: iso.week() }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Week number within the ISO year, 1-53.
    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn monday(&self) -> NaiveDate {
        // Validated in `new`/`from_date`.
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Calendar month (1-12) of the week's Monday.
    pub fn month(&self) -> u32 {
        self.monday().month()
    }

    /// The following ISO week.
    pub fn succ(&self) -> Self {
        Self::from_date(self.monday() + Duration::days(7))
    }
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

impl FromStr for IsoWeek {
    type Err = HotspotError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || HotspotError::InvalidWeek(s.to_string());
        let (year, week) = s.split_once("-W").ok_or_else(invalid)?;
        if year.len() != 4 || week.len() != 2 {
            return Err(invalid());
        }
        if !year.bytes().all(|b| b.is_ascii_digit()) || !week.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let week: u32 = week.parse().map_err(|_| invalid())?;
        Self::new(year, week).map_err(|_| invalid())
    }
}

impl TryFrom<String> for IsoWeek {
    type Error = HotspotError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<IsoWeek> for String {
    fn from(w: IsoWeek) -> Self {
        w.to_string()
    }
}

/// All ISO weeks whose Monday lies between the Monday of `start`'s week and
/// `end` (inclusive), in chronological order without duplicates.
pub fn iso_weeks(start: NaiveDate, end: NaiveDate) -> Vec<IsoWeek> {
    let mut cur = start - Duration::days(i64::from(start.weekday().num_days_from_monday()));
    let mut weeks = Vec::new();
    while cur <= end {
        let w = IsoWeek::from_date(cur);
        if weeks.last() != Some(&w) {
            weeks.push(w);
        }
        cur += Duration::days(7);
    }
    weeks
}
