//! Week arithmetic. Weeks start on Saturday.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A day token within a Saturday-first week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeekDay {
    Sat,
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl WeekDay {
    pub const ALL: [WeekDay; 7] = [
        WeekDay::Sat,
        WeekDay::Sun,
        WeekDay::Mon,
        WeekDay::Tue,
        WeekDay::Wed,
        WeekDay::Thu,
        WeekDay::Fri,
    ];

    /// Days from the start of the week (Saturday = 0).
    pub fn offset(self) -> i64 {
        match self {
            WeekDay::Sat => 0,
            WeekDay::Sun => 1,
            WeekDay::Mon => 2,
            WeekDay::Tue => 3,
            WeekDay::Wed => 4,
            WeekDay::Thu => 5,
            WeekDay::Fri => 6,
        }
    }

    /// The weekday token for a calendar date.
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat => WeekDay::Sat,
            Weekday::Sun => WeekDay::Sun,
            Weekday::Mon => WeekDay::Mon,
            Weekday::Tue => WeekDay::Tue,
            Weekday::Wed => WeekDay::Wed,
            Weekday::Thu => WeekDay::Thu,
            Weekday::Fri => WeekDay::Fri,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeekDay::Sat => "Sat",
            WeekDay::Sun => "Sun",
            WeekDay::Mon => "Mon",
            WeekDay::Tue => "Tue",
            WeekDay::Wed => "Wed",
            WeekDay::Thu => "Thu",
            WeekDay::Fri => "Fri",
        }
    }
}

impl fmt::Display for WeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeekDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeekDay::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownDay(s.to_string()))
    }
}

/// Seven consecutive days starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    pub start: NaiveDate,
}

impl Week {
    /// Use `start` as the first day as given.
    pub fn starting(start: NaiveDate) -> Self {
        Self { start }
    }

    /// The Saturday-first week that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let back = (date.weekday().num_days_from_sunday() + 1) % 7;
        Self {
            start: date - Duration::days(i64::from(back)),
        }
    }

    /// Last day of the week (inclusive).
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(6)
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..7).map(move |offset| start + Duration::days(offset))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end()
    }

    pub fn date_of(&self, day: WeekDay) -> NaiveDate {
        self.start + Duration::days(day.offset())
    }
}
