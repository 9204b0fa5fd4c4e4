//! Calendar months, named the way the expense sheets are named.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Month of a date.
    pub fn of(date: NaiveDate) -> Self {
        Self::ALL[date.month0() as usize]
    }

    /// 1-based month number.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Month::Jan => "Jan",
            Month::Feb => "Feb",
            Month::Mar => "Mar",
            Month::Apr => "Apr",
            Month::May => "May",
            Month::Jun => "Jun",
            Month::Jul => "Jul",
            Month::Aug => "Aug",
            Month::Sep => "Sep",
            Month::Oct => "Oct",
            Month::Nov => "Nov",
            Month::Dec => "Dec",
        }
    }

    /// First and last day of this month in `year`.
    pub fn bounds(self, year: i32) -> Option<(NaiveDate, NaiveDate)> {
        let first = NaiveDate::from_ymd_opt(year, self.number(), 1)?;
        let next = match self {
            Month::Dec => NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
            _ => NaiveDate::from_ymd_opt(year, self.number() + 1, 1)?,
        };
        Some((first, next.pred_opt()?))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Month {
    type Err = EngineError;

    /// Accepts the three letter name in any case (`jan`, `Jan`, `JAN`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.short_name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| EngineError::KeyNotFound(format!("month {trimmed}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_of_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Month::of(date), Month::Feb);
        assert_eq!(Month::Feb.number(), 2);
        assert_eq!(Month::Dec.number(), 12);
    }

    #[test]
    fn parses_short_names() {
        assert_eq!("jan".parse::<Month>().unwrap(), Month::Jan);
        assert_eq!("DEC".parse::<Month>().unwrap(), Month::Dec);
        assert!("January".parse::<Month>().is_err());
    }

    #[test]
    fn bounds_cover_the_whole_month() {
        let (first, last) = Month::Feb.bounds(2024).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, last) = Month::Dec.bounds(2023).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }
}
