use std::fmt;
use std::ops::Add;
use std::ops::Sub;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Duration, TimeParseError};

// Important: Leap years are integrated. But no time zones and no daylight-saving.

const SECONDS_PER_DAY: i64 = 24 * 3600;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)] // care the ordering of the variants is important
pub enum DateTime {
    Earliest, // always earlier than all points
    Point(i64), // seconds since 1970-01-01T00:00:00
    Latest,   // always later than all points
}

impl DateTime {
    /// Parses "2009-06-15T13:45:13" or "2009-4-15T12:10". Panics on malformed input, use
    /// [`str::parse`] for fallible parsing.
    pub fn new(string: &str) -> DateTime {
        match string.parse() {
            Ok(date_time) => date_time,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn from_seconds(seconds: i64) -> DateTime {
        DateTime::Point(seconds)
    }

    pub fn as_seconds(&self) -> Option<i64> {
        match self {
            DateTime::Point(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_iso(&self) -> String {
        match self {
            DateTime::Earliest => String::from("EARLIEST"),
            DateTime::Point(s) => {
                let (year, month, day) = civil_from_days(s.div_euclid(SECONDS_PER_DAY));
                let in_day = s.rem_euclid(SECONDS_PER_DAY);
                format!(
                    "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                    year,
                    month,
                    day,
                    in_day / 3600,
                    in_day % 3600 / 60,
                    in_day % 60
                )
            }
            DateTime::Latest => String::from("LATEST"),
        }
    }

    /// Duration from `earlier` to `self`, zero if `earlier` is not earlier.
    pub fn saturating_duration_since(self, earlier: DateTime) -> Duration {
        if earlier >= self {
            Duration::zero()
        } else {
            self - earlier
        }
    }
}

impl FromStr for DateTime {
    type Err = TimeParseError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let shortened = string.trim().replace('Z', "");
        let splitted: Vec<&str> = shortened.split(&['T', '-', ' ', ':'][..]).collect();
        let len = splitted.len();
        if !(5..=6).contains(&len) {
            return Err(TimeParseError::Format(string.to_string()));
        }
        let parse = |s: &str| -> Result<i64, TimeParseError> {
            s.parse()
                .map_err(|_| TimeParseError::Format(string.to_string()))
        };

        let year = parse(splitted[0])?;
        let month = parse(splitted[1])?;
        let day = parse(splitted[2])?;
        let hour = parse(splitted[3])?;
        let minute = parse(splitted[4])?;
        let second = if len == 6 { parse(splitted[5])? } else { 0 };

        if !(1..=12).contains(&month)
            || day < 1
            || day > days_of_month(year, month)
            || !(0..=24).contains(&hour)
            || !(0..60).contains(&minute)
            || !(0..60).contains(&second)
        {
            return Err(TimeParseError::OutOfRange(string.to_string()));
        }

        Ok(DateTime::Point(
            days_from_civil(year, month, day) * SECONDS_PER_DAY
                + hour * 3600
                + minute * 60
                + second,
        ))
    }
}

impl Add<Duration> for DateTime {
    type Output = Self;

    fn add(self, other: Duration) -> Self {
        match other {
            Duration::Infinity => DateTime::Latest, //note that Earliest + Infinity = Latest
            Duration::Length(l) => match self {
                DateTime::Earliest => DateTime::Earliest,
                DateTime::Point(s) => DateTime::Point(s + l as i64),
                DateTime::Latest => DateTime::Latest,
            },
        }
    }
}

impl Sub for DateTime {
    type Output = Duration;

    fn sub(self, other: Self) -> Duration {
        assert!(other <= self, "Cannot subtract {} from {}, as it is a later point in time (no negative durations allowed)", other, self);
        match (self, other) {
            (DateTime::Point(s1), DateTime::Point(s2)) => Duration::Length((s1 - s2) as u64),
            (DateTime::Earliest, _) => Duration::zero(), // Earliest - Earliest
            (DateTime::Latest, DateTime::Latest) => Duration::zero(),
            _ => Duration::Infinity, // Latest - Point or Point - Earliest
        }
    }
}

impl Sub<Duration> for DateTime {
    type Output = DateTime;

    fn sub(self, other: Duration) -> DateTime {
        match self {
            DateTime::Earliest => DateTime::Earliest,
            DateTime::Latest => {
                if other == Duration::Infinity {
                    panic!("Cannot subtract Infinity from Latest");
                } else {
                    DateTime::Latest
                }
            }
            DateTime::Point(s) => match other {
                Duration::Infinity => DateTime::Earliest,
                Duration::Length(l) => DateTime::Point(s - l as i64),
            },
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DateTime::Earliest => write!(f, "Earliest"),
            DateTime::Point(s) => {
                let (year, month, day) = civil_from_days(s.div_euclid(SECONDS_PER_DAY));
                let in_day = s.rem_euclid(SECONDS_PER_DAY);
                if in_day % 60 > 0 {
                    write!(
                        f,
                        "{:02}.{:02}.{}_{:02}:{:02}:{:02}",
                        day,
                        month,
                        year,
                        in_day / 3600,
                        in_day % 3600 / 60,
                        in_day % 60
                    )
                } else {
                    write!(
                        f,
                        "{:02}.{:02}.{}_{:02}:{:02}",
                        day,
                        month,
                        year,
                        in_day / 3600,
                        in_day % 3600 / 60
                    )
                }
            }
            DateTime::Latest => write!(f, "Latest"),
        }
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_iso())
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        match string.as_str() {
            "EARLIEST" => Ok(DateTime::Earliest),
            "LATEST" => Ok(DateTime::Latest),
            _ => string.parse().map_err(serde::de::Error::custom),
        }
    }
}

// static functions

fn days_of_month(year: i64, month: i64) -> i64 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Days since 1970-01-01 of a proleptic gregorian date.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let year_of_era = y - era * 400;
    let shifted_month = (month + 9) % 12; // march is 0
    let day_of_year = (153 * shifted_month + 2) / 5 + day - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146097 + day_of_era - 719468
}

fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let day_of_era = z - era * 146097;
    let year_of_era =
        (day_of_era - day_of_era / 1460 + day_of_era / 36524 - day_of_era / 146096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let shifted_month = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * shifted_month + 2) / 5 + 1;
    let month = if shifted_month < 10 {
        shifted_month + 3
    } else {
        shifted_month - 9
    };
    let year = year_of_era + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}
