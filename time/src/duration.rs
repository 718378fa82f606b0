use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::ops::Sub;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::TimeParseError;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)] // care the ordering of the variants is important
pub enum Duration {
    Length(u64), // seconds
    Infinity,    // always longer than all other Durations
}

impl Duration {
    /// Parses "hh:mm" or "hh:mm:ss". Panics on malformed input.
    pub fn new(string: &str) -> Duration {
        match string.parse() {
            Ok(duration) => duration,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn from_seconds(seconds: u64) -> Duration {
        Duration::Length(seconds)
    }

    pub fn from_minutes(minutes: u64) -> Duration {
        Duration::Length(minutes * 60)
    }

    pub fn from_hours(hours: u64) -> Duration {
        Duration::Length(hours * 3600)
    }

    pub fn zero() -> Duration {
        Duration::Length(0)
    }

    pub fn is_zero(&self) -> bool {
        *self == Duration::Length(0)
    }

    pub fn in_sec(&self) -> u64 {
        match self {
            Duration::Infinity => panic!("Cannot get seconds of Duration::Infinity."),
            Duration::Length(l) => *l,
        }
    }

    pub fn in_min(&self) -> u64 {
        self.in_sec() / 60
    }

    /// Fractional hours, infinite for [`Duration::Infinity`].
    pub fn in_hours(&self) -> f64 {
        match self {
            Duration::Infinity => f64::INFINITY,
            Duration::Length(l) => *l as f64 / 3600.0,
        }
    }

    pub fn saturating_sub(self, other: Duration) -> Duration {
        if other >= self {
            Duration::zero()
        } else {
            self - other
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Duration::zero()
    }
}

impl FromStr for Duration {
    type Err = TimeParseError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        if string == "Inf" {
            return Ok(Duration::Infinity);
        }
        let splitted: Vec<&str> = string.trim().split(':').collect();
        if !(2..=3).contains(&splitted.len()) {
            return Err(TimeParseError::Format(string.to_string()));
        }
        let parse = |s: &str| -> Result<u64, TimeParseError> {
            s.parse()
                .map_err(|_| TimeParseError::Format(string.to_string()))
        };
        let hours = parse(splitted[0])?;
        let minutes = parse(splitted[1])?;
        let seconds = if splitted.len() == 3 {
            parse(splitted[2])?
        } else {
            0
        };
        if minutes >= 60 || seconds >= 60 {
            return Err(TimeParseError::OutOfRange(string.to_string()));
        }
        Ok(Duration::Length(hours * 3600 + minutes * 60 + seconds))
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        match (self, other) {
            (Duration::Length(l1), Duration::Length(l2)) => Duration::Length(l1 + l2),
            _ => Duration::Infinity,
        }
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        assert!(
            self >= other,
            "Cannot subtract a longer duration ({}) from a shorter duration ({}).",
            other,
            self
        );
        match self {
            Duration::Infinity => Duration::Infinity,
            Duration::Length(l1) => match other {
                Duration::Infinity => panic!("Cannot subtract Infinity"),
                Duration::Length(l2) => Duration::Length(l1 - l2),
            },
        }
    }
}

impl Sum for Duration {
    fn sum<I>(iter: I) -> Self
    where
        I: Iterator<Item = Self>,
    {
        iter.fold(Duration::zero(), |a, b| a + b)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Duration::Length(l) => {
                if l % 60 > 0 {
                    write!(f, "{:02}:{:02}:{:02}h", l / 3600, l % 3600 / 60, l % 60)
                } else {
                    write!(f, "{:02}:{:02}h", l / 3600, l % 3600 / 60)
                }
            }
            Duration::Infinity => write!(f, "Inf"),
        }
    }
}

// Durations are written as seconds, or "Inf".
impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Duration::Length(l) => serializer.serialize_u64(*l),
            Duration::Infinity => serializer.serialize_str("Inf"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DurationRepr {
    Seconds(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match DurationRepr::deserialize(deserializer)? {
            DurationRepr::Seconds(s) => Ok(Duration::Length(s)),
            DurationRepr::Text(t) => t.parse().map_err(serde::de::Error::custom),
        }
    }
}
