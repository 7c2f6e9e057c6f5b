use chrono::{Days, Local, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer};
use std::{fmt, str::FromStr, time::Duration};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid activation time '{0}': expected HH:MM")]
pub struct ActivationTimeError(pub String);

/// Daily wall-clock time, minute resolution, at which a push cycle starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ActivationTime {
    hour: u32,
    minute: u32,
}

impl ActivationTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ActivationTimeError> {
        if hour > 23 || minute > 59 {
            return Err(ActivationTimeError(format!("{hour:02}:{minute:02}")));
        }
        Ok(ActivationTime { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    fn as_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for ActivationTime {
    type Err = ActivationTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ActivationTimeError(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;

        let parse = |part: &str| -> Result<u32, ActivationTimeError> {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        ActivationTime::new(parse(hour)?, parse(minute)?).map_err(|_| invalid())
    }
}

impl fmt::Display for ActivationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl<'de> Deserialize<'de> for ActivationTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// The next instant the activation time is reached.
///
/// Compared at minute resolution: once the clock shows the activation minute
/// or later, the target moves to tomorrow. The result is always after `now`
/// and at most 24 hours away.
pub fn next_activation(now: NaiveDateTime, at: ActivationTime) -> NaiveDateTime {
    let current = (now.hour(), now.minute());
    let today = now.date().and_time(at.as_time());

    if current >= (at.hour, at.minute) {
        today
            .date()
            .checked_add_days(Days::new(1))
            .map(|day| day.and_time(at.as_time()))
            .unwrap_or(NaiveDateTime::MAX)
    } else {
        today
    }
}

/// How long to sleep from `now` until `target`; zero if it already passed.
pub fn wait_until(now: NaiveDateTime, target: NaiveDateTime) -> Duration {
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

/// Current local wall-clock time.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
