//! Recurrence rules
//!
//! A rule is a small cron-like structure of three fields (weekday, hour,
//! minute). Each field is either unconstrained, fixed, or a step. Matching is
//! a pure function of the wall-clock minute, evaluated in UTC.

use super::error::{DomainError, Result};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use std::fmt;

/// Hour or minute constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Any,
    At(u32),
    /// Values divisible by the step (cron `*/n`)
    Every(u32),
}

impl Field {
    pub fn matches(&self, value: u32) -> bool {
        match self {
            Field::Any => true,
            Field::At(v) => *v == value,
            Field::Every(step) => value % step == 0,
        }
    }

    fn validate(&self, name: &str, limit: u32) -> Result<()> {
        match self {
            Field::Any => Ok(()),
            Field::At(v) if *v < limit => Ok(()),
            Field::Every(step) if *step > 0 && *step < limit => Ok(()),
            other => Err(DomainError::InvalidRecurrence(format!(
                "{} field {:?} out of range (limit {})",
                name, other, limit
            ))),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Any => write!(f, "*"),
            Field::At(v) => write!(f, "{}", v),
            Field::Every(step) => write!(f, "*/{}", step),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekdayField {
    Any,
    On(Weekday),
}

impl WeekdayField {
    pub fn matches(&self, day: Weekday) -> bool {
        match self {
            WeekdayField::Any => true,
            WeekdayField::On(d) => *d == day,
        }
    }
}

impl fmt::Display for WeekdayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekdayField::Any => write!(f, "*"),
            WeekdayField::On(d) => write!(f, "{}", d),
        }
    }
}

/// Recurrence rule bound to a job definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurrence {
    weekday: WeekdayField,
    hour: Field,
    minute: Field,
}

impl Recurrence {
    pub fn new(weekday: WeekdayField, hour: Field, minute: Field) -> Result<Self> {
        hour.validate("hour", 24)?;
        minute.validate("minute", 60)?;
        Ok(Self {
            weekday,
            hour,
            minute,
        })
    }

    /// Once a week at `hour:minute`
    pub fn weekly(day: Weekday, hour: u32, minute: u32) -> Result<Self> {
        Self::new(WeekdayField::On(day), Field::At(hour), Field::At(minute))
    }

    /// Every `step` minutes, aligned to the hour
    pub fn every_minutes(step: u32) -> Result<Self> {
        Self::new(WeekdayField::Any, Field::Any, Field::Every(step))
    }

    /// On minute 0 of every `step`-th hour
    pub fn every_hours(step: u32) -> Result<Self> {
        Self::new(WeekdayField::Any, Field::Every(step), Field::At(0))
    }

    pub fn weekday(&self) -> WeekdayField {
        self.weekday
    }

    pub fn hour(&self) -> Field {
        self.hour
    }

    pub fn minute(&self) -> Field {
        self.minute
    }

    /// True when the minute containing `at` satisfies every field
    pub fn matches(&self, at: &DateTime<Utc>) -> bool {
        self.weekday.matches(at.weekday())
            && self.hour.matches(at.hour())
            && self.minute.matches(at.minute())
    }

    /// First matching minute strictly after `after`.
    ///
    /// Every valid rule matches at least once a week, so the scan is bounded.
    pub fn next_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = minute_floor(after) + Duration::minutes(1);
        (0..7 * 24 * 60)
            .map(|offset| start + Duration::minutes(offset))
            .find(|candidate| self.matches(candidate))
    }
}

impl fmt::Display for Recurrence {
    /// Cron-style `minute hour * * weekday`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} * * {}", self.minute, self.hour, self.weekday)
    }
}

/// Truncate a timestamp to the start of its minute
pub fn minute_floor(at: &DateTime<Utc>) -> DateTime<Utc> {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(*at)
}
