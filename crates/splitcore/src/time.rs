//! Time values exchanged with the engine.
//!
//! [`TimeSpan`] is a signed nanosecond count. It crosses the JSON boundary as
//! fractional seconds, and parses from the `[-][[h:]m:]s[.fraction]` notation
//! runners type into editors and remote peers send over the wire.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const FRACTION_DIGITS: usize = 9;

/// A signed duration with nanosecond resolution. Arithmetic saturates at the
/// `i64` nanosecond bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct TimeSpan {
    nanos: i64,
}

impl TimeSpan {
    pub const fn zero() -> Self {
        Self { nanos: 0 }
    }

    pub const fn from_nanos(nanos: i64) -> Self {
        Self { nanos }
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self {
            nanos: millis * NANOS_PER_MILLI,
        }
    }

    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            nanos: (seconds * NANOS_PER_SECOND as f64).round() as i64,
        }
    }

    pub const fn total_nanos(self) -> i64 {
        self.nanos
    }

    pub fn total_seconds(self) -> f64 {
        self.nanos as f64 / NANOS_PER_SECOND as f64
    }

    pub const fn is_negative(self) -> bool {
        self.nanos < 0
    }

    /// Parse the textual notation, e.g. `1:23.45` or `-0:05`.
    pub fn parse(text: &str) -> Result<Self, TimeParseError> {
        text.parse()
    }
}

impl From<f64> for TimeSpan {
    fn from(seconds: f64) -> Self {
        Self::from_seconds(seconds)
    }
}

impl From<TimeSpan> for f64 {
    fn from(span: TimeSpan) -> Self {
        span.total_seconds()
    }
}

impl Add for TimeSpan {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_nanos(self.nanos.saturating_add(rhs.nanos))
    }
}

impl AddAssign for TimeSpan {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for TimeSpan {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_nanos(self.nanos.saturating_sub(rhs.nanos))
    }
}

impl SubAssign for TimeSpan {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for TimeSpan {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_nanos(self.nanos.saturating_neg())
    }
}

/// Why a piece of text is not a time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("empty time")]
    Empty,

    #[error("invalid digits in `{0}`")]
    InvalidDigits(String),

    #[error("time out of range")]
    OutOfRange,
}

impl FromStr for TimeSpan {
    type Err = TimeParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if body.is_empty() {
            return Err(TimeParseError::Empty);
        }

        // rsplitn yields seconds first, then minutes, then everything before
        let mut parts = body.rsplitn(3, ':');
        let seconds_part = parts.next().ok_or(TimeParseError::Empty)?;
        let minutes = parts.next().map(parse_digits).transpose()?.unwrap_or(0);
        let hours = parts.next().map(parse_digits).transpose()?.unwrap_or(0);

        let (whole, fraction) = match seconds_part.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (seconds_part, None),
        };
        let seconds = match (whole.is_empty(), fraction) {
            (true, Some(_)) => 0,
            _ => parse_digits(whole)?,
        };
        let fraction_nanos = match fraction {
            Some(digits) => parse_fraction(digits)?,
            None => 0,
        };

        let total_seconds = hours
            .checked_mul(3600)
            .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(seconds))
            .ok_or(TimeParseError::OutOfRange)?;
        let nanos = total_seconds
            .checked_mul(NANOS_PER_SECOND)
            .and_then(|n| n.checked_add(fraction_nanos))
            .ok_or(TimeParseError::OutOfRange)?;

        Ok(Self::from_nanos(if negative { -nanos } else { nanos }))
    }
}

fn parse_digits(digits: &str) -> Result<i64, TimeParseError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeParseError::InvalidDigits(digits.to_string()));
    }
    digits.parse().map_err(|_| TimeParseError::OutOfRange)
}

fn parse_fraction(digits: &str) -> Result<i64, TimeParseError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeParseError::InvalidDigits(digits.to_string()));
    }
    let significant = &digits[..digits.len().min(FRACTION_DIGITS)];
    let value: i64 = significant.parse().map_err(|_| TimeParseError::OutOfRange)?;
    Ok(value * 10_i64.pow((FRACTION_DIGITS - significant.len()) as u32))
}

/// Which clock a [`Time`] value is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingMethod {
    #[default]
    RealTime,
    GameTime,
}

impl TimingMethod {
    pub fn toggled(self) -> Self {
        match self {
            TimingMethod::RealTime => TimingMethod::GameTime,
            TimingMethod::GameTime => TimingMethod::RealTime,
        }
    }
}

/// A point in a run measured by both timing methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time {
    pub real_time: Option<TimeSpan>,
    pub game_time: Option<TimeSpan>,
}

impl Time {
    pub fn get(&self, method: TimingMethod) -> Option<TimeSpan> {
        match method {
            TimingMethod::RealTime => self.real_time,
            TimingMethod::GameTime => self.game_time,
        }
    }

    pub fn set(&mut self, method: TimingMethod, value: Option<TimeSpan>) {
        match method {
            TimingMethod::RealTime => self.real_time = value,
            TimingMethod::GameTime => self.game_time = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.real_time.is_none() && self.game_time.is_none()
    }
}

/// Lifecycle phase of the timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerPhase {
    #[default]
    NotRunning,
    Running,
    Ended,
    Paused,
}

impl TimerPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            TimerPhase::NotRunning => "NotRunning",
            TimerPhase::Running => "Running",
            TimerPhase::Ended => "Ended",
            TimerPhase::Paused => "Paused",
        }
    }
}
