//! Speed planning for timed mode.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors that can occur when parsing a speed range.
#[derive(Error, Debug, PartialEq)]
pub enum SpeedRangeError {
    #[error("Invalid speed range '{0}'. Expected two numbers: min,max (e.g. 0.75,1.4)")]
    InvalidFormat(String),

    #[error("Speed bounds must be positive, got {min},{max}")]
    NonPositive { min: f64, max: f64 },

    #[error("Speed minimum {min} is greater than maximum {max}")]
    Inverted { min: f64, max: f64 },
}

/// Inclusive range of allowed speed multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRange {
    pub min: f64,
    pub max: f64,
}

impl SpeedRange {
    /// Create a validated range.
    pub fn new(min: f64, max: f64) -> Result<Self, SpeedRangeError> {
        if min <= 0.0 || max <= 0.0 {
            return Err(SpeedRangeError::NonPositive { min, max });
        }
        if min > max {
            return Err(SpeedRangeError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, speed: f64) -> bool {
        self.min <= speed && speed <= self.max
    }

    pub fn clamp(&self, speed: f64) -> f64 {
        speed.clamp(self.min, self.max)
    }
}

impl Default for SpeedRange {
    fn default() -> Self {
        Self {
            min: 0.75,
            max: 1.4,
        }
    }
}

impl FromStr for SpeedRange {
    type Err = SpeedRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SpeedRangeError::InvalidFormat(s.to_string());

        let (min, max) = s.split_once(',').ok_or_else(invalid)?;
        let min = min.trim().parse::<f64>().map_err(|_| invalid())?;
        let max = max.trim().parse::<f64>().map_err(|_| invalid())?;

        Self::new(min, max)
    }
}

impl fmt::Display for SpeedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.min, self.max)
    }
}

/// Which way a required speed fell outside the allowed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clamp {
    /// Text is too long for its window; speed was capped at the maximum.
    TooLong,
    /// Text is too short for its window; speed was raised to the minimum.
    TooShort,
}

/// Result of planning a segment's speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedDecision {
    /// Speed to request, clamped into the allowed range.
    pub speed: f64,
    /// Unclamped speed needed to fill the window exactly.
    pub required: f64,
    pub within_range: bool,
}

impl SpeedDecision {
    /// Direction of clamping, if any.
    pub fn clamp(&self, range: &SpeedRange) -> Option<Clamp> {
        if self.within_range {
            None
        } else if self.required > range.max {
            Some(Clamp::TooLong)
        } else {
            Some(Clamp::TooShort)
        }
    }
}

/// Speed multiplier needed for `text` to fill `target_duration` seconds.
///
/// Speeds above 1.0 mean the speech must be sped up.
pub fn plan_speed(
    text: &str,
    target_duration: f64,
    chars_per_sec: f64,
    range: &SpeedRange,
) -> SpeedDecision {
    if target_duration <= 0.0 {
        return SpeedDecision {
            speed: 1.0,
            required: 1.0,
            within_range: true,
        };
    }

    let estimated_duration = text.chars().count() as f64 / chars_per_sec;
    let required = estimated_duration / target_duration;

    SpeedDecision {
        speed: range.clamp(required),
        required,
        within_range: range.contains(required),
    }
}
