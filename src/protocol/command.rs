//! Axis commands sent to the actuator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::speed::{self, Clamped, MAX_SPEED, MIN_SPEED};
use crate::error::{LinkError, Result};

// =============================================================================
// Axis
// =============================================================================

/// One of the two motorized axes of an equatorial mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Axis {
    RightAscension,
    Declination,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::RightAscension, Axis::Declination];

    /// Label used on the wire.
    pub fn label(&self) -> &'static str {
        match self {
            Axis::RightAscension => "RA",
            Axis::Declination => "DEC",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Axis {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ra" | "right-ascension" | "rightascension" => Ok(Axis::RightAscension),
            "dec" | "declination" => Ok(Axis::Declination),
            _ => Err(LinkError::UnknownAxis(s.to_string())),
        }
    }
}

impl TryFrom<String> for Axis {
    type Error = LinkError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Axis> for String {
    fn from(axis: Axis) -> Self {
        axis.label().to_string()
    }
}

// =============================================================================
// Command
// =============================================================================

/// Set one axis to a speed. The speed is always within [-255, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    axis: Axis,
    speed: i16,
}

impl Command {
    /// Build a command, rejecting speeds outside the legal range.
    pub fn new(axis: Axis, speed: i64) -> Result<Self> {
        if speed < i64::from(MIN_SPEED) || speed > i64::from(MAX_SPEED) {
            return Err(LinkError::SpeedOutOfRange(speed));
        }
        Ok(Self {
            axis,
            speed: speed as i16,
        })
    }

    /// Build a command from any requested speed, clamping it first.
    pub fn clamped(axis: Axis, requested: i64) -> (Self, Clamped) {
        let clamped = speed::clamp(requested);
        (Self::from_clamped(axis, clamped), clamped)
    }

    /// Build a command from an already clamped speed.
    pub fn from_clamped(axis: Axis, clamped: Clamped) -> Self {
        Self {
            axis,
            speed: clamped.effective(),
        }
    }

    /// Stop the given axis.
    pub fn stop(axis: Axis) -> Self {
        Self { axis, speed: 0 }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn speed(&self) -> i16 {
        self.speed
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.axis.label(), self.speed)
    }
}
