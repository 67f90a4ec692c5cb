//! Two-axis mount control on top of a ready session.
//!
//! Tracks the speed last acknowledged by the actuator for each axis, so
//! relative moves (+1, -10, ...) can be computed on the host side.

use serde::Deserialize;

use crate::error::Result;
use crate::protocol::{speed, Axis, Clamped, Command, Reply};
use crate::session::Session;
use crate::transport::ByteSource;

/// Speed of each axis as last acknowledged by the actuator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisSpeeds {
    pub ra: i16,
    pub dec: i16,
}

impl AxisSpeeds {
    pub fn get(&self, axis: Axis) -> i16 {
        match axis {
            Axis::RightAscension => self.ra,
            Axis::Declination => self.dec,
        }
    }

    fn set(&mut self, axis: Axis, speed: i16) {
        match axis {
            Axis::RightAscension => self.ra = speed,
            Axis::Declination => self.dec = speed,
        }
    }
}

/// Angular rate produced by one speed step, per axis, in radians per minute.
///
/// An unset axis has no known rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Calibration {
    pub ra: Option<f64>,
    pub dec: Option<f64>,
}

impl Calibration {
    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::RightAscension => self.ra,
            Axis::Declination => self.dec,
        }
    }
}

/// Outcome of one mount operation.
#[derive(Debug, Clone)]
pub struct Applied {
    pub command: Command,
    pub clamped: Clamped,
    pub reply: Reply,
}

/// A ready session plus the speed each axis was last set to.
pub struct Mount<S> {
    session: Session<S>,
    speeds: AxisSpeeds,
    calibration: Calibration,
}

impl<S: ByteSource> Mount<S> {
    /// Both axes are assumed stopped: the actuator resets on open.
    pub fn new(session: Session<S>) -> Self {
        Self {
            session,
            speeds: AxisSpeeds::default(),
            calibration: Calibration::default(),
        }
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn speeds(&self) -> AxisSpeeds {
        self.speeds
    }

    pub fn speed(&self, axis: Axis) -> i16 {
        self.speeds.get(axis)
    }

    /// Angular rate of `axis` in mrad/min, if that axis is calibrated.
    pub fn angular_rate(&self, axis: Axis) -> Option<f64> {
        self.calibration
            .get(axis)
            .map(|rad_per_step| f64::from(self.speed(axis)) * rad_per_step * 1000.0)
    }

    pub async fn set_speed(&mut self, axis: Axis, requested: i64) -> Result<Applied> {
        self.apply(axis, speed::clamp(requested)).await
    }

    /// Change the speed of `axis` by `delta` steps.
    pub async fn nudge(&mut self, axis: Axis, delta: i64) -> Result<Applied> {
        self.apply(axis, speed::nudge(self.speed(axis), delta)).await
    }

    pub async fn stop(&mut self, axis: Axis) -> Result<Applied> {
        self.apply(axis, speed::clamp(0)).await
    }

    /// Stop RA, then DEC.
    pub async fn stop_all(&mut self) -> Result<Vec<Applied>> {
        let mut applied = Vec::with_capacity(Axis::ALL.len());
        for axis in Axis::ALL {
            applied.push(self.stop(axis).await?);
        }
        Ok(applied)
    }

    pub fn into_session(self) -> Session<S> {
        self.session
    }

    async fn apply(&mut self, axis: Axis, clamped: Clamped) -> Result<Applied> {
        let command = Command::from_clamped(axis, clamped);
        let reply = self.session.send(&command).await?;
        self.speeds.set(axis, command.speed());
        Ok(Applied {
            command,
            clamped,
            reply,
        })
    }
}
