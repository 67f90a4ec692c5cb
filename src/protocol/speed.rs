//! Speed validation.
//!
//! Requested speeds are never rejected: anything outside the legal range is
//! pulled to the nearest bound and the caller is told it happened.

/// Fastest reverse speed the motor shield accepts.
pub const MIN_SPEED: i16 = -255;

/// Fastest forward speed the motor shield accepts.
pub const MAX_SPEED: i16 = 255;

/// Outcome of clamping a requested speed.
///
/// Only [`clamp`] builds one, so `effective` is always in range:
///
/// ```compile_fail
/// use scopelink::protocol::Clamped;
/// let _ = Clamped { requested: 0, effective: 1000 };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clamped {
    requested: i64,
    effective: i16,
}

impl Clamped {
    /// Speed the caller asked for.
    pub fn requested(&self) -> i64 {
        self.requested
    }

    /// Speed that goes on the wire.
    pub fn effective(&self) -> i16 {
        self.effective
    }

    /// True when the requested value had to be changed.
    pub fn was_clamped(&self) -> bool {
        self.requested != i64::from(self.effective)
    }
}

/// Clamp a requested speed into [`MIN_SPEED`, `MAX_SPEED`].
pub fn clamp(requested: i64) -> Clamped {
    let effective = requested.clamp(i64::from(MIN_SPEED), i64::from(MAX_SPEED)) as i16;
    let clamped = Clamped {
        requested,
        effective,
    };

    if clamped.was_clamped() {
        if requested < i64::from(MIN_SPEED) {
            tracing::warn!(requested, "Speed can't be lower than {MIN_SPEED}, forcing {effective}");
        } else {
            tracing::warn!(requested, "Speed can't be higher than {MAX_SPEED}, forcing {effective}");
        }
    }

    clamped
}

/// Step the current speed by `delta` and clamp the result.
pub fn nudge(current: i16, delta: i64) -> Clamped {
    clamp(i64::from(current).saturating_add(delta))
}
