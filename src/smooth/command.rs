//! Relative motion commands and their shaping from pose errors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::clamp_magnitude;

/// Relative motion command for the actuator.
///
/// Each axis is a signed percentage of its maximum in `[-100, 100]`:
/// `pitch > 0` flies forward, `roll > 0` flies right, `vertical > 0` climbs and
/// `yaw > 0` turns counter-clockwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveCommand {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub vertical: f64,
    pub duration: Duration,
}

impl MoveCommand {
    /// True when no axis is commanded.
    pub fn is_idle(&self) -> bool {
        self.roll == 0.0 && self.pitch == 0.0 && self.yaw == 0.0 && self.vertical == 0.0
    }
}

/// Pose error expressed in the vehicle body frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BodyError {
    pub forward: f64,
    pub left: f64,
    pub up: f64,
    /// Wrapped to (-pi, pi].
    pub yaw: f64,
}

/// Limits used to turn a [`BodyError`] into a [`MoveCommand`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommandShaping {
    /// Translation error mapped to 100%.
    pub max_translation: f64,
    /// Yaw error mapped to 100%.
    pub max_yaw: f64,
    /// Translation errors at or below this are not commanded.
    pub translation_dead_zone: f64,
    /// Yaw errors at or below this are not commanded.
    pub yaw_dead_zone: f64,
}

/// Magnitude of `value` as a percentage of `max_value`, saturating at 100.
pub fn interp(value: f64, max_value: f64) -> f64 {
    value.abs().min(max_value) / max_value * 100.0
}

fn axis(error: f64, max_value: f64, dead_zone: f64) -> f64 {
    if error.abs() > dead_zone {
        error.signum() * interp(error, max_value)
    } else {
        0.0
    }
}

/// Clamp, scale to a percentage, then apply the per-axis dead zones.
pub fn shape_command(error: &BodyError, shaping: &CommandShaping, duration: Duration) -> MoveCommand {
    let yaw = clamp_magnitude(error.yaw, shaping.max_yaw);
    MoveCommand {
        roll: -axis(error.left, shaping.max_translation, shaping.translation_dead_zone),
        pitch: axis(error.forward, shaping.max_translation, shaping.translation_dead_zone),
        yaw: axis(yaw, shaping.max_yaw, shaping.yaw_dead_zone),
        vertical: axis(error.up, shaping.max_translation, shaping.translation_dead_zone),
        duration,
    }
}
