//! Yaw in place to center the person horizontally.

use serde::{Deserialize, Serialize};

use super::traits::WaypointGenerator;
use crate::geometry::{BoundingBox, VehiclePose, Waypoint};
use crate::predictor::PersonPredictor;
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YawOnlyGenerator {
    /// Horizontal image coordinate the box centroid should sit at (the middle of a 640 px frame by default).
    pub target_centroid_x: f64,
    /// Radians of yaw per unit of horizontal centroid offset.
    pub yaw_gain: f64,
}

impl Default for YawOnlyGenerator {
    fn default() -> Self {
        Self {
            target_centroid_x: 320.0,
            yaw_gain: 0.5,
        }
    }
}

impl YawOnlyGenerator {
    pub fn new(target_centroid_x: f64) -> Self {
        Self {
            target_centroid_x,
            ..Default::default()
        }
    }

    pub fn with_gain(mut self, yaw_gain: f64) -> Self {
        self.yaw_gain = yaw_gain;
        self
    }

    pub fn target_centroid_x(&self) -> f64 {
        self.target_centroid_x
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.target_centroid_x.is_finite() && self.yaw_gain.is_finite()) {
            return Err(Error::InvalidConfig(
                "yaw-only target and gain must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl WaypointGenerator for YawOnlyGenerator {
    fn generate(
        &self,
        bounding_box: Option<&BoundingBox>,
        pose: &VehiclePose,
        _predictor: Option<&dyn PersonPredictor>,
    ) -> Vec<Waypoint> {
        let Some(bb) = bounding_box else {
            return vec![*pose];
        };
        let turn = -self.yaw_gain * (bb.centroid().0 - self.target_centroid_x);
        vec![VehiclePose::new(pose.x, pose.y, pose.z, 0.0, 0.0, pose.yaw + turn)]
    }
}
