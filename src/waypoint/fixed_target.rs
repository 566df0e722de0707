//! Frame the person like a fixed target bounding box.

use serde::{Deserialize, Serialize};

use super::traits::WaypointGenerator;
use crate::geometry::{BoundingBox, VehiclePose, Waypoint};
use crate::predictor::PersonPredictor;
use crate::{Error, Result};

/// Steers so the tracked box matches a target box in size and position.
///
/// - box smaller than the target: fly forward (larger: back up)
/// - box above the target: climb (below: descend)
/// - box left of the target: yaw left (right: yaw right)
///
/// With no box the vehicle hovers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedTargetGenerator {
    pub target: BoundingBox,
    /// Metres of forward travel per unit of area difference.
    pub area_gain: f64,
    /// Metres of climb per unit of vertical centroid offset.
    pub z_gain: f64,
    /// Radians of yaw per unit of horizontal centroid offset.
    pub yaw_gain: f64,
}

impl Default for FixedTargetGenerator {
    fn default() -> Self {
        Self {
            target: BoundingBox::from_parts(10.0, 10.0, 20.0, 20.0),
            area_gain: 0.0005,
            z_gain: 0.5,
            yaw_gain: 0.5,
        }
    }
}

impl FixedTargetGenerator {
    pub fn new(target: BoundingBox) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn with_gains(mut self, area_gain: f64, z_gain: f64, yaw_gain: f64) -> Self {
        self.area_gain = area_gain;
        self.z_gain = z_gain;
        self.yaw_gain = yaw_gain;
        self
    }

    pub fn target(&self) -> &BoundingBox {
        &self.target
    }

    pub fn validate(&self) -> Result<()> {
        BoundingBox::new(self.target.dimensions(), self.target.centroid())?;
        if [self.area_gain, self.z_gain, self.yaw_gain]
            .iter()
            .any(|g| !g.is_finite())
        {
            return Err(Error::InvalidConfig(
                "fixed target gains must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl WaypointGenerator for FixedTargetGenerator {
    fn generate(
        &self,
        bounding_box: Option<&BoundingBox>,
        pose: &VehiclePose,
        _predictor: Option<&dyn PersonPredictor>,
    ) -> Vec<Waypoint> {
        let Some(bb) = bounding_box else {
            return vec![*pose];
        };
        let (cx, cy) = bb.centroid();
        let (tx, ty) = self.target.centroid();

        let forward = self.area_gain * (self.target.area() - bb.area());
        let climb = self.z_gain * (cy - ty);
        let turn = -self.yaw_gain * (cx - tx);

        vec![VehiclePose::new(
            pose.x + forward * pose.yaw.cos(),
            pose.y + forward * pose.yaw.sin(),
            pose.z + climb,
            0.0,
            0.0,
            pose.yaw + turn,
        )]
    }
}
