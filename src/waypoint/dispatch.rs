//! Enum-based waypoint generator dispatch.

use serde::{Deserialize, Serialize};

use super::fixed_target::FixedTargetGenerator;
use super::ngon::NGonGenerator;
use super::traits::WaypointGenerator;
use super::yaw_only::YawOnlyGenerator;
use crate::geometry::{BoundingBox, VehiclePose, Waypoint};
use crate::predictor::PersonPredictor;
use crate::Result;

/// Enum-based generator for static dispatch.
///
/// Serialized tagged by `kind`, e.g. `{"kind": "ngon", "n": 4, "radius": 2.0}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaypointGeneratorEnum {
    FixedTarget(FixedTargetGenerator),
    YawOnly(YawOnlyGenerator),
    #[serde(rename = "ngon")]
    NGon(NGonGenerator),
}

impl Default for WaypointGeneratorEnum {
    fn default() -> Self {
        WaypointGeneratorEnum::FixedTarget(FixedTargetGenerator::default())
    }
}

impl WaypointGeneratorEnum {
    #[inline(always)]
    pub fn generate(
        &self,
        bounding_box: Option<&BoundingBox>,
        pose: &VehiclePose,
        predictor: Option<&dyn PersonPredictor>,
    ) -> Vec<Waypoint> {
        match self {
            WaypointGeneratorEnum::FixedTarget(g) => g.generate(bounding_box, pose, predictor),
            WaypointGeneratorEnum::YawOnly(g) => g.generate(bounding_box, pose, predictor),
            WaypointGeneratorEnum::NGon(g) => g.generate(bounding_box, pose, predictor),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            WaypointGeneratorEnum::FixedTarget(g) => g.validate(),
            WaypointGeneratorEnum::YawOnly(g) => g.validate(),
            WaypointGeneratorEnum::NGon(g) => g.validate(),
        }
    }
}

impl WaypointGenerator for WaypointGeneratorEnum {
    #[inline(always)]
    fn generate(
        &self,
        bounding_box: Option<&BoundingBox>,
        pose: &VehiclePose,
        predictor: Option<&dyn PersonPredictor>,
    ) -> Vec<Waypoint> {
        WaypointGeneratorEnum::generate(self, bounding_box, pose, predictor)
    }
}

impl From<FixedTargetGenerator> for WaypointGeneratorEnum {
    fn from(g: FixedTargetGenerator) -> Self {
        WaypointGeneratorEnum::FixedTarget(g)
    }
}

impl From<YawOnlyGenerator> for WaypointGeneratorEnum {
    fn from(g: YawOnlyGenerator) -> Self {
        WaypointGeneratorEnum::YawOnly(g)
    }
}

impl From<NGonGenerator> for WaypointGeneratorEnum {
    fn from(g: NGonGenerator) -> Self {
        WaypointGeneratorEnum::NGon(g)
    }
}
