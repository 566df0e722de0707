//! Waypoint generator trait.

use crate::geometry::{BoundingBox, VehiclePose, Waypoint};
use crate::predictor::PersonPredictor;

/// Trait for waypoint generators.
///
/// A generator maps the smoothed bounding box, the current vehicle pose and an
/// optional person predictor to an ordered sequence of target poses.
pub trait WaypointGenerator: Send + Sync {
    /// Generate the next waypoints.
    ///
    /// # Arguments
    /// * `bounding_box` - Smoothed box of the tracked person, `None` when nothing is tracked
    /// * `pose` - Current vehicle pose
    /// * `predictor` - Person predictor, if one is attached
    ///
    /// # Returns
    /// Waypoints in flight order. Never empty.
    fn generate(
        &self,
        bounding_box: Option<&BoundingBox>,
        pose: &VehiclePose,
        predictor: Option<&dyn PersonPredictor>,
    ) -> Vec<Waypoint>;
}
