//! Orbit the person along a regular polygon.
//!
//! Without a predictor the polygon is centered `radius` ahead of the vehicle. With
//! one, vertex `i` is placed around the person's predicted position at
//! `i * look_ahead / n` seconds, so the polygon drifts with the person.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::traits::WaypointGenerator;
use crate::geometry::{BoundingBox, PersonState, VehiclePose, Waypoint};
use crate::predictor::PersonPredictor;
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NGonGenerator {
    /// Number of vertices.
    pub n: usize,
    /// Distance from each vertex to its center.
    pub radius: f64,
    /// Prediction horizon spanned by the vertices, in seconds.
    pub look_ahead: f64,
}

impl Default for NGonGenerator {
    fn default() -> Self {
        Self {
            n: 8,
            radius: 1.0,
            look_ahead: 10.0,
        }
    }
}

impl NGonGenerator {
    pub fn new(n: usize, radius: f64) -> Result<Self> {
        let generator = Self {
            n,
            radius,
            ..Default::default()
        };
        generator.validate()?;
        Ok(generator)
    }

    pub fn with_look_ahead(mut self, look_ahead: f64) -> Self {
        self.look_ahead = look_ahead;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(Error::InvalidConfig("ngon needs at least one vertex".to_string()));
        }
        if !(self.radius.is_finite() && self.radius >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "ngon radius must be finite and non-negative, got {}",
                self.radius
            )));
        }
        if !(self.look_ahead.is_finite() && self.look_ahead >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "ngon look_ahead must be finite and non-negative, got {}",
                self.look_ahead
            )));
        }
        Ok(())
    }

    /// Polygon centers for sub-horizons `0..=n`.
    fn centers(&self, pose: &VehiclePose, predictor: Option<&dyn PersonPredictor>) -> Vec<PersonState> {
        let ahead = PersonState::new(
            pose.x + pose.yaw.cos() * self.radius,
            pose.y + pose.yaw.sin() * self.radius,
        );
        let fixed = vec![ahead; self.n + 1];

        let Some(predictor) = predictor else {
            return fixed;
        };
        if predictor.is_empty() {
            debug!("person predictor has no history, centering ngon ahead of the vehicle");
            return fixed;
        }

        let timesteps: Vec<f64> = (0..=self.n)
            .map(|i| i as f64 * self.look_ahead / self.n as f64)
            .collect();
        match predictor.predict_next_person_state(&timesteps) {
            Ok(states) if states.len() == timesteps.len() => states,
            Ok(states) => {
                warn!(
                    expected = timesteps.len(),
                    got = states.len(),
                    "person predictor returned the wrong number of states"
                );
                fixed
            }
            Err(e) => {
                warn!(error = %e, "person prediction failed, centering ngon ahead of the vehicle");
                fixed
            }
        }
    }
}

impl WaypointGenerator for NGonGenerator {
    fn generate(
        &self,
        _bounding_box: Option<&BoundingBox>,
        pose: &VehiclePose,
        predictor: Option<&dyn PersonPredictor>,
    ) -> Vec<Waypoint> {
        let centers = self.centers(pose, predictor);
        let segment = 2.0 * PI / self.n as f64;

        // Vertex 0 is the current pose and is skipped
        (1..=self.n)
            .map(|i| {
                let center = centers[i];
                let angle = segment * i as f64 + PI + pose.yaw;
                VehiclePose::new(
                    center.x + angle.cos() * self.radius,
                    center.y + angle.sin() * self.radius,
                    pose.z,
                    pose.roll,
                    pose.pitch,
                    pose.yaw + segment * i as f64,
                )
            })
            .collect()
    }
}
