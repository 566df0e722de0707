//! Planner configuration file.
//!
//! Everything tunable lives in one JSON document; omitted sections and fields
//! take their defaults:
//!
//! ```json
//! {
//!   "controller": {
//!     "bb_filter_gamma": 0.9,
//!     "waypoint_generator": { "kind": "ngon", "n": 6, "radius": 2.0 },
//!     "person_predictor": { "kind": "polynomial", "degree": 2 }
//!   },
//!   "smooth": { "distance_threshold": 0.2 },
//!   "flight": { "max_iterations": 10 }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::controller::CinematicControllerConfig;
use crate::flight::{FlightLoopConfig, SimulatedVehicleConfig};
use crate::smooth::SmoothControllerConfig;
use crate::Result;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub controller: CinematicControllerConfig,
    pub smooth: SmoothControllerConfig,
    pub flight: FlightLoopConfig,
    pub vehicle: SimulatedVehicleConfig,
}

impl PlannerConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.controller.validate()?;
        self.smooth.validate()?;
        self.flight.validate()?;
        self.vehicle.validate()
    }
}
