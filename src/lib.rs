//! # cinematic-rs - Cinematic Waypoint Planning
//!
//! Trajectory-planning core that steers an aerial vehicle to keep a tracked person
//! cinematically framed.
//!
//! ## Features
//!
//! - Bounding-box tracking with best-match selection and exponential smoothing
//! - Pluggable person motion predictors (linear, polynomial, cubic spline)
//! - Pluggable waypoint generators (fixed target framing, yaw-only, n-gon orbit)
//! - Waypoint caching state machine that advances as the vehicle arrives
//! - Bounded feedback loop turning the next waypoint into relative motion commands
//!
//! ## Example
//!
//! ```rust,ignore
//! use cinematic_rs::{BoundingBox, CinematicController, CinematicControllerConfig, VehiclePose};
//!
//! let mut controller = CinematicController::new(CinematicControllerConfig::default()).unwrap();
//! controller.update_latest_drone_state(VehiclePose::default());
//! controller.update_latest_bbs(Some(&[BoundingBox::new((20.0, 20.0), (0.0, 0.0)).unwrap()]));
//! let waypoints = controller.generate_waypoints();
//! ```

// Internal modules (ports of numpy, scipy)
pub(crate) mod internal;

// Public modules
pub mod clock;
pub mod config;
pub mod controller;
pub mod flight;
pub mod geometry;
pub mod predictor;
pub mod smooth;
pub mod tracking;
pub mod utils;
pub mod waypoint;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PlannerConfig;
pub use controller::{CinematicController, CinematicControllerConfig};
pub use geometry::{BoundingBox, PersonState, RangeModel, VehiclePose, Waypoint};
pub use predictor::{PersonPredictor, PredictorConfig, PredictorEnum, Projection};
pub use smooth::{Actuator, MoveCommand, PoseEstimator, SmoothController, SmoothControllerConfig};
pub use tracking::{BoundingBoxTracker, LostTargetPolicy};
pub use waypoint::{WaypointGenerator, WaypointGeneratorEnum};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur while planning or following waypoints
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Insufficient history: cannot predict from zero person states")]
        InsufficientHistory,

        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Invalid bounding box: {0}")]
        InvalidBoundingBox(String),

        #[error("Curve fitting error: {0}")]
        FitError(String),

        #[error("Waypoint queue is empty")]
        EmptyWaypointQueue,

        #[error("Vehicle pose unavailable: {0}")]
        PoseUnavailable(String),

        #[error("Actuator error: {0}")]
        Actuator(String),

        #[error("Detector error: {0}")]
        Detector(String),

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),

        #[error("JSON error: {0}")]
        JsonError(#[from] serde_json::Error),
    }

    /// Result type for cinematic planning operations
    pub type Result<T> = std::result::Result<T, Error>;
}
