//! Closed-loop following of cinematic waypoints.
//!
//! - `SmoothController` - Pose feedback loop to the head waypoint
//! - `MoveCommand` - Bounded relative motion command sent to the vehicle
//! - `PoseEstimator` / `Actuator` - Vehicle boundaries the loop runs against

mod traits;
mod command;
mod controller;

pub use traits::{Actuator, PoseEstimator};
pub use command::{interp, shape_command, BodyError, CommandShaping, MoveCommand};
pub use controller::{body_error, FollowReport, SmoothController, SmoothControllerConfig};
