//! Waypoint generators.
//!
//! This module provides three generator implementations:
//! - `FixedTargetGenerator` - Keep the person framed like a target bounding box
//! - `YawOnlyGenerator` - Turn in place to center the person
//! - `NGonGenerator` - Orbit the (predicted) person along a regular polygon

mod traits;
mod fixed_target;
mod yaw_only;
mod ngon;
mod dispatch;

pub use traits::WaypointGenerator;
pub use fixed_target::FixedTargetGenerator;
pub use yaw_only::YawOnlyGenerator;
pub use ngon::NGonGenerator;
pub use dispatch::WaypointGeneratorEnum;
