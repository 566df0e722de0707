//! Flight orchestration and simulated collaborators.
//!
//! - `FlightLoop` - Detect, estimate, plan and follow, cycle after cycle
//! - `Detector` - Person detector boundary
//! - `ScriptedDetector` - Replays recorded detections
//! - `SimulatedVehicle` - Kinematic vehicle implementing both vehicle boundaries

mod traits;
mod scripted;
mod simulated;
mod flight_loop;

pub use traits::Detector;
pub use scripted::ScriptedDetector;
pub use simulated::{SimulatedVehicle, SimulatedVehicleConfig};
pub use flight_loop::{FlightLoop, FlightLoopConfig, FlightReport};
