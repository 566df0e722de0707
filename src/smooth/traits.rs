//! Boundaries to the vehicle: pose feedback in, motion commands out.

use super::command::MoveCommand;
use crate::geometry::VehiclePose;
use crate::Result;

/// Source of the current vehicle pose.
pub trait PoseEstimator {
    /// Blocking read of the current pose and the time it was measured (seconds).
    fn current_pose(&mut self) -> Result<(VehiclePose, f64)>;
}

/// Sink for relative motion commands.
pub trait Actuator {
    /// Issue one command. Expected to return within the command duration.
    fn send(&mut self, command: &MoveCommand) -> Result<()>;
}

impl<T: PoseEstimator + ?Sized> PoseEstimator for &mut T {
    fn current_pose(&mut self) -> Result<(VehiclePose, f64)> {
        (**self).current_pose()
    }
}

impl<T: Actuator + ?Sized> Actuator for &mut T {
    fn send(&mut self, command: &MoveCommand) -> Result<()> {
        (**self).send(command)
    }
}

impl<T: PoseEstimator + ?Sized> PoseEstimator for Box<T> {
    fn current_pose(&mut self) -> Result<(VehiclePose, f64)> {
        (**self).current_pose()
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn send(&mut self, command: &MoveCommand) -> Result<()> {
        (**self).send(command)
    }
}
