//! First-order kinematic vehicle for simulations and tests.
//!
//! Clones share one state, so a single simulated vehicle can serve as both the
//! pose estimator and the actuator of a [`SmoothController`](crate::smooth::SmoothController).
//! It is also a [`Clock`] reporting simulated seconds, which is the time base a
//! person predictor must use when the planner flies this vehicle.

use std::f64::consts::FRAC_PI_2;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::geometry::VehiclePose;
use crate::smooth::{Actuator, MoveCommand, PoseEstimator};
use crate::utils::rotate_2d;
use crate::{Error, Result};

/// Vehicle response to a 100% command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedVehicleConfig {
    /// Horizontal speed at 100% pitch or roll (m/s).
    pub max_speed: f64,
    /// Climb rate at 100% vertical (m/s).
    pub max_climb_rate: f64,
    /// Turn rate at 100% yaw (rad/s).
    pub max_yaw_rate: f64,
    /// Fraction of the commanded motion actually achieved, in (0, 1].
    pub response: f64,
}

impl Default for SimulatedVehicleConfig {
    fn default() -> Self {
        Self {
            max_speed: 6.0,
            max_climb_rate: 6.0,
            max_yaw_rate: FRAC_PI_2,
            response: 1.0,
        }
    }
}

#[derive(Debug)]
struct SimulatedState {
    pose: VehiclePose,
    time: f64,
    commands: Vec<MoveCommand>,
    failing_reads: usize,
}

#[derive(Clone, Debug)]
pub struct SimulatedVehicle {
    state: Arc<Mutex<SimulatedState>>,
    config: SimulatedVehicleConfig,
}

impl SimulatedVehicleConfig {
    pub fn validate(&self) -> Result<()> {
        let rates = [self.max_speed, self.max_climb_rate, self.max_yaw_rate];
        if rates.iter().any(|r| !(r.is_finite() && *r > 0.0)) {
            return Err(Error::InvalidConfig(
                "simulated vehicle rates must be positive".to_string(),
            ));
        }
        if !(self.response > 0.0 && self.response <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "simulated vehicle response must be in (0, 1], got {}",
                self.response
            )));
        }
        Ok(())
    }
}

impl SimulatedVehicle {
    pub fn new(start: VehiclePose, config: SimulatedVehicleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: Arc::new(Mutex::new(SimulatedState {
                pose: start,
                time: 0.0,
                commands: Vec::new(),
                failing_reads: 0,
            })),
            config,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SimulatedState>> {
        self.state
            .lock()
            .map_err(|_| Error::PoseUnavailable("simulated vehicle state poisoned".to_string()))
    }

    pub fn pose(&self) -> Result<VehiclePose> {
        Ok(self.lock()?.pose)
    }

    /// Simulated seconds elapsed.
    pub fn time(&self) -> Result<f64> {
        Ok(self.lock()?.time)
    }

    /// Every command received so far.
    pub fn commands(&self) -> Result<Vec<MoveCommand>> {
        Ok(self.lock()?.commands.clone())
    }

    /// Shared handle to this vehicle's simulated time.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::new(self.clone())
    }

    /// Make the next `count` pose reads fail.
    pub fn fail_next_reads(&self, count: usize) -> Result<()> {
        self.lock()?.failing_reads = count;
        Ok(())
    }
}

impl PoseEstimator for SimulatedVehicle {
    fn current_pose(&mut self) -> Result<(VehiclePose, f64)> {
        let mut state = self.lock()?;
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(Error::PoseUnavailable("simulated read failure".to_string()));
        }
        Ok((state.pose, state.time))
    }
}

impl Clock for SimulatedVehicle {
    fn now(&self) -> f64 {
        match self.state.lock() {
            Ok(state) => state.time,
            Err(poisoned) => poisoned.into_inner().time,
        }
    }
}

impl Actuator for SimulatedVehicle {
    fn send(&mut self, command: &MoveCommand) -> Result<()> {
        let dt = command.duration.as_secs_f64();
        let gain = self.config.response * dt / 100.0;
        let forward = command.pitch * self.config.max_speed * gain;
        let left = -command.roll * self.config.max_speed * gain;
        let climb = command.vertical * self.config.max_climb_rate * gain;
        let turn = command.yaw * self.config.max_yaw_rate * gain;

        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::Actuator("simulated vehicle state poisoned".to_string()))?;
        let (dx, dy) = rotate_2d(forward, left, state.pose.yaw);
        let pose = &mut state.pose;
        pose.x += dx;
        pose.y += dy;
        pose.z += climb;
        pose.yaw += turn;
        if dt > 0.0 {
            (pose.x_dot, pose.y_dot, pose.z_dot) = (dx / dt, dy / dt, climb / dt);
            pose.yaw_dot = turn / dt;
        }
        state.time += dt;
        state.commands.push(*command);
        Ok(())
    }
}
