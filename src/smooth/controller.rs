//! Feedback loop that flies the vehicle to one waypoint.

use std::f64::consts::PI;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::command::{shape_command, BodyError, CommandShaping};
use super::traits::{Actuator, PoseEstimator};
use crate::geometry::{VehiclePose, Waypoint};
use crate::utils::{norm3, rotate_2d, wrap_angle};
use crate::{Error, Result};

/// Configuration for [`SmoothController`]. Distances in metres, angles in radians.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothControllerConfig {
    /// Stop once the position error is below this.
    pub distance_threshold: f64,
    /// Stop once the yaw error is below this (and the distance criterion holds).
    pub yaw_threshold: f64,
    /// Translation error mapped to a 100% command.
    pub max_translation: f64,
    /// Yaw error mapped to a 100% command; larger errors are clamped.
    pub max_yaw: f64,
    pub translation_dead_zone: f64,
    pub yaw_dead_zone: f64,
    /// Duration of each command, in seconds.
    pub command_duration: f64,
    /// Upper bound on loop iterations per `follow` call. `None` loops until converged.
    pub max_iterations: Option<usize>,
}

impl Default for SmoothControllerConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 0.2,
            yaw_threshold: 5.0 * PI / 180.0,
            max_translation: 6.0,
            max_yaw: PI / 2.0,
            translation_dead_zone: 0.1,
            yaw_dead_zone: 2.0 * PI / 180.0,
            command_duration: 1.0,
            max_iterations: Some(200),
        }
    }
}

impl SmoothControllerConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("distance_threshold", self.distance_threshold),
            ("yaw_threshold", self.yaw_threshold),
            ("max_translation", self.max_translation),
            ("max_yaw", self.max_yaw),
            ("command_duration", self.command_duration),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("translation_dead_zone", self.translation_dead_zone),
            ("yaw_dead_zone", self.yaw_dead_zone),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        if self.translation_dead_zone >= self.distance_threshold {
            return Err(Error::InvalidConfig(format!(
                "translation_dead_zone ({}) must be below distance_threshold ({})",
                self.translation_dead_zone, self.distance_threshold
            )));
        }
        if self.yaw_dead_zone >= self.yaw_threshold {
            return Err(Error::InvalidConfig(format!(
                "yaw_dead_zone ({}) must be below yaw_threshold ({})",
                self.yaw_dead_zone, self.yaw_threshold
            )));
        }
        if self.max_iterations == Some(0) {
            return Err(Error::InvalidConfig("max_iterations must be at least 1".to_string()));
        }
        Ok(())
    }

    fn shaping(&self) -> CommandShaping {
        CommandShaping {
            max_translation: self.max_translation,
            max_yaw: self.max_yaw,
            translation_dead_zone: self.translation_dead_zone,
            yaw_dead_zone: self.yaw_dead_zone,
        }
    }
}

/// Outcome of one [`SmoothController::follow`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowReport {
    /// The waypoint was reached within the thresholds.
    pub reached: bool,
    pub iterations: usize,
    /// Position error at the last iteration.
    pub distance: f64,
    /// Wrapped yaw error at the last iteration.
    pub yaw_error: f64,
}

/// Drives the vehicle towards the head of a waypoint queue.
///
/// Each iteration reads the pose, rotates the position error into the body
/// frame, issues one shaped [`MoveCommand`](super::MoveCommand) and stops once
/// both the distance and the yaw error are under their thresholds.
pub struct SmoothController<P, A> {
    estimator: P,
    actuator: A,
    config: SmoothControllerConfig,
    duration: Duration,
    last_pose: Option<VehiclePose>,
}

impl<P: PoseEstimator, A: Actuator> SmoothController<P, A> {
    pub fn new(estimator: P, actuator: A, config: SmoothControllerConfig) -> Result<Self> {
        config.validate()?;
        let duration = Duration::try_from_secs_f64(config.command_duration)
            .map_err(|e| Error::InvalidConfig(format!("command_duration: {}", e)))?;
        Ok(Self {
            estimator,
            actuator,
            config,
            duration,
            last_pose: None,
        })
    }

    pub fn config(&self) -> &SmoothControllerConfig {
        &self.config
    }

    pub fn estimator_mut(&mut self) -> &mut P {
        &mut self.estimator
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Last successfully read pose.
    pub fn last_pose(&self) -> Option<&VehiclePose> {
        self.last_pose.as_ref()
    }

    pub fn into_parts(self) -> (P, A) {
        (self.estimator, self.actuator)
    }

    /// Read the pose, falling back to the last good reading on failure.
    pub fn read_pose(&mut self) -> Result<VehiclePose> {
        match self.estimator.current_pose() {
            Ok((pose, _)) => {
                self.last_pose = Some(pose);
                Ok(pose)
            }
            Err(e) => match self.last_pose {
                Some(pose) => {
                    warn!(error = %e, "pose read failed, reusing last pose");
                    Ok(pose)
                }
                None => Err(e),
            },
        }
    }

    /// Fly towards the first waypoint of `waypoints` until it is reached.
    ///
    /// # Errors
    /// `Error::EmptyWaypointQueue` for an empty queue. Actuator errors and pose
    /// errors with no earlier pose to fall back on are returned as is.
    pub fn follow(&mut self, waypoints: &[Waypoint]) -> Result<FollowReport> {
        let goal = *waypoints.first().ok_or(Error::EmptyWaypointQueue)?;
        let shaping = self.config.shaping();

        let mut iterations = 0;
        loop {
            let pose = self.read_pose()?;
            let error = body_error(&goal, &pose);
            let distance = norm3((error.forward, error.left, error.up));

            let command = shape_command(&error, &shaping, self.duration);
            debug!(?command, distance, yaw_error = error.yaw, "move command");
            self.actuator.send(&command)?;
            iterations += 1;

            let report = FollowReport {
                reached: false,
                iterations,
                distance,
                yaw_error: error.yaw,
            };
            if distance < self.config.distance_threshold
                && error.yaw.abs() < self.config.yaw_threshold
            {
                debug!(iterations, distance, "waypoint reached");
                return Ok(FollowReport {
                    reached: true,
                    ..report
                });
            }
            if self.config.max_iterations.is_some_and(|max| iterations >= max) {
                warn!(iterations, distance, yaw_error = error.yaw, "gave up on waypoint");
                return Ok(report);
            }
        }
    }
}

/// Goal minus pose, with the horizontal part rotated into the body frame.
pub fn body_error(goal: &Waypoint, pose: &VehiclePose) -> BodyError {
    let (forward, left) = rotate_2d(goal.x - pose.x, goal.y - pose.y, -pose.yaw);
    BodyError {
        forward,
        left,
        up: goal.z - pose.z,
        yaw: wrap_angle(goal.yaw - pose.yaw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smooth::MoveCommand;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::f64::consts::FRAC_PI_2;
    use std::io;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    /// Vehicle that executes commands exactly, moving max_translation per 100% per second.
    #[derive(Default)]
    struct IdealState {
        pose: VehiclePose,
        commands: Vec<MoveCommand>,
        fail_reads: usize,
    }

    #[derive(Clone, Default)]
    struct Ideal(Rc<RefCell<IdealState>>);

    impl Ideal {
        fn at(pose: VehiclePose) -> Self {
            let vehicle = Self::default();
            vehicle.0.borrow_mut().pose = pose;
            vehicle
        }

        fn pose(&self) -> VehiclePose {
            self.0.borrow().pose
        }
    }

    impl PoseEstimator for Ideal {
        fn current_pose(&mut self) -> Result<(VehiclePose, f64)> {
            let mut state = self.0.borrow_mut();
            if state.fail_reads > 0 {
                state.fail_reads -= 1;
                return Err(Error::PoseUnavailable("sensor timeout".to_string()));
            }
            Ok((state.pose, 0.0))
        }
    }

    impl Actuator for Ideal {
        fn send(&mut self, command: &MoveCommand) -> Result<()> {
            let mut state = self.0.borrow_mut();
            let dt = command.duration.as_secs_f64();
            let forward = command.pitch / 100.0 * 6.0 * dt;
            let left = -command.roll / 100.0 * 6.0 * dt;
            let (dx, dy) = rotate_2d(forward, left, state.pose.yaw);
            state.pose.x += dx;
            state.pose.y += dy;
            state.pose.z += command.vertical / 100.0 * 6.0 * dt;
            state.pose.yaw += command.yaw / 100.0 * FRAC_PI_2 * dt;
            state.commands.push(*command);
            Ok(())
        }
    }

    /// Estimator that never returns a pose.
    struct Blind;

    impl PoseEstimator for Blind {
        fn current_pose(&mut self) -> Result<(VehiclePose, f64)> {
            Err(Error::PoseUnavailable("no estimator".to_string()))
        }
    }

    struct Sink(Vec<MoveCommand>);

    impl Actuator for Sink {
        fn send(&mut self, command: &MoveCommand) -> Result<()> {
            self.0.push(*command);
            Ok(())
        }
    }

    #[test]
    fn test_invalid_config() {
        let config = SmoothControllerConfig {
            translation_dead_zone: 0.3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = SmoothControllerConfig {
            max_iterations: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(SmoothControllerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_body_error_rotation() {
        // Facing +y, a goal at +y is straight ahead
        let pose = VehiclePose::level(0.0, 0.0, 0.0, FRAC_PI_2);
        let goal = VehiclePose::level(0.0, 2.0, 1.0, FRAC_PI_2 + 0.1);
        let e = body_error(&goal, &pose);
        assert_relative_eq!(e.forward, 2.0, epsilon = 1e-12);
        assert_relative_eq!(e.left, 0.0, epsilon = 1e-12);
        assert_relative_eq!(e.up, 1.0);
        assert_relative_eq!(e.yaw, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_body_error_wraps_yaw() {
        let pose = VehiclePose::level(0.0, 0.0, 0.0, 3.0);
        let goal = VehiclePose::level(0.0, 0.0, 0.0, -3.0);
        let e = body_error(&goal, &pose);
        assert_relative_eq!(e.yaw, 2.0 * PI - 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_follow_reaches_waypoint() {
        let vehicle = Ideal::at(VehiclePose::default());
        let goal = VehiclePose::level(2.0, -1.0, 0.5, 0.4);
        let mut sc =
            SmoothController::new(vehicle.clone(), vehicle.clone(), SmoothControllerConfig::default())
                .unwrap();

        let report = sc.follow(&[goal, VehiclePose::default()]).unwrap();
        assert!(report.reached);
        assert!(report.iterations <= 3, "iterations {}", report.iterations);
        let pose = vehicle.pose();
        assert_relative_eq!(pose.x, 2.0, epsilon = 0.2);
        assert_relative_eq!(pose.y, -1.0, epsilon = 0.2);
        assert_relative_eq!(pose.z, 0.5, epsilon = 0.2);
        assert_relative_eq!(pose.yaw, 0.4, epsilon = 0.1);
    }

    #[test]
    fn test_follow_when_already_there() {
        let start = VehiclePose::level(1.0, 1.0, 1.0, 0.0);
        let vehicle = Ideal::at(start);
        let mut sc =
            SmoothController::new(vehicle.clone(), vehicle.clone(), SmoothControllerConfig::default())
                .unwrap();
        let report = sc.follow(&[start]).unwrap();
        assert!(report.reached);
        assert_eq!(report.iterations, 1);
        assert!(vehicle.0.borrow().commands[0].is_idle());
    }

    #[test]
    fn test_pose_read_failure_reuses_last_pose() {
        let vehicle = Ideal::at(VehiclePose::default());
        let mut sc =
            SmoothController::new(vehicle.clone(), vehicle.clone(), SmoothControllerConfig::default())
                .unwrap();
        assert_eq!(sc.read_pose().unwrap(), VehiclePose::default());

        vehicle.0.borrow_mut().fail_reads = 1;
        vehicle.0.borrow_mut().pose.x = 5.0;
        assert_eq!(sc.read_pose().unwrap().x, 0.0);
        assert_eq!(sc.read_pose().unwrap().x, 5.0);
        assert_eq!(sc.last_pose().unwrap().x, 5.0);
    }

    #[test]
    fn test_empty_queue_is_an_error() {
        let mut sc =
            SmoothController::new(Blind, Sink(Vec::new()), SmoothControllerConfig::default()).unwrap();
        assert!(matches!(sc.follow(&[]), Err(Error::EmptyWaypointQueue)));
    }

    #[test]
    fn test_pose_error_without_fallback_propagates() {
        let mut sc =
            SmoothController::new(Blind, Sink(Vec::new()), SmoothControllerConfig::default()).unwrap();
        let goal = VehiclePose::default();
        assert!(matches!(sc.follow(&[goal]), Err(Error::PoseUnavailable(_))));
        assert!(sc.actuator().0.is_empty());
    }

    #[test]
    fn test_gives_up_after_max_iterations() {
        struct Stuck;
        impl PoseEstimator for Stuck {
            fn current_pose(&mut self) -> Result<(VehiclePose, f64)> {
                Ok((VehiclePose::default(), 0.0))
            }
        }
        let config = SmoothControllerConfig {
            max_iterations: Some(3),
            ..Default::default()
        };
        let mut sc = SmoothController::new(Stuck, Sink(Vec::new()), config).unwrap();
        let report = sc.follow(&[VehiclePose::level(10.0, 0.0, 0.0, 0.0)]).unwrap();
        assert!(!report.reached);
        assert_eq!(report.iterations, 3);
        assert_relative_eq!(report.distance, 10.0);
        assert_eq!(sc.actuator().0.len(), 3);
        assert_relative_eq!(sc.actuator().0[0].pitch, 100.0);
    }

    /// Log sink for a fmt subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_commands_logged_at_debug() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        let vehicle = Ideal::at(VehiclePose::default());
        let mut sc =
            SmoothController::new(vehicle.clone(), vehicle.clone(), SmoothControllerConfig::default())
                .unwrap();
        tracing::subscriber::with_default(subscriber, || {
            sc.follow(&[VehiclePose::level(1.0, 0.0, 0.0, 0.0)]).unwrap();
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("move command").count(), 2, "{}", logs);
    }
}
