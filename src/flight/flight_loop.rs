//! Top-level detect, estimate, plan, follow cycle.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::traits::Detector;
use crate::controller::CinematicController;
use crate::smooth::{Actuator, FollowReport, PoseEstimator, SmoothController};
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightLoopConfig {
    /// Number of detect/plan/follow cycles to run.
    pub max_iterations: usize,
}

impl Default for FlightLoopConfig {
    fn default() -> Self {
        Self { max_iterations: 3 }
    }
}

impl FlightLoopConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig(
                "flight loop max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Summary of a [`FlightLoop::run`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlightReport {
    pub iterations: usize,
    /// Frames that contained at least one detection.
    pub frames_with_detections: usize,
    /// One entry per cycle, in order.
    pub follow_reports: Vec<FollowReport>,
}

impl FlightReport {
    pub fn waypoints_reached(&self) -> usize {
        self.follow_reports.iter().filter(|r| r.reached).count()
    }
}

/// Strings the detector, the cinematic controller and the smooth controller together.
///
/// Each cycle:
/// 1. read detections
/// 2. read the vehicle pose
/// 3. update the cinematic controller and generate waypoints
/// 4. follow the head waypoint
///
/// A planner with a person predictor must share the pose estimator's time base,
/// e.g. `CinematicController::with_clock(config, vehicle.clock())` for a
/// [`SimulatedVehicle`](super::SimulatedVehicle).
pub struct FlightLoop<D, P, A> {
    detector: D,
    planner: CinematicController,
    follower: SmoothController<P, A>,
    config: FlightLoopConfig,
}

impl<D: Detector, P: PoseEstimator, A: Actuator> FlightLoop<D, P, A> {
    pub fn new(
        detector: D,
        planner: CinematicController,
        follower: SmoothController<P, A>,
        config: FlightLoopConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector,
            planner,
            follower,
            config,
        })
    }

    pub fn planner(&self) -> &CinematicController {
        &self.planner
    }

    pub fn follower(&self) -> &SmoothController<P, A> {
        &self.follower
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Run one cycle.
    pub fn step(&mut self) -> Result<(bool, FollowReport)> {
        let detections = self.detector.detect()?;
        let detected = detections.as_ref().is_some_and(|d| !d.is_empty());

        // Pose first so the person position is derived from the current pose
        let pose = self.follower.read_pose()?;
        self.planner.update_latest_drone_state(pose);
        self.planner.update_latest_bbs(detections.as_deref());

        let waypoints = self.planner.generate_waypoints();
        debug!(count = waypoints.len(), detected, "planned waypoints");
        let report = self.follower.follow(&waypoints)?;
        Ok((detected, report))
    }

    /// Run `max_iterations` cycles, stopping at the first error.
    pub fn run(&mut self) -> Result<FlightReport> {
        let mut report = FlightReport::default();
        for iteration in 0..self.config.max_iterations {
            debug!(iteration, "flight loop cycle");
            let (detected, follow) = self.step()?;
            report.iterations += 1;
            if detected {
                report.frames_with_detections += 1;
            }
            report.follow_reports.push(follow);
        }
        info!(
            iterations = report.iterations,
            reached = report.waypoints_reached(),
            "flight finished"
        );
        Ok(report)
    }

    pub fn into_parts(self) -> (D, CinematicController, SmoothController<P, A>) {
        (self.detector, self.planner, self.follower)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::CinematicControllerConfig;
    use crate::flight::{ScriptedDetector, SimulatedVehicle, SimulatedVehicleConfig};
    use crate::geometry::{BoundingBox, RangeModel, VehiclePose};
    use crate::predictor::{LinearParams, PredictorConfig};
    use crate::smooth::SmoothControllerConfig;
    use crate::waypoint::NGonGenerator;
    use approx::assert_relative_eq;

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn detect(&mut self) -> Result<Option<Vec<BoundingBox>>> {
            Err(Error::Detector("camera disconnected".to_string()))
        }
    }

    fn follower(vehicle: &SimulatedVehicle) -> SmoothController<SimulatedVehicle, SimulatedVehicle> {
        SmoothController::new(vehicle.clone(), vehicle.clone(), SmoothControllerConfig::default()).unwrap()
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let vehicle = SimulatedVehicle::new(VehiclePose::default(), SimulatedVehicleConfig::default()).unwrap();
        let planner = CinematicController::new(CinematicControllerConfig::default()).unwrap();
        let result = FlightLoop::new(
            ScriptedDetector::default(),
            planner,
            follower(&vehicle),
            FlightLoopConfig { max_iterations: 0 },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_hovers_without_detections() {
        let start = VehiclePose::level(1.0, 2.0, 3.0, 0.0);
        let vehicle = SimulatedVehicle::new(start, SimulatedVehicleConfig::default()).unwrap();
        let planner = CinematicController::new(CinematicControllerConfig::default()).unwrap();
        let mut flight = FlightLoop::new(
            ScriptedDetector::default(),
            planner,
            follower(&vehicle),
            FlightLoopConfig { max_iterations: 3 },
        )
        .unwrap();

        let report = flight.run().unwrap();
        assert_eq!(report.iterations, 3);
        assert_eq!(report.frames_with_detections, 0);
        assert_eq!(report.waypoints_reached(), 3);
        assert_eq!(vehicle.pose().unwrap().position(), start.position());
    }

    #[test]
    fn test_flies_ngon_vertices() {
        let vehicle = SimulatedVehicle::new(VehiclePose::default(), SimulatedVehicleConfig::default()).unwrap();
        let planner = CinematicController::new(CinematicControllerConfig {
            waypoint_generator: NGonGenerator::new(4, 1.0).unwrap().into(),
            ..Default::default()
        })
        .unwrap();
        let mut flight = FlightLoop::new(
            ScriptedDetector::default(),
            planner,
            follower(&vehicle),
            FlightLoopConfig { max_iterations: 4 },
        )
        .unwrap();

        let report = flight.run().unwrap();
        assert_eq!(report.waypoints_reached(), 4);
        // Back at the start after the last vertex
        let pose = vehicle.pose().unwrap();
        assert_relative_eq!(pose.x, 0.0, epsilon = 0.2);
        assert_relative_eq!(pose.y, 0.0, epsilon = 0.2);
    }

    #[test]
    fn test_detector_error_stops_loop() {
        let vehicle = SimulatedVehicle::new(VehiclePose::default(), SimulatedVehicleConfig::default()).unwrap();
        let planner = CinematicController::new(CinematicControllerConfig::default()).unwrap();
        let mut flight =
            FlightLoop::new(FailingDetector, planner, follower(&vehicle), FlightLoopConfig::default()).unwrap();
        assert!(matches!(flight.run(), Err(Error::Detector(_))));
    }

    #[test]
    fn test_counts_frames_with_detections() {
        let vehicle = SimulatedVehicle::new(VehiclePose::default(), SimulatedVehicleConfig::default()).unwrap();
        let planner = CinematicController::new(CinematicControllerConfig::default()).unwrap();
        let person = BoundingBox::new((10.0, 10.0), (20.0, 20.0)).unwrap();
        let detector = ScriptedDetector::new([Some(vec![person]), None, Some(vec![person])]);
        let mut flight =
            FlightLoop::new(detector, planner, follower(&vehicle), FlightLoopConfig { max_iterations: 3 })
                .unwrap();
        let report = flight.run().unwrap();
        assert_eq!(report.frames_with_detections, 2);
        assert_eq!(flight.detector().remaining(), 0);
        assert!(flight.planner().smoothed_bounding_box().is_some());
    }

    #[test]
    fn test_predicted_orbit_uses_vehicle_time() {
        let vehicle = SimulatedVehicle::new(VehiclePose::default(), SimulatedVehicleConfig::default()).unwrap();
        let planner = CinematicController::with_clock(
            CinematicControllerConfig {
                range_model: RangeModel::PinholeHeight {
                    person_height: 1.8,
                    focal_length: 500.0,
                },
                waypoint_generator: NGonGenerator::new(4, 1.0).unwrap().with_look_ahead(4.0).into(),
                person_predictor: Some(PredictorConfig::Linear(LinearParams { capacity: 5 })),
                ..Default::default()
            },
            vehicle.clock(),
        )
        .unwrap();
        // Person 10 m ahead in every frame
        let person = BoundingBox::new((30.0, 90.0), (320.0, 240.0)).unwrap();
        let detector = ScriptedDetector::new(vec![Some(vec![person]); 6]);
        let mut flight =
            FlightLoop::new(detector, planner, follower(&vehicle), FlightLoopConfig { max_iterations: 6 })
                .unwrap();

        let report = flight.run().unwrap();
        assert_eq!(report.waypoints_reached(), 6);
        assert_relative_eq!(vehicle.time().unwrap(), 14.0);

        // Observations carry the simulated time of the pose they were derived from
        let history = flight.planner().person_predictor().unwrap().history();
        let stamps: Vec<f64> = history.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![3.0, 5.0, 7.0, 9.0, 12.0]);

        let pose = vehicle.pose().unwrap();
        assert_relative_eq!(pose.x, 22.0, epsilon = 1e-6);
        assert_relative_eq!(pose.y, 0.0, epsilon = 1e-6);
        for w in flight.planner().cinematic_waypoints() {
            assert!((w.x - pose.x).hypot(w.y - pose.y) <= 1.0 + 1e-6, "waypoint {:?}", w);
        }
    }
}
