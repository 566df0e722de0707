//! Cinematic waypoint planning.
//!
//! `CinematicController` owns the single-person tracking state, the last known
//! vehicle pose, an optional person predictor and the active waypoint generator.
//! It caches the generated waypoints and walks through them as the vehicle
//! arrives at each one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{system_clock, Clock};
use crate::geometry::{BoundingBox, PersonState, RangeModel, VehiclePose, Waypoint};
use crate::predictor::{PersonPredictor, PredictorConfig, PredictorEnum};
use crate::tracking::{BoundingBoxTracker, LostTargetPolicy};
use crate::waypoint::WaypointGeneratorEnum;
use crate::{Error, Result};

/// Configuration for [`CinematicController`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CinematicControllerConfig {
    /// Bounding box smoothing inertia, in (0, 1).
    pub bb_filter_gamma: f64,
    /// Weight of box dimensions vs centroid when matching candidates, in [0, 1].
    pub bb_match_dimension_importance: f64,
    /// Per-axis distance under which a waypoint counts as reached.
    pub margin: f64,
    pub lost_target_policy: LostTargetPolicy,
    pub range_model: RangeModel,
    pub waypoint_generator: WaypointGeneratorEnum,
    pub person_predictor: Option<PredictorConfig>,
}

impl Default for CinematicControllerConfig {
    fn default() -> Self {
        Self {
            bb_filter_gamma: 0.9,
            bb_match_dimension_importance: 0.5,
            margin: 0.25,
            lost_target_policy: LostTargetPolicy::Freeze,
            range_model: RangeModel::default(),
            waypoint_generator: WaypointGeneratorEnum::default(),
            person_predictor: None,
        }
    }
}

impl CinematicControllerConfig {
    pub fn validate(&self) -> Result<()> {
        BoundingBoxTracker::new(
            self.bb_filter_gamma,
            self.bb_match_dimension_importance,
            self.lost_target_policy,
        )?;
        if !(self.margin.is_finite() && self.margin > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "margin must be positive, got {}",
                self.margin
            )));
        }
        self.range_model.validate()?;
        self.waypoint_generator.validate()?;
        if let Some(predictor) = &self.person_predictor {
            predictor.create()?;
        }
        Ok(())
    }
}

/// Generates and caches cinematic waypoints for one tracked person.
#[derive(Clone, Debug)]
pub struct CinematicController {
    tracker: BoundingBoxTracker,
    latest_pose: Option<VehiclePose>,
    /// Cached queue, head first. Empty means nothing is cached.
    waypoints: Vec<Waypoint>,
    margin: f64,
    range_model: RangeModel,
    generator: WaypointGeneratorEnum,
    predictor: Option<PredictorEnum>,
}

impl CinematicController {
    /// Create a controller whose predictor (if any) timestamps with the system clock.
    pub fn new(config: CinematicControllerConfig) -> Result<Self> {
        Self::with_clock(config, system_clock())
    }

    /// Create a controller whose predictor timestamps observations with `clock`.
    pub fn with_clock(config: CinematicControllerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let tracker = BoundingBoxTracker::new(
            config.bb_filter_gamma,
            config.bb_match_dimension_importance,
            config.lost_target_policy,
        )?;
        let predictor = config
            .person_predictor
            .as_ref()
            .map(|p| p.create_with_clock(clock))
            .transpose()?;

        Ok(Self {
            tracker,
            latest_pose: None,
            waypoints: Vec::new(),
            margin: config.margin,
            range_model: config.range_model,
            generator: config.waypoint_generator,
            predictor,
        })
    }

    /// Feed one frame of detections.
    ///
    /// The best match is smoothed into the tracked box. When a predictor is
    /// attached and the vehicle pose is known, the person position derived from
    /// the smoothed box is added to its history. Under the reset policy a frame
    /// without detections also drops the cached waypoints.
    pub fn update_latest_bbs(&mut self, bounding_boxes: Option<&[BoundingBox]>) {
        let has_candidates = bounding_boxes.is_some_and(|b| !b.is_empty());
        let updated = self.tracker.update(bounding_boxes);

        if !has_candidates {
            if self.tracker.policy() == LostTargetPolicy::Reset && !self.waypoints.is_empty() {
                debug!("target lost, dropping cached waypoints");
                self.waypoints.clear();
            }
            return;
        }
        if !updated {
            return;
        }

        let Some(predictor) = self.predictor.as_mut() else {
            return;
        };
        let (Some(pose), Some(smoothed)) = (self.latest_pose.as_ref(), self.tracker.smoothed()) else {
            debug!("vehicle pose unknown, person state not recorded");
            return;
        };
        let person = PersonState::from_bounding_box(pose, smoothed, &self.range_model);
        predictor.add_person_state(person);
    }

    /// Best matching candidate for the currently tracked box (largest when nothing is tracked).
    pub fn identify_best_bb_match(&self, bounding_boxes: &[BoundingBox]) -> Option<BoundingBox> {
        self.tracker.identify_best_bb_match(bounding_boxes)
    }

    pub fn update_latest_drone_state(&mut self, pose: VehiclePose) {
        self.latest_pose = Some(pose);
    }

    /// Replace the cached waypoint queue. An empty queue is regenerated on the next call.
    pub fn update_cinematic_waypoints(&mut self, waypoints: Vec<Waypoint>) {
        self.waypoints = waypoints;
    }

    /// Current waypoint queue, advancing or regenerating it first.
    ///
    /// With nothing cached the generator is asked for a new queue. Otherwise the
    /// head is dropped once the vehicle is within `margin` of it on x, y and z,
    /// and an exhausted queue is regenerated right away.
    ///
    /// Before the vehicle pose is known this returns a single default pose and
    /// caches nothing.
    pub fn generate_waypoints(&mut self) -> Vec<Waypoint> {
        let Some(pose) = self.latest_pose else {
            warn!("waypoints requested before the vehicle pose is known, hovering");
            return vec![VehiclePose::default()];
        };
        if self.tracker.smoothed().is_none() {
            warn!("waypoints requested without a tracked bounding box");
        }

        if self.waypoints.is_empty() {
            self.regenerate(&pose);
        } else if self.reached(&self.waypoints[0], &pose) {
            self.waypoints.remove(0);
            debug!(remaining = self.waypoints.len(), "waypoint reached");
            if self.waypoints.is_empty() {
                self.regenerate(&pose);
            }
        }
        self.waypoints.clone()
    }

    fn regenerate(&mut self, pose: &VehiclePose) {
        let predictor = self.predictor.as_ref().map(|p| p as &dyn PersonPredictor);
        self.waypoints = self
            .generator
            .generate(self.tracker.smoothed(), pose, predictor);
        debug!(count = self.waypoints.len(), "generated waypoints");
    }

    fn reached(&self, waypoint: &Waypoint, pose: &VehiclePose) -> bool {
        (pose.x - waypoint.x).abs() < self.margin
            && (pose.y - waypoint.y).abs() < self.margin
            && (pose.z - waypoint.z).abs() < self.margin
    }

    /// Swap the active generator. Cached waypoints are kept.
    pub fn set_waypoint_generator(&mut self, generator: impl Into<WaypointGeneratorEnum>) {
        self.generator = generator.into();
    }

    pub fn set_person_predictor(&mut self, predictor: Option<PredictorEnum>) {
        self.predictor = predictor;
    }

    pub fn person_predictor(&self) -> Option<&PredictorEnum> {
        self.predictor.as_ref()
    }

    pub fn waypoint_generator(&self) -> &WaypointGeneratorEnum {
        &self.generator
    }

    pub fn latest_bounding_box(&self) -> Option<&BoundingBox> {
        self.tracker.latest()
    }

    pub fn smoothed_bounding_box(&self) -> Option<&BoundingBox> {
        self.tracker.smoothed()
    }

    pub fn latest_drone_state(&self) -> Option<&VehiclePose> {
        self.latest_pose.as_ref()
    }

    /// Cached waypoints without advancing the queue.
    pub fn cinematic_waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::predictor::LinearParams;
    use crate::waypoint::{FixedTargetGenerator, NGonGenerator, YawOnlyGenerator};
    use approx::assert_relative_eq;

    fn bb(w: f64, h: f64, x: f64, y: f64) -> BoundingBox {
        BoundingBox::new((w, h), (x, y)).unwrap()
    }

    fn ngon_controller(policy: LostTargetPolicy) -> CinematicController {
        CinematicController::new(CinematicControllerConfig {
            lost_target_policy: policy,
            waypoint_generator: NGonGenerator::new(4, 1.0).unwrap().into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_config() {
        let bad_gamma = CinematicControllerConfig {
            bb_filter_gamma: 1.5,
            ..Default::default()
        };
        assert!(CinematicController::new(bad_gamma).is_err());
        let bad_margin = CinematicControllerConfig {
            margin: 0.0,
            ..Default::default()
        };
        assert!(CinematicController::new(bad_margin).is_err());
        let bad_predictor = CinematicControllerConfig {
            person_predictor: Some(PredictorConfig::Linear(LinearParams { capacity: 0 })),
            ..Default::default()
        };
        assert!(CinematicController::new(bad_predictor).is_err());
    }

    #[test]
    fn test_hover_without_any_box() {
        let mut c = CinematicController::new(CinematicControllerConfig::default()).unwrap();
        let pose = VehiclePose::level(1.0, 2.0, 3.0, 0.5);
        c.update_latest_drone_state(pose);
        c.update_latest_bbs(None);
        assert_eq!(c.generate_waypoints(), vec![pose]);
    }

    #[test]
    fn test_unknown_pose_returns_default_uncached() {
        let mut c = CinematicController::new(CinematicControllerConfig::default()).unwrap();
        assert_eq!(c.generate_waypoints(), vec![VehiclePose::default()]);
        assert!(c.cinematic_waypoints().is_empty());
    }

    #[test]
    fn test_caches_until_reached() {
        let mut c = ngon_controller(LostTargetPolicy::Freeze);
        c.update_latest_drone_state(VehiclePose::default());
        let first = c.generate_waypoints();
        assert_eq!(first.len(), 4);

        // Not there yet: same queue
        assert_eq!(c.generate_waypoints(), first);

        // Arrive at the head (1, -1, 0)
        c.update_latest_drone_state(VehiclePose::level(1.1, -0.9, 0.1, 0.0));
        let advanced = c.generate_waypoints();
        assert_eq!(advanced, first[1..].to_vec());
    }

    #[test]
    fn test_arrival_needs_every_axis() {
        let mut c = ngon_controller(LostTargetPolicy::Freeze);
        c.update_latest_drone_state(VehiclePose::default());
        let first = c.generate_waypoints();

        // Far below the head on x only counts as not arrived
        c.update_latest_drone_state(VehiclePose::level(-5.0, -1.0, 0.0, 0.0));
        assert_eq!(c.generate_waypoints(), first);
    }

    #[test]
    fn test_regenerates_when_exhausted() {
        let mut c = ngon_controller(LostTargetPolicy::Freeze);
        c.update_latest_drone_state(VehiclePose::default());
        c.generate_waypoints();

        let last = VehiclePose::level(5.0, 5.0, 0.0, 0.0);
        c.update_cinematic_waypoints(vec![last]);
        c.update_latest_drone_state(last);
        let regenerated = c.generate_waypoints();
        assert_eq!(regenerated.len(), 4);
        // New square built around the new pose
        assert_relative_eq!(regenerated[3].x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(regenerated[3].y, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_freeze_keeps_box_and_queue() {
        let mut c = CinematicController::new(CinematicControllerConfig {
            waypoint_generator: FixedTargetGenerator::new(bb(10.0, 10.0, 0.0, 0.0)).into(),
            ..Default::default()
        })
        .unwrap();
        c.update_latest_drone_state(VehiclePose::default());
        c.update_latest_bbs(Some(&[bb(20.0, 20.0, 0.0, 0.0)]));
        let tracked = c.generate_waypoints();
        assert!(tracked[0].x < 0.0);

        c.update_latest_bbs(None);
        assert_eq!(c.smoothed_bounding_box(), Some(&bb(20.0, 20.0, 0.0, 0.0)));
        assert_eq!(c.generate_waypoints(), tracked);
    }

    #[test]
    fn test_reset_drops_box_and_queue() {
        let mut c = CinematicController::new(CinematicControllerConfig {
            lost_target_policy: LostTargetPolicy::Reset,
            waypoint_generator: FixedTargetGenerator::new(bb(10.0, 10.0, 0.0, 0.0)).into(),
            ..Default::default()
        })
        .unwrap();
        let pose = VehiclePose::default();
        c.update_latest_drone_state(pose);
        c.update_latest_bbs(Some(&[bb(20.0, 20.0, 0.0, 0.0)]));
        c.generate_waypoints();

        c.update_latest_bbs(Some(&[]));
        assert!(c.latest_bounding_box().is_none());
        assert!(c.smoothed_bounding_box().is_none());
        assert!(c.cinematic_waypoints().is_empty());
        assert_eq!(c.generate_waypoints(), vec![pose]);
    }

    #[test]
    fn test_setters_do_not_touch_queue() {
        let mut c = ngon_controller(LostTargetPolicy::Freeze);
        c.update_latest_drone_state(VehiclePose::default());
        let first = c.generate_waypoints();
        c.set_waypoint_generator(YawOnlyGenerator::default());
        c.update_latest_bbs(Some(&[bb(10.0, 10.0, 100.0, 100.0)]));
        assert_eq!(c.cinematic_waypoints(), first.as_slice());
        assert!(matches!(c.waypoint_generator(), WaypointGeneratorEnum::YawOnly(_)));
    }

    #[test]
    fn test_predictor_fed_from_smoothed_box() {
        let clock = ManualClock::new(0.0);
        let mut c = CinematicController::with_clock(
            CinematicControllerConfig {
                person_predictor: Some(PredictorConfig::Linear(LinearParams::default())),
                ..Default::default()
            },
            Arc::new(clock.clone()),
        )
        .unwrap();

        // No pose yet: nothing recorded
        c.update_latest_bbs(Some(&[bb(1.0, 1.0, 0.0, 0.0)]));
        assert!(c.person_predictor().unwrap().is_empty());

        c.update_latest_drone_state(VehiclePose::level(2.0, 0.0, 1.0, 0.0));
        c.update_latest_bbs(Some(&[bb(1.0, 1.0, 0.0, 0.0)]));
        clock.advance(1.0);
        c.update_latest_bbs(Some(&[bb(1.0, 1.0, 0.0, 0.0)]));

        let predictor = c.person_predictor().unwrap();
        assert_eq!(predictor.len(), 2);
        // Unit area box is one unit ahead along +x
        let newest = predictor.history().newest().unwrap();
        assert_relative_eq!(newest.state.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(newest.timestamp, 1.0);
    }

    #[test]
    fn test_identify_best_bb_match_delegates() {
        let mut c = CinematicController::new(CinematicControllerConfig::default()).unwrap();
        let small = bb(5.0, 5.0, 0.0, 0.0);
        let large = bb(50.0, 50.0, 100.0, 100.0);
        assert_eq!(c.identify_best_bb_match(&[small, large]), Some(large));
        c.update_latest_bbs(Some(&[small]));
        assert_eq!(c.identify_best_bb_match(&[large, small]), Some(small));
    }
}
