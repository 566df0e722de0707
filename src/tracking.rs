//! Single-person bounding box tracking and smoothing.
//!
//! Each frame the detector may report several candidate boxes. The tracker keeps
//! one person: it picks the candidate closest to the box it already follows (or
//! the largest box when it follows nothing yet) and low-pass filters it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::BoundingBox;
use crate::utils::{distance2, in_open_range};
use crate::{Error, Result};

/// What happens to the tracked box when a frame has no detections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LostTargetPolicy {
    /// Keep the latest and smoothed boxes (and any planned waypoints) unchanged.
    #[default]
    Freeze,
    /// Forget the tracked box; planning falls back to hovering.
    Reset,
}

/// Tracks one bounding box across frames.
#[derive(Clone, Debug)]
pub struct BoundingBoxTracker {
    latest: Option<BoundingBox>,
    smoothed: Option<BoundingBox>,
    /// Filter inertia in (0, 1). Larger keeps more of the previous smoothed box.
    gamma: f64,
    /// Weight of the dimension error versus the centroid error, in [0, 1].
    dimension_importance: f64,
    policy: LostTargetPolicy,
}

impl BoundingBoxTracker {
    /// Create a tracker.
    ///
    /// # Arguments
    /// * `gamma` - Smoothing inertia, strictly between 0 and 1
    /// * `dimension_importance` - Matching weight of dimensions vs centroid, in [0, 1]
    /// * `policy` - Behavior when a frame has no detections
    pub fn new(gamma: f64, dimension_importance: f64, policy: LostTargetPolicy) -> Result<Self> {
        if !in_open_range(gamma, 0.0, 1.0) {
            return Err(Error::InvalidConfig(format!(
                "bb_filter_gamma must be in (0, 1), got {}",
                gamma
            )));
        }
        if !(0.0..=1.0).contains(&dimension_importance) {
            return Err(Error::InvalidConfig(format!(
                "bb_match_dimension_importance must be in [0, 1], got {}",
                dimension_importance
            )));
        }
        Ok(Self {
            latest: None,
            smoothed: None,
            gamma,
            dimension_importance,
            policy,
        })
    }

    pub fn latest(&self) -> Option<&BoundingBox> {
        self.latest.as_ref()
    }

    pub fn smoothed(&self) -> Option<&BoundingBox> {
        self.smoothed.as_ref()
    }

    pub fn policy(&self) -> LostTargetPolicy {
        self.policy
    }

    /// Feed one frame of candidate boxes.
    ///
    /// Returns `true` when a candidate was selected and the smoothed box changed.
    /// An empty or absent frame is handled according to the lost-target policy.
    pub fn update(&mut self, candidates: Option<&[BoundingBox]>) -> bool {
        let candidates = match candidates {
            Some(c) if !c.is_empty() => c,
            _ => {
                debug!(policy = ?self.policy, "no bounding boxes detected");
                if self.policy == LostTargetPolicy::Reset {
                    self.reset();
                }
                return false;
            }
        };

        let Some(best) = self.identify_best_bb_match(candidates) else {
            return false;
        };
        self.latest = Some(best);
        self.smoothed = Some(match self.smoothed {
            None => best,
            Some(previous) => low_pass_filter(&previous, &best, self.gamma),
        });
        true
    }

    /// Forget the tracked box.
    pub fn reset(&mut self) {
        self.latest = None;
        self.smoothed = None;
    }

    /// Pick the candidate that best matches the currently tracked box.
    ///
    /// Without a tracked box the largest candidate wins. Otherwise the error is
    /// `w * |dims - smoothed dims| + (1 - w) * |centroid - smoothed centroid|` and
    /// the lowest error wins. Ties keep the first candidate.
    pub fn identify_best_bb_match(&self, candidates: &[BoundingBox]) -> Option<BoundingBox> {
        let Some(smoothed) = self.smoothed else {
            return identify_largest_bb(candidates);
        };
        let centroid_importance = 1.0 - self.dimension_importance;

        let mut best: Option<BoundingBox> = None;
        let mut min_error = f64::INFINITY;
        for candidate in candidates {
            let dimension_error = distance2(candidate.dimensions(), smoothed.dimensions());
            let centroid_error = distance2(candidate.centroid(), smoothed.centroid());
            let error =
                self.dimension_importance * dimension_error + centroid_importance * centroid_error;
            if error < min_error {
                min_error = error;
                best = Some(*candidate);
            }
        }
        best
    }
}

/// Largest-area candidate. Ties keep the first one.
pub fn identify_largest_bb(candidates: &[BoundingBox]) -> Option<BoundingBox> {
    let mut largest: Option<BoundingBox> = None;
    let mut largest_area = f64::NEG_INFINITY;
    for candidate in candidates {
        let area = candidate.area();
        if area > largest_area {
            largest_area = area;
            largest = Some(*candidate);
        }
    }
    largest
}

/// Exponential smoothing applied independently to width, height, x and y:
/// `gamma * smoothed + (1 - gamma) * latest`.
pub fn low_pass_filter(smoothed: &BoundingBox, latest: &BoundingBox, gamma: f64) -> BoundingBox {
    let blend = |old: f64, new: f64| old * gamma + new * (1.0 - gamma);
    let (sw, sh) = smoothed.dimensions();
    let (lw, lh) = latest.dimensions();
    let (sx, sy) = smoothed.centroid();
    let (lx, ly) = latest.centroid();

    // Convex combination of valid boxes stays valid
    BoundingBox::new((blend(sw, lw), blend(sh, lh)), (blend(sx, lx), blend(sy, ly)))
        .unwrap_or(*latest)
}
