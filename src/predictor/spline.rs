//! Cubic spline path predictor.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::history::PredictorHistory;
use super::linear::linear_projection;
use super::marching::{project_along_curve, ArcLengthMarcher};
use super::traits::{project_degenerate, PersonPredictor, Projection};
use crate::clock::{system_clock, Clock};
use crate::geometry::PersonState;
use crate::internal::scipy::{BoundaryCondition, CubicSpline};
use crate::Result;

/// Parameters for [`SplinePredictor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineParams {
    pub capacity: usize,
    pub boundary_condition: BoundaryCondition,
    /// Continue the end pieces past the observed x range.
    pub extrapolate: bool,
    pub step_size: f64,
    pub max_steps: usize,
}

impl Default for SplineParams {
    fn default() -> Self {
        Self {
            capacity: 4,
            boundary_condition: BoundaryCondition::NotAKnot,
            extrapolate: true,
            step_size: 0.01,
            max_steps: 100_000,
        }
    }
}

/// Fits a cubic spline `y = f(x)` through the observed positions and marches along it.
///
/// Knots are the observations sorted by x; observations sharing an x are merged
/// into one knot at their mean y. Without extrapolation marching stops at the
/// last knot and the projection reports `converged == false`.
#[derive(Clone, Debug)]
pub struct SplinePredictor {
    history: PredictorHistory,
    boundary_condition: BoundaryCondition,
    extrapolate: bool,
    marcher: ArcLengthMarcher,
    fit: Option<CubicSpline>,
    clock: Arc<dyn Clock>,
}

impl SplinePredictor {
    pub fn new(params: &SplineParams) -> Result<Self> {
        Self::with_clock(params, system_clock())
    }

    pub fn with_clock(params: &SplineParams, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            history: PredictorHistory::new(params.capacity)?,
            boundary_condition: params.boundary_condition,
            extrapolate: params.extrapolate,
            marcher: ArcLengthMarcher::new(params.step_size, params.max_steps)?,
            fit: None,
            clock,
        })
    }

    #[cfg(test)]
    pub(crate) fn fitted_curve(&self) -> Option<&CubicSpline> {
        self.fit.as_ref()
    }

    fn refit(&mut self) {
        self.fit = None;
        let (x, y) = sorted_knots(&self.history);
        if x.len() < 2 {
            if self.history.len() >= 2 {
                debug!("person history has no x spread, skipping spline fit");
            }
            return;
        }
        match CubicSpline::new(&x, &y, self.boundary_condition, self.extrapolate) {
            Ok(s) => {
                debug!(knots = s.knots().len(), "fitted person path spline");
                self.fit = Some(s);
            }
            Err(e) => warn!(error = %e, "spline fit failed"),
        }
    }
}

impl PersonPredictor for SplinePredictor {
    fn add_person_state(&mut self, state: PersonState) {
        let now = self.clock.now();
        self.add_person_state_at(state, now);
    }

    fn add_person_state_at(&mut self, state: PersonState, timestamp: f64) {
        self.history.push(state, timestamp);
        self.refit();
    }

    fn history(&self) -> &PredictorHistory {
        &self.history
    }

    fn project(&self, time_deltas: &[f64]) -> Result<Vec<Projection>> {
        if let Some(result) = project_degenerate(&self.history, time_deltas) {
            return result;
        }
        let Some(fit) = &self.fit else {
            debug!("no spline fit available, projecting linearly");
            return Ok(linear_projection(&self.history, self.clock.now(), time_deltas));
        };
        Ok(project_along_curve(
            &self.history,
            &self.marcher,
            time_deltas,
            |x| fit.eval(x),
        ))
    }

    fn clear(&mut self) {
        self.history.clear();
        self.fit = None;
    }
}

/// Observations sorted by x with duplicate x values merged at their mean y.
fn sorted_knots(history: &PredictorHistory) -> (Vec<f64>, Vec<f64>) {
    let mut points: Vec<(f64, f64)> = history.iter().map(|s| (s.state.x, s.state.y)).collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut xs: Vec<f64> = Vec::with_capacity(points.len());
    let mut ys: Vec<f64> = Vec::with_capacity(points.len());
    let mut counts: Vec<f64> = Vec::with_capacity(points.len());
    for (x, y) in points {
        match xs.last() {
            Some(&last) if (x - last).abs() <= 1e-9 => {
                let i = ys.len() - 1;
                ys[i] = (ys[i] * counts[i] + y) / (counts[i] + 1.0);
                counts[i] += 1.0;
            }
            _ => {
                xs.push(x);
                ys.push(y);
                counts.push(1.0);
            }
        }
    }
    (xs, ys)
}
