//! Polynomial path predictor.
//!
//! Fits `y = f(x)` to the observed positions and walks along the fitted curve at
//! the person's mean speed. Recency weighting multiplies the residual weight of
//! the `i`-th oldest sample by `weight_decay^i`, so a decay above 1 favours the
//! newest observations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::history::PredictorHistory;
use super::linear::linear_projection;
use super::marching::{project_along_curve, ArcLengthMarcher};
use super::traits::{project_degenerate, PersonPredictor, Projection};
use crate::clock::{system_clock, Clock};
use crate::geometry::PersonState;
use crate::internal::numpy::{polyfit, Polynomial};
use crate::{Error, Result};

/// Parameters for [`PolynomialPredictor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolynomialParams {
    pub capacity: usize,
    pub degree: usize,
    pub weight_decay: f64,
    pub step_size: f64,
    pub max_steps: usize,
}

impl Default for PolynomialParams {
    fn default() -> Self {
        Self {
            capacity: 4,
            degree: 2,
            weight_decay: 1.0,
            step_size: 1e-4,
            max_steps: 2_000_000,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PolynomialPredictor {
    history: PredictorHistory,
    degree: usize,
    weight_decay: f64,
    marcher: ArcLengthMarcher,
    fit: Option<Polynomial>,
    clock: Arc<dyn Clock>,
}

impl PolynomialPredictor {
    pub fn new(params: &PolynomialParams) -> Result<Self> {
        Self::with_clock(params, system_clock())
    }

    pub fn with_clock(params: &PolynomialParams, clock: Arc<dyn Clock>) -> Result<Self> {
        if !(params.weight_decay.is_finite() && params.weight_decay > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "weight_decay must be positive, got {}",
                params.weight_decay
            )));
        }
        Ok(Self {
            history: PredictorHistory::new(params.capacity)?,
            degree: params.degree,
            weight_decay: params.weight_decay,
            marcher: ArcLengthMarcher::new(params.step_size, params.max_steps)?,
            fit: None,
            clock,
        })
    }

    #[cfg(test)]
    pub(crate) fn fitted_curve(&self) -> Option<&Polynomial> {
        self.fit.as_ref()
    }

    fn refit(&mut self) {
        self.fit = None;
        if self.history.len() < 2 {
            return;
        }

        let (x, y) = self.history.xy();
        let distinct = count_distinct(&x);
        if distinct < 2 {
            debug!("person history has no x spread, skipping polynomial fit");
            return;
        }
        // Fewer distinct x values than degree + 1 cannot pin the curve down
        let degree = self.degree.min(distinct - 1);
        let weights: Vec<f64> = (0..x.len())
            .map(|i| self.weight_decay.powi(i as i32))
            .collect();

        match polyfit(&x, &y, Some(&weights), degree) {
            Ok(p) => {
                debug!(degree = p.degree(), coefficients = ?p.coefficients(), "fitted person path");
                self.fit = Some(p);
            }
            Err(e) => warn!(error = %e, "polynomial fit failed"),
        }
    }
}

impl PersonPredictor for PolynomialPredictor {
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
            debug!("no polynomial fit available, projecting linearly");
            return Ok(linear_projection(&self.history, self.clock.now(), time_deltas));
        };
        Ok(project_along_curve(
            &self.history,
            &self.marcher,
            time_deltas,
            |x| Some(fit.eval(x)),
        ))
    }

    fn clear(&mut self) {
        self.history.clear();
        self.fit = None;
    }
}

/// Number of distinct values, treating values closer than 1e-9 as equal.
fn count_distinct(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup_by(|a, b| (*a - *b).abs() <= 1e-9);
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use approx::assert_relative_eq;

    fn predictor(params: PolynomialParams) -> PolynomialPredictor {
        PolynomialPredictor::with_clock(&params, Arc::new(ManualClock::new(0.0))).unwrap()
    }

    #[test]
    fn test_invalid_parameters() {
        let bad_decay = PolynomialParams {
            weight_decay: 0.0,
            ..Default::default()
        };
        assert!(PolynomialPredictor::new(&bad_decay).is_err());
        let bad_step = PolynomialParams {
            step_size: 0.0,
            ..Default::default()
        };
        assert!(PolynomialPredictor::new(&bad_step).is_err());
    }

    #[test]
    fn test_empty_and_single_sample() {
        let mut p = predictor(PolynomialParams::default());
        assert!(p.project(&[1.0]).is_err());
        p.add_person_state_at(PersonState::new(1.0, -1.0), 0.0);
        let states = p.predict_next_person_state(&[1.0, 4.0]).unwrap();
        assert_eq!(states, vec![PersonState::new(1.0, -1.0); 2]);
    }

    #[test]
    fn test_marches_along_parabola() {
        let mut p = predictor(PolynomialParams::default());
        p.add_person_state_at(PersonState::new(-1.0, 1.0), 0.0);
        p.add_person_state_at(PersonState::new(0.0, 0.0), 1.0);
        p.add_person_state_at(PersonState::new(1.0, 1.0), 2.0);

        let fit = p.fitted_curve().unwrap();
        assert_relative_eq!(fit.coefficients()[2], 1.0, epsilon = 1e-9);

        let projections = p.project(&[0.5, 1.0, 2.0]).unwrap();
        let mut previous_x = 1.0;
        for projection in &projections {
            let s = projection.state;
            assert!(projection.converged);
            assert!(projection.overshoot >= 0.0 && projection.overshoot < 1e-2);
            assert!(s.x > previous_x);
            assert_relative_eq!(s.y, s.x * s.x, epsilon = 1e-6);
            previous_x = s.x;
        }
    }

    #[test]
    fn test_arc_length_matches_speed() {
        // Straight line y = 2x walked at speed sqrt(5)
        let mut p = predictor(PolynomialParams::default());
        for i in 0..3 {
            let x = i as f64;
            p.add_person_state_at(PersonState::new(x, 2.0 * x), x);
        }
        let projection = p.project(&[2.0]).unwrap()[0];
        assert_relative_eq!(projection.state.x, 4.0, epsilon = 1e-3);
        assert_relative_eq!(projection.state.y, 8.0, epsilon = 1e-3);
    }

    #[test]
    fn test_follows_negative_x_travel() {
        let mut p = predictor(PolynomialParams::default());
        p.add_person_state_at(PersonState::new(2.0, 0.0), 0.0);
        p.add_person_state_at(PersonState::new(1.0, 0.0), 1.0);
        p.add_person_state_at(PersonState::new(0.0, 0.0), 2.0);
        let state = p.predict_next_person_state(&[1.0]).unwrap()[0];
        assert_relative_eq!(state.x, -1.0, epsilon = 1e-3);
        assert_relative_eq!(state.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degree_reduced_to_distinct_samples() {
        let mut p = predictor(PolynomialParams {
            degree: 3,
            ..Default::default()
        });
        p.add_person_state_at(PersonState::new(0.0, 0.0), 0.0);
        p.add_person_state_at(PersonState::new(1.0, 1.0), 1.0);
        assert_eq!(p.fitted_curve().unwrap().degree(), 1);
    }

    #[test]
    fn test_vertical_path_falls_back_to_linear() {
        let clock = ManualClock::new(0.0);
        let mut p =
            PolynomialPredictor::with_clock(&PolynomialParams::default(), Arc::new(clock.clone())).unwrap();
        p.add_person_state_at(PersonState::new(1.0, 0.0), 0.0);
        p.add_person_state_at(PersonState::new(1.0, 1.0), 1.0);
        clock.set(1.0);
        assert!(p.fitted_curve().is_none());
        let state = p.predict_next_person_state(&[2.0]).unwrap()[0];
        assert_relative_eq!(state.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(state.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_recency_weighting_favours_newest() {
        let points = [(0.0, 0.0), (1.0, 0.0), (2.0, 1.0), (3.0, 3.0)];
        let slope_with = |decay: f64| {
            let mut p = predictor(PolynomialParams {
                degree: 1,
                weight_decay: decay,
                ..Default::default()
            });
            for (i, (x, y)) in points.iter().enumerate() {
                p.add_person_state_at(PersonState::new(*x, *y), i as f64);
            }
            p.fitted_curve().unwrap().coefficients()[1]
        };
        let uniform = slope_with(1.0);
        let recent = slope_with(100.0);
        assert!(recent > uniform, "recent {} uniform {}", recent, uniform);
        assert_relative_eq!(recent, 2.0, epsilon = 0.1);
    }

    #[test]
    fn test_count_distinct() {
        assert_eq!(count_distinct(&[1.0, 1.0, 2.0, 1.0 + 1e-12]), 2);
        assert_eq!(count_distinct(&[]), 0);
    }
}
