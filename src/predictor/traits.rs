//! Person predictor traits.

use tracing::warn;

use super::history::PredictorHistory;
use crate::geometry::PersonState;
use crate::{Error, Result};

/// One projected person position with marching diagnostics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub state: PersonState,
    /// Path length covered beyond the requested distance. Always 0 for linear projection.
    pub overshoot: f64,
    /// Marching steps taken (0 for closed-form projections).
    pub steps: usize,
    /// False when marching stopped before covering the requested distance.
    pub converged: bool,
}

impl Projection {
    /// A closed-form projection with no marching involved.
    pub fn exact(state: PersonState) -> Self {
        Self {
            state,
            overshoot: 0.0,
            steps: 0,
            converged: true,
        }
    }
}

/// Trait for person motion predictors.
///
/// A predictor keeps a bounded history of observed person positions and projects
/// where the person will be after each requested time delta.
pub trait PersonPredictor: Send + Sync {
    /// Record an observation timestamped with the predictor's clock.
    fn add_person_state(&mut self, state: PersonState);

    /// Record an observation with an explicit timestamp (seconds).
    fn add_person_state_at(&mut self, state: PersonState, timestamp: f64);

    /// Observation window, oldest first.
    fn history(&self) -> &PredictorHistory;

    /// Project the person forward, one result per delta, in input order.
    ///
    /// # Errors
    /// `Error::InsufficientHistory` when no observation has been recorded.
    fn project(&self, time_deltas: &[f64]) -> Result<Vec<Projection>>;

    /// Projected positions without diagnostics.
    fn predict_next_person_state(&self, time_deltas: &[f64]) -> Result<Vec<PersonState>> {
        Ok(self
            .project(time_deltas)?
            .into_iter()
            .map(|p| p.state)
            .collect())
    }

    /// Forget all observations.
    fn clear(&mut self);

    fn len(&self) -> usize {
        self.history().len()
    }

    fn is_empty(&self) -> bool {
        self.history().is_empty()
    }

    fn capacity(&self) -> usize {
        self.history().capacity()
    }
}

/// Shared handling of histories too short to fit anything.
///
/// Returns `Some` with the final answer for zero or one samples, `None` when the
/// caller has enough history to run its own model.
pub(crate) fn project_degenerate(
    history: &PredictorHistory,
    time_deltas: &[f64],
) -> Option<Result<Vec<Projection>>> {
    match history.len() {
        0 => Some(Err(Error::InsufficientHistory)),
        1 => {
            warn!("single person state in history, assuming a stationary person");
            let only = history.newest()?.state;
            Some(Ok(time_deltas.iter().map(|_| Projection::exact(only)).collect()))
        }
        _ => None,
    }
}
