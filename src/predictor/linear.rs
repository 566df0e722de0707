//! Constant-velocity person predictor.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::history::PredictorHistory;
use super::traits::{project_degenerate, PersonPredictor, Projection};
use crate::clock::{system_clock, Clock};
use crate::geometry::PersonState;
use crate::Result;

/// Parameters for [`LinearPredictor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearParams {
    pub capacity: usize,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self { capacity: 5 }
    }
}

/// Projects the person along the average velocity between the oldest and newest sample.
#[derive(Clone, Debug)]
pub struct LinearPredictor {
    history: PredictorHistory,
    clock: Arc<dyn Clock>,
}

impl LinearPredictor {
    /// Create a linear predictor timestamped by the system clock.
    pub fn new(params: &LinearParams) -> Result<Self> {
        Self::with_clock(params, system_clock())
    }

    pub fn with_clock(params: &LinearParams, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            history: PredictorHistory::new(params.capacity)?,
            clock,
        })
    }
}

impl PersonPredictor for LinearPredictor {
    fn add_person_state(&mut self, state: PersonState) {
        let now = self.clock.now();
        self.history.push(state, now);
    }

    fn add_person_state_at(&mut self, state: PersonState, timestamp: f64) {
        self.history.push(state, timestamp);
    }

    fn history(&self) -> &PredictorHistory {
        &self.history
    }

    fn project(&self, time_deltas: &[f64]) -> Result<Vec<Projection>> {
        if let Some(result) = project_degenerate(&self.history, time_deltas) {
            return result;
        }
        Ok(linear_projection(&self.history, self.clock.now(), time_deltas))
    }

    fn clear(&mut self) {
        self.history.clear();
    }
}

/// Constant-velocity projection of the newest sample.
///
/// The velocity is `(newest - oldest) / (newest.t - oldest.t)`, zero when no time
/// elapsed between them. Each delta is measured from `now`, so the person moves
/// for `delta + (now - newest.t)` seconds past the newest sample.
pub(crate) fn linear_projection(
    history: &PredictorHistory,
    now: f64,
    time_deltas: &[f64],
) -> Vec<Projection> {
    let (Some(oldest), Some(newest)) = (history.oldest(), history.newest()) else {
        return Vec::new();
    };

    let dt = newest.timestamp - oldest.timestamp;
    let (vx, vy) = if dt > 0.0 {
        (
            (newest.state.x - oldest.state.x) / dt,
            (newest.state.y - oldest.state.y) / dt,
        )
    } else {
        warn!(dt, "person history spans no time, assuming zero velocity");
        (0.0, 0.0)
    };

    let since_newest = now - newest.timestamp;
    time_deltas
        .iter()
        .map(|delta| {
            let elapsed = delta + since_newest;
            let state = PersonState {
                x: newest.state.x + vx * elapsed,
                y: newest.state.y + vy * elapsed,
                ..newest.state
            };
            Projection::exact(state)
        })
        .collect()
}
