//! Arc-length marching along a fitted curve `y = f(x)`.
//!
//! Converts "how far ahead" (a path distance) into "where" by stepping along
//! the curve in fixed x increments and accumulating the chord lengths until the
//! target distance is met. The result always overshoots by less than one chord.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::history::PredictorHistory;
use super::traits::Projection;
use crate::geometry::PersonState;
use crate::{Error, Result};

/// Outcome of a single march.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarchOutcome {
    pub x: f64,
    pub y: f64,
    /// Path length actually covered.
    pub travelled: f64,
    /// `travelled - target`. Non-negative when converged.
    pub overshoot: f64,
    pub steps: usize,
    /// False when the iteration guard tripped or the curve had no value.
    pub converged: bool,
}

/// Fixed-step arc-length marcher.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArcLengthMarcher {
    step_size: f64,
    max_steps: usize,
}

impl ArcLengthMarcher {
    pub fn new(step_size: f64, max_steps: usize) -> Result<Self> {
        if !(step_size.is_finite() && step_size > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "step_size must be positive, got {}",
                step_size
            )));
        }
        if max_steps == 0 {
            return Err(Error::InvalidConfig("max_steps must be at least 1".to_string()));
        }
        Ok(Self {
            step_size,
            max_steps,
        })
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// March from `start` along `curve` until `target` path length is covered.
    ///
    /// # Arguments
    /// * `start` - Starting point, expected to lie on the curve
    /// * `direction` - +1 to step towards larger x, -1 towards smaller x
    /// * `target` - Path length to cover; non-positive targets return `start`
    /// * `curve` - Curve value at x, `None` where the curve is undefined
    pub fn march<F>(&self, start: (f64, f64), direction: f64, target: f64, curve: F) -> MarchOutcome
    where
        F: Fn(f64) -> Option<f64>,
    {
        let (mut x, mut y) = start;
        let mut travelled = 0.0;
        let mut steps = 0;

        if !(target > 0.0) {
            return MarchOutcome {
                x,
                y,
                travelled,
                overshoot: 0.0,
                steps,
                converged: true,
            };
        }

        let dx = self.step_size * direction.signum();
        while travelled < target {
            if steps >= self.max_steps {
                warn!(
                    max_steps = self.max_steps,
                    travelled, target, "arc-length march hit the iteration guard"
                );
                return self.unfinished(x, y, travelled, target, steps);
            }
            let next_x = x + dx;
            let Some(next_y) = curve(next_x) else {
                return self.unfinished(x, y, travelled, target, steps);
            };
            travelled += dx.hypot(next_y - y);
            x = next_x;
            y = next_y;
            steps += 1;
        }

        MarchOutcome {
            x,
            y,
            travelled,
            overshoot: travelled - target,
            steps,
            converged: true,
        }
    }

    fn unfinished(&self, x: f64, y: f64, travelled: f64, target: f64, steps: usize) -> MarchOutcome {
        MarchOutcome {
            x,
            y,
            travelled,
            overshoot: travelled - target,
            steps,
            converged: false,
        }
    }
}

/// Project the newest sample along `curve` at the history's mean speed.
///
/// Marching starts at `(newest.x, curve(newest.x))` and heads the way x last moved.
pub(crate) fn project_along_curve<F>(
    history: &PredictorHistory,
    marcher: &ArcLengthMarcher,
    time_deltas: &[f64],
    curve: F,
) -> Vec<Projection>
where
    F: Fn(f64) -> Option<f64>,
{
    let Some(newest) = history.newest() else {
        return Vec::new();
    };
    let speed = history.mean_speed();
    let direction = history.x_direction();
    let start_x = newest.state.x;
    let start = (start_x, curve(start_x).unwrap_or(newest.state.y));

    time_deltas
        .iter()
        .map(|delta| {
            let target = speed * delta;
            let outcome = marcher.march(start, direction, target, &curve);
            debug!(
                delta,
                target,
                overshoot = outcome.overshoot,
                steps = outcome.steps,
                "marched along fitted curve"
            );
            Projection {
                state: PersonState {
                    x: outcome.x,
                    y: outcome.y,
                    ..newest.state
                },
                overshoot: outcome.overshoot,
                steps: outcome.steps,
                converged: outcome.converged,
            }
        })
        .collect()
}
