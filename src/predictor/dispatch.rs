//! Enum-based predictor dispatch.
//!
//! `PredictorEnum` wraps every predictor variant so the controller can own one
//! without a `Box<dyn PersonPredictor>`. `PredictorConfig` is the serializable
//! description a predictor is built from.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::history::PredictorHistory;
use super::linear::{LinearParams, LinearPredictor};
use super::polynomial::{PolynomialParams, PolynomialPredictor};
use super::spline::{SplineParams, SplinePredictor};
use super::traits::{PersonPredictor, Projection};
use crate::clock::{system_clock, Clock};
use crate::geometry::PersonState;
use crate::Result;

/// Enum-based predictor for static dispatch.
#[derive(Clone, Debug)]
pub enum PredictorEnum {
    Linear(LinearPredictor),
    Polynomial(PolynomialPredictor),
    Spline(SplinePredictor),
}

impl PredictorEnum {
    #[inline(always)]
    pub fn add_person_state(&mut self, state: PersonState) {
        match self {
            PredictorEnum::Linear(p) => p.add_person_state(state),
            PredictorEnum::Polynomial(p) => p.add_person_state(state),
            PredictorEnum::Spline(p) => p.add_person_state(state),
        }
    }

    #[inline(always)]
    pub fn add_person_state_at(&mut self, state: PersonState, timestamp: f64) {
        match self {
            PredictorEnum::Linear(p) => p.add_person_state_at(state, timestamp),
            PredictorEnum::Polynomial(p) => p.add_person_state_at(state, timestamp),
            PredictorEnum::Spline(p) => p.add_person_state_at(state, timestamp),
        }
    }

    #[inline(always)]
    pub fn history(&self) -> &PredictorHistory {
        match self {
            PredictorEnum::Linear(p) => p.history(),
            PredictorEnum::Polynomial(p) => p.history(),
            PredictorEnum::Spline(p) => p.history(),
        }
    }

    #[inline(always)]
    pub fn project(&self, time_deltas: &[f64]) -> Result<Vec<Projection>> {
        match self {
            PredictorEnum::Linear(p) => p.project(time_deltas),
            PredictorEnum::Polynomial(p) => p.project(time_deltas),
            PredictorEnum::Spline(p) => p.project(time_deltas),
        }
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        match self {
            PredictorEnum::Linear(p) => p.clear(),
            PredictorEnum::Polynomial(p) => p.clear(),
            PredictorEnum::Spline(p) => p.clear(),
        }
    }
}

impl PersonPredictor for PredictorEnum {
    #[inline(always)]
    fn add_person_state(&mut self, state: PersonState) {
        PredictorEnum::add_person_state(self, state)
    }

    #[inline(always)]
    fn add_person_state_at(&mut self, state: PersonState, timestamp: f64) {
        PredictorEnum::add_person_state_at(self, state, timestamp)
    }

    #[inline(always)]
    fn history(&self) -> &PredictorHistory {
        PredictorEnum::history(self)
    }

    #[inline(always)]
    fn project(&self, time_deltas: &[f64]) -> Result<Vec<Projection>> {
        PredictorEnum::project(self, time_deltas)
    }

    #[inline(always)]
    fn clear(&mut self) {
        PredictorEnum::clear(self)
    }
}

/// Serializable predictor description.
///
/// Tagged by `kind`; omitted parameters take their defaults, e.g.
/// `{"kind": "spline", "extrapolate": false}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictorConfig {
    Linear(LinearParams),
    Polynomial(PolynomialParams),
    Spline(SplineParams),
}

impl Default for PredictorConfig {
    fn default() -> Self {
        PredictorConfig::Linear(LinearParams::default())
    }
}

impl PredictorConfig {
    /// Build the predictor, timestamping observations with the system clock.
    pub fn create(&self) -> Result<PredictorEnum> {
        self.create_with_clock(system_clock())
    }

    pub fn create_with_clock(&self, clock: Arc<dyn Clock>) -> Result<PredictorEnum> {
        Ok(match self {
            PredictorConfig::Linear(params) => {
                PredictorEnum::Linear(LinearPredictor::with_clock(params, clock)?)
            }
            PredictorConfig::Polynomial(params) => {
                PredictorEnum::Polynomial(PolynomialPredictor::with_clock(params, clock)?)
            }
            PredictorConfig::Spline(params) => {
                PredictorEnum::Spline(SplinePredictor::with_clock(params, clock)?)
            }
        })
    }
}
