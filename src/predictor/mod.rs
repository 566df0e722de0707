//! Person motion predictors.
//!
//! This module provides three predictor implementations:
//! - `LinearPredictor` - Constant velocity from the oldest and newest sample
//! - `PolynomialPredictor` - Weighted polynomial path fit with arc-length marching
//! - `SplinePredictor` - Cubic spline path fit with arc-length marching

mod traits;
mod history;
mod marching;
mod linear;
mod polynomial;
mod spline;
mod dispatch;

pub use traits::{PersonPredictor, Projection};
pub use history::{PredictorHistory, TimedPersonState};
pub use marching::{ArcLengthMarcher, MarchOutcome};
pub use linear::{LinearParams, LinearPredictor};
pub use polynomial::{PolynomialParams, PolynomialPredictor};
pub use spline::{SplineParams, SplinePredictor};
pub use dispatch::{PredictorConfig, PredictorEnum};
pub use crate::internal::scipy::BoundaryCondition;
