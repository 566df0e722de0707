//! SciPy functions port.
//!
//! Ported from:
//! - scipy.interpolate.CubicSpline
//!
//! License: BSD 3-Clause (SciPy Developers)

mod interpolate;

pub use interpolate::*;
