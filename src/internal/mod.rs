//! Internal modules ported from external libraries.
//!
//! These modules contain code adapted from:
//! - numpy: Least-squares polynomial fitting
//! - scipy: Cubic spline interpolation

pub mod numpy;
pub mod scipy;
