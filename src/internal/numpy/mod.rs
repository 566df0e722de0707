//! NumPy functions port.
//!
//! Ported from:
//! - numpy.polyfit
//! - numpy.poly1d

mod polyfit;

pub use polyfit::*;
