//! SciPy functions port.
//!
//! Ported from:
//! - scipy.optimize.linear_sum_assignment
//!
//! License: BSD 3-Clause

mod optimize;

pub use optimize::*;
