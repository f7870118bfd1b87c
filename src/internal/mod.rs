//! Internal modules ported from external libraries.
//!
//! These modules contain code adapted from:
//! - scipy: linear sum assignment
//! - numpy: array index utilities

pub mod scipy;
pub mod numpy;
