//! NumPy helpers port.
//!
//! Index conventions and small array utilities (Fortran-order ravel, argsort,
//! setdiff) used by the mask and metrics modules.

mod array;

pub use array::*;
