//! Map backends.
//!
//! Work that splits into independent units (rows of a distance matrix, masks
//! to normalize) goes through a [`MapBackend`]. Backends must return results
//! in input order, so outputs never depend on which backend is used.

use rayon::prelude::*;

/// Apply a pure function to each unit and return results in input order.
pub trait MapBackend: Send + Sync {
    fn map<T, R, F>(&self, units: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send;
}

/// Runs every unit on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl MapBackend for Sequential {
    fn map<T, R, F>(&self, units: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        units.iter().map(f).collect()
    }
}

/// Runs units on the global rayon thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rayon;

impl MapBackend for Rayon {
    fn map<T, R, F>(&self, units: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        units.par_iter().map(f).collect()
    }
}
