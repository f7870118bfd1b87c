//! Pairwise mask distance engine.
//!
//! This module provides:
//! - `DistanceConfig` - centroid cutoff and enclosure relaxation
//! - `distance_masks` - one distance matrix per consecutive pair of mask sets
//! - `distance_pair` / `distance_from_masks` - the two-set shortcuts
//! - Per-pair functions (`jaccard_distance`, `enclosure_clamp`, `mask_distance`)
//!
//! Entries are `1 - IoU` in [0, 1]. Pairs whose centroids are at least
//! `max_dist` apart are never compared and get distance exactly 1.

mod functions;

pub use functions::*;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dispatch::{MapBackend, Sequential};
use crate::{Error, MaskSet, Result};

/// Parameters of the distance computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// Centroid distance at which two masks are certainly disjoint.
    pub max_dist: f64,

    /// When set, a left mask fully enclosed in a right mask has its distance
    /// capped at [`ENCLOSED_MAX_DISTANCE`]. Only presence matters.
    pub enclosed_thr: Option<f64>,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            max_dist: 10.0,
            enclosed_thr: None,
        }
    }
}

impl DistanceConfig {
    /// Create a configuration with the given centroid cutoff.
    pub fn new(max_dist: f64) -> Self {
        Self {
            max_dist,
            ..Self::default()
        }
    }

    /// Enable enclosure relaxation.
    pub fn with_enclosed_thr(mut self, enclosed_thr: f64) -> Self {
        self.enclosed_thr = Some(enclosed_thr);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_dist.is_nan() || self.max_dist < 0.0 {
            return Err(Error::InvalidInput(format!(
                "max_dist must be a non-negative number, got {}",
                self.max_dist
            )));
        }
        if let Some(thr) = self.enclosed_thr {
            if !thr.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "enclosed_thr must be finite, got {}",
                    thr
                )));
            }
        }
        Ok(())
    }
}

/// Compute distance matrices between consecutive mask sets.
///
/// Set `k` is compared with set `k + 1`, giving `sets.len() - 1` matrices.
/// Rows of each matrix are computed through `backend`.
///
/// # Errors
/// - `Error::InvalidInput` for fewer than two sets, mismatched FOV shapes or an
///   invalid configuration
/// - `Error::Numeric` if an entry evaluates to NaN
pub fn distance_masks<B: MapBackend>(
    sets: &[MaskSet],
    config: &DistanceConfig,
    backend: &B,
) -> Result<Vec<DMatrix<f64>>> {
    config.validate()?;
    if sets.len() < 2 {
        return Err(Error::InvalidInput(format!(
            "need at least two mask sets to compare, got {}",
            sets.len()
        )));
    }

    sets.windows(2)
        .enumerate()
        .map(|(pair, window)| pair_matrix(&window[0], &window[1], config, pair, backend))
        .collect()
}

/// Distance matrix between two mask sets, computed sequentially.
pub fn distance_pair(left: &MaskSet, right: &MaskSet, config: &DistanceConfig) -> Result<DMatrix<f64>> {
    config.validate()?;
    pair_matrix(left, right, config, 0, &Sequential)
}

/// Distance matrix between two stacks of 2-D masks.
///
/// Builds both mask sets (with centroids) and compares them.
pub fn distance_from_masks(
    masks_gt: &[DMatrix<bool>],
    masks_comp: &[DMatrix<bool>],
    config: &DistanceConfig,
) -> Result<DMatrix<f64>> {
    let gt = MaskSet::from_masks(masks_gt)?;
    let comp = MaskSet::from_masks(masks_comp)?;
    distance_pair(&gt, &comp, config)
}

fn pair_matrix<B: MapBackend>(
    left: &MaskSet,
    right: &MaskSet,
    config: &DistanceConfig,
    pair: usize,
    backend: &B,
) -> Result<DMatrix<f64>> {
    if left.shape() != right.shape() {
        return Err(Error::InvalidInput(format!(
            "FOV pair {}: shapes {:?} and {:?} differ",
            pair,
            left.shape(),
            right.shape()
        )));
    }

    let (n_left, n_right) = (left.len(), right.len());
    debug!(pair, n_left, n_right, "computing mask distances");

    let rows: Vec<usize> = (0..n_left).collect();
    let computed = backend.map(&rows, |&i| row_distances(left, right, i, config, pair));

    let mut distances = DMatrix::from_element(n_left, n_right, 1.0);
    for (i, row) in computed.into_iter().enumerate() {
        for (j, value) in row?.into_iter().enumerate() {
            distances[(i, j)] = value;
        }
    }
    Ok(distances)
}

fn row_distances(
    left: &MaskSet,
    right: &MaskSet,
    i: usize,
    config: &DistanceConfig,
    pair: usize,
) -> Result<Vec<f64>> {
    let relax_enclosed = config.enclosed_thr.is_some();
    let mask_i = &left.masks()[i];
    let centroid_i = &left.centroids()[i];

    let mut row = Vec::with_capacity(right.len());
    for (j, (mask_j, centroid_j)) in right.masks().iter().zip(right.centroids()).enumerate() {
        // NaN centroids (empty masks) fail this test and stay disjoint
        let value = if centroid_i.distance(centroid_j) < config.max_dist {
            mask_distance(mask_i, mask_j, relax_enclosed)
        } else {
            1.0
        };

        if value.is_nan() {
            return Err(Error::Numeric { pair, row: i, col: j });
        }
        row.push(value);
    }
    Ok(row)
}
