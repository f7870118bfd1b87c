//! Near-duplicate detection within one mask set.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::distances::{distance_pair, DistanceConfig};
use crate::internal::numpy::{setdiff_range, unique};
use crate::{Error, MaskSet, Result};

/// Parameters of duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateConfig {
    /// Two masks closer than this (1 - IoU) are duplicates.
    pub dist_thr: f64,

    /// Centroid cutoff passed to the distance engine.
    pub max_dist: f64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            dist_thr: 0.1,
            max_dist: 10.0,
        }
    }
}

impl DuplicateConfig {
    pub fn new(dist_thr: f64) -> Self {
        Self {
            dist_thr,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dist_thr.is_nan() {
            return Err(Error::InvalidInput("dist_thr must not be NaN".to_string()));
        }
        DistanceConfig::new(self.max_dist).validate()
    }
}

/// Outcome of [`detect_duplicates`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Duplicates {
    /// Every index that belongs to at least one duplicate pair, ascending.
    pub duplicates: Vec<usize>,
    /// Indices to keep, ascending.
    pub keep: Vec<usize>,
    /// Flagged pairs `(i, j)` with `i < j`.
    pub pairs: Vec<(usize, usize)>,
}

/// Find near-identical masks in one set.
///
/// The set is compared against itself with the diagonal forced to 1. For each
/// flagged pair `(i, j)` with `i < j` the higher index `j` is dropped. The
/// reduction is pairwise, not a clustering: in a cluster of mutually close
/// masks every index that is the higher end of some pair is dropped.
pub fn detect_duplicates(set: &MaskSet, config: &DuplicateConfig) -> Result<Duplicates> {
    config.validate()?;
    let mut distances = distance_pair(set, set, &DistanceConfig::new(config.max_dist))?;
    distances.fill_diagonal(1.0);

    let n = set.len();
    let mut pairs = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if distances[(i, j)] < config.dist_thr {
                pairs.push((i, j));
            }
        }
    }

    let duplicates = unique(pairs.iter().flat_map(|&(i, j)| [i, j]));
    let dropped = unique(pairs.iter().map(|&(_, j)| j));
    let keep = setdiff_range(n, &dropped);

    info!(
        num_duplicates = duplicates.len(),
        num_kept = keep.len(),
        "detected duplicate masks"
    );

    Ok(Duplicates {
        duplicates,
        keep,
        pairs,
    })
}
