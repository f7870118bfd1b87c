//! # roi-linker - ROI matching across fields of view
//!
//! Matches, links and scores binary region-of-interest masks (segmented cells)
//! across independently segmented mask sets of the same field of view.
//!
//! ## Features
//!
//! - Bit-vector mask sets with column-major pixel indexing and centroids
//! - 1 - IoU distance matrices with centroid gating and enclosure relaxation
//! - Exact minimum-cost bipartite matching (scipy-compatible tie-breaking)
//! - Multi-FOV identity chains built from consecutive pairwise matches
//! - Ground truth vs candidate scoring (recall, precision, accuracy, F1)
//! - Near-duplicate detection inside a single mask set
//!
//! ## Example
//!
//! ```rust,ignore
//! use roi_linker::{MaskSet, EvaluationConfig, match_masks};
//!
//! let gt = MaskSet::from_masks(&gt_masks)?;
//! let comp = MaskSet::from_masks(&comp_masks)?;
//! let result = match_masks(&gt, &comp, None, &EvaluationConfig::default())?;
//! println!("f1 = {}", result.performance.f1_score);
//! ```

// Internal modules (ports of scipy and numpy routines)
pub(crate) mod internal;

// Public modules
pub mod mask;
pub mod dispatch;
pub mod distances;
pub mod matching;
pub mod linking;
pub mod metrics;
pub mod duplicates;

// Re-exports for convenience
pub use mask::{Centroid, MaskSet, PixelSet};
pub use dispatch::{MapBackend, Rayon, Sequential};
pub use distances::{distance_masks, distance_pair, DistanceConfig};
pub use matching::{find_matches, Matches};
pub use linking::{link_chains, Chains, LinkConfig};
pub use metrics::{match_masks, norm_nrg, EvaluationConfig, MatchResult, PerformanceSummary};
pub use duplicates::{detect_duplicates, DuplicateConfig, Duplicates};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur while matching masks.
    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum Error {
        /// A distance computation produced NaN. Inputs are malformed.
        #[error("NaN distance produced for FOV pair {pair} at entry ({row}, {col}); error in inputs")]
        Numeric { pair: usize, row: usize, col: usize },

        /// Structural contract violation (shapes, lengths, options).
        #[error("Invalid input: {0}")]
        InvalidInput(String),
    }

    /// Result type for roi-linker operations
    pub type Result<T> = std::result::Result<T, Error>;
}
