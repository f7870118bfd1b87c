//! Ground truth vs candidate evaluation.
//!
//! This module provides tools for scoring a candidate segmentation against a
//! ground truth segmentation of the same FOV. It includes:
//!
//! - `match_masks` - true positive / false negative / false positive index sets
//! - `PerformanceSummary` - recall, precision, accuracy and F1 score
//! - `norm_nrg` - enclosed-energy field used to draw mask contours

mod evaluation;
mod energy;

pub use evaluation::{match_masks, EvaluationConfig, MatchResult, PerformanceSummary};
pub use energy::{contour_fields, norm_nrg, norm_nrg_all, DEFAULT_CONTOUR_LEVEL};
