//! Two-set evaluation functions.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::distances::{distance_pair, DistanceConfig};
use crate::internal::numpy::setdiff_range;
use crate::matching::{match_pair, Matches};
use crate::{Error, MaskSet, Result};

/// Parameters of a ground truth vs candidate comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// A matched pair counts as a true positive iff its cost is below this.
    pub thresh_cost: f64,

    /// Centroid cutoff passed to the distance engine.
    pub min_dist: f64,

    /// Enclosure relaxation passed to the distance engine.
    pub enclosed_thr: Option<f64>,

    /// Log every matched pair.
    pub print_assignment: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            thresh_cost: 0.7,
            min_dist: 10.0,
            enclosed_thr: None,
            print_assignment: false,
        }
    }
}

impl EvaluationConfig {
    pub fn new(thresh_cost: f64) -> Self {
        Self {
            thresh_cost,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.thresh_cost.is_nan() {
            return Err(Error::InvalidInput("thresh_cost must not be NaN".to_string()));
        }
        self.distance_config().validate()
    }

    /// Distance engine settings derived from this configuration.
    pub fn distance_config(&self) -> DistanceConfig {
        DistanceConfig {
            max_dist: self.min_dist,
            enclosed_thr: self.enclosed_thr,
        }
    }
}

/// Confusion-matrix style summary of one comparison.
///
/// True negatives are 0 by convention. A ratio whose denominator is zero is
/// NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub recall: f64,
    pub precision: f64,
    pub accuracy: f64,
    pub f1_score: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl PerformanceSummary {
    /// Derive the ratios from raw counts.
    pub fn from_counts(tp: usize, fp: usize, fn_: usize) -> Self {
        let (tp_f, fp_f, fn_f) = (tp as f64, fp as f64, fn_ as f64);
        let tn = 0.0;

        Self {
            recall: tp_f / (tp_f + fn_f),
            precision: tp_f / (tp_f + fp_f),
            accuracy: (tp_f + tn) / (tp_f + fp_f + fn_f + tn),
            f1_score: 2.0 * tp_f / (2.0 * tp_f + fp_f + fn_f),
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_,
        }
    }
}

/// Outcome of [`match_masks`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// Ground truth indices of true positives, in assignment order.
    pub tp_gt: Vec<usize>,
    /// Candidate indices of true positives, parallel to `tp_gt`.
    pub tp_comp: Vec<usize>,
    /// Ground truth indices without an accepted match, ascending.
    pub fn_gt: Vec<usize>,
    /// Candidate indices without an accepted match, ascending.
    pub fp_comp: Vec<usize>,
    pub performance: PerformanceSummary,
    /// The full assignment, including pairs rejected by the threshold.
    pub matches: Matches,
}

/// Match candidate masks against ground truth masks.
///
/// Uses `distance` when given (it must have shape (|gt|, |comp|)), otherwise
/// computes it from the masks. Matched pairs with cost < `thresh_cost` are true
/// positives; every other ground truth mask is a false negative and every other
/// candidate a false positive.
pub fn match_masks(
    gt: &MaskSet,
    comp: &MaskSet,
    distance: Option<&DMatrix<f64>>,
    config: &EvaluationConfig,
) -> Result<MatchResult> {
    config.validate()?;

    let computed;
    let distance = match distance {
        Some(d) => {
            if d.shape() != (gt.len(), comp.len()) {
                return Err(Error::InvalidInput(format!(
                    "precomputed distance matrix has shape {:?}, expected ({}, {})",
                    d.shape(),
                    gt.len(),
                    comp.len()
                )));
            }
            d
        }
        None => {
            computed = distance_pair(gt, comp, &config.distance_config())?;
            &computed
        }
    };

    let matches = match_pair(distance, config.print_assignment)?;

    let (tp_gt, tp_comp): (Vec<usize>, Vec<usize>) = matches
        .iter()
        .filter(|&(_, _, cost)| cost < config.thresh_cost)
        .map(|(r, c, _)| (r, c))
        .unzip();

    let tp = tp_gt.len();
    let performance = PerformanceSummary::from_counts(tp, comp.len() - tp, gt.len() - tp);
    info!(
        recall = performance.recall,
        precision = performance.precision,
        accuracy = performance.accuracy,
        f1_score = performance.f1_score,
        "evaluated candidate masks"
    );

    Ok(MatchResult {
        fn_gt: setdiff_range(gt.len(), &tp_gt),
        fp_comp: setdiff_range(comp.len(), &tp_comp),
        tp_gt,
        tp_comp,
        performance,
        matches,
    })
}
