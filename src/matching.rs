//! Bipartite matching of mask sets.
//!
//! Each distance matrix is solved with an exact minimum-cost assignment
//! (see `internal::scipy::linear_sum_assignment`). The matched pairs keep the
//! cost read from the original matrix so later stages can apply their own
//! thresholds.

use std::time::Instant;

use nalgebra::DMatrix;
use tracing::{debug, info};

use crate::internal::scipy::linear_sum_assignment;
use crate::{Error, Result};

/// Check if a matrix contains NaN values.
pub fn has_nan(matrix: &DMatrix<f64>) -> bool {
    matrix.iter().any(|&x| x.is_nan())
}

/// Validate a distance matrix (no NaN values allowed).
pub fn validate_distance_matrix(matrix: &DMatrix<f64>) -> Result<()> {
    if has_nan(matrix) {
        return Err(Error::InvalidInput(
            "Distance matrix contains NaN, not allowed".to_string(),
        ));
    }
    Ok(())
}

/// Optimal assignment between the masks of two consecutive sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Matches {
    /// Matched left indices, ascending.
    pub rows: Vec<usize>,
    /// Matched right indices, parallel to `rows`.
    pub cols: Vec<usize>,
    /// Distance of each matched pair, parallel to `rows`.
    pub costs: Vec<f64>,
    /// Shape (n_left, n_right) of the matrix the assignment was solved on.
    pub shape: (usize, usize),
}

impl Matches {
    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of matched costs.
    pub fn total_cost(&self) -> f64 {
        self.costs.iter().sum()
    }

    /// Iterate over `(row, col, cost)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.costs)
            .map(|((&r, &c), &cost)| (r, c, cost))
    }

    /// Matched column and cost of `row`, if the row was matched.
    pub fn lookup(&self, row: usize) -> Option<(usize, f64)> {
        self.iter().find(|&(r, _, _)| r == row).map(|(_, c, cost)| (c, cost))
    }

    /// Check that the index vectors are parallel and inside `shape`.
    ///
    /// Assignments built by [`match_pair`] always pass.
    pub fn validate(&self) -> Result<()> {
        if self.cols.len() != self.rows.len() || self.costs.len() != self.rows.len() {
            return Err(Error::InvalidInput(format!(
                "assignment has {} rows, {} cols and {} costs",
                self.rows.len(),
                self.cols.len(),
                self.costs.len()
            )));
        }
        let (n_rows, n_cols) = self.shape;
        for (r, c, _) in self.iter() {
            if r >= n_rows || c >= n_cols {
                return Err(Error::InvalidInput(format!(
                    "pair ({}, {}) out of range for shape ({}, {})",
                    r, c, n_rows, n_cols
                )));
            }
        }
        Ok(())
    }

    /// Dense `row -> (col, cost)` table over all left indices.
    ///
    /// Expects a valid assignment (see [`Matches::validate`]).
    pub fn row_table(&self) -> Vec<Option<(usize, f64)>> {
        let mut table = vec![None; self.shape.0];
        for (r, c, cost) in self.iter() {
            table[r] = Some((c, cost));
        }
        table
    }
}

/// Solve one distance matrix.
///
/// The caller's matrix is never modified. With `print_assignment`, every
/// matched pair is logged at debug level.
pub fn match_pair(distance: &DMatrix<f64>, print_assignment: bool) -> Result<Matches> {
    validate_distance_matrix(distance)?;

    let (rows, cols) = linear_sum_assignment(distance)?;
    let costs: Vec<f64> = rows
        .iter()
        .zip(&cols)
        .map(|(&r, &c)| distance[(r, c)])
        .collect();

    if print_assignment {
        for ((r, c), cost) in rows.iter().zip(&cols).zip(&costs) {
            debug!("({}, {}) -> {}", r, c, cost);
        }
    }

    Ok(Matches {
        rows,
        cols,
        costs,
        shape: distance.shape(),
    })
}

/// Match every distance matrix of a sequence.
///
/// Returns one [`Matches`] per matrix; logs the aggregate cost of each FOV
/// pair and the elapsed time.
pub fn find_matches(distances: &[DMatrix<f64>], print_assignment: bool) -> Result<Vec<Matches>> {
    let start = Instant::now();
    let mut all = Vec::with_capacity(distances.len());

    for (fov, distance) in distances.iter().enumerate() {
        let matches = match_pair(distance, print_assignment).map_err(|e| match e {
            Error::InvalidInput(msg) => Error::InvalidInput(format!("FOV pair {}: {}", fov, msg)),
            other => other,
        })?;

        info!(
            fov,
            rows = distance.nrows(),
            cols = distance.ncols(),
            total_cost = matches.total_cost(),
            elapsed_s = start.elapsed().as_secs_f64(),
            "matched FOV pair"
        );
        all.push(matches);
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Test Perfect Matches =====

    #[test]
    fn test_identity_matches() {
        let matrix = DMatrix::from_row_slice(3, 3, &[
            0.0, 1.0, 1.0,
            1.0, 0.0, 1.0,
            1.0, 1.0, 0.0,
        ]);
        let m = match_pair(&matrix, false).unwrap();

        assert_eq!(m.rows, vec![0, 1, 2]);
        assert_eq!(m.cols, vec![0, 1, 2]);
        assert_eq!(m.costs, vec![0.0, 0.0, 0.0]);
        assert_eq!(m.shape, (3, 3));
    }

    #[test]
    fn test_optimal_beats_greedy() {
        // Greedy would take (0,0)=0.1 and then be forced into (1,1)=0.9
        let matrix = DMatrix::from_row_slice(2, 2, &[
            0.1, 0.2,
            0.3, 0.9,
        ]);
        let m = match_pair(&matrix, false).unwrap();

        assert_eq!(m.cols, vec![1, 0]);
        assert!((m.total_cost() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_never_worse_than_identity() {
        let matrix = DMatrix::from_row_slice(4, 4, &[
            0.4, 0.1, 0.9, 0.7,
            0.2, 0.8, 0.3, 0.6,
            0.5, 0.6, 0.2, 0.1,
            0.9, 0.3, 0.4, 0.2,
        ]);
        let m = match_pair(&matrix, false).unwrap();
        let identity: f64 = (0..4).map(|i| matrix[(i, i)]).sum();
        assert!(m.total_cost() <= identity + 1e-12);
    }

    // ===== Test Asymmetric Matrices =====

    #[test]
    fn test_more_rows_than_cols() {
        let matrix = DMatrix::from_row_slice(3, 1, &[1.0, 0.2, 0.6]);
        let m = match_pair(&matrix, false).unwrap();
        assert_eq!(m.rows, vec![1]);
        assert_eq!(m.cols, vec![0]);
        assert_eq!(m.costs, vec![0.2]);
    }

    #[test]
    fn test_more_cols_than_rows() {
        let matrix = DMatrix::from_row_slice(1, 3, &[1.0, 0.2, 0.6]);
        let m = match_pair(&matrix, false).unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m.lookup(0), Some((1, 0.2)));
        assert_eq!(m.lookup(1), None);
    }

    #[test]
    fn test_row_table() {
        let matrix = DMatrix::from_row_slice(3, 2, &[
            0.0, 1.0,
            1.0, 1.0,
            1.0, 0.3,
        ]);
        let m = match_pair(&matrix, false).unwrap();
        let table = m.row_table();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0], Some((0, 0.0)));
        assert_eq!(table[1], None);
        assert_eq!(table[2], Some((1, 0.3)));
    }

    // ===== Test Empty/Minimal Inputs =====

    #[test]
    fn test_match_empty() {
        let m = match_pair(&DMatrix::zeros(0, 3), false).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.shape, (0, 3));
        assert_eq!(m.total_cost(), 0.0);
    }

    // ===== Test NaN Detection =====

    #[test]
    fn test_nan_detection() {
        let matrix = DMatrix::from_row_slice(2, 2, &[
            0.5, f64::NAN,
            1.0, 0.8,
        ]);

        assert!(has_nan(&matrix));
        assert!(validate_distance_matrix(&matrix).is_err());
        assert!(matches!(match_pair(&matrix, false), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_no_nan() {
        let matrix = DMatrix::from_row_slice(2, 2, &[
            0.5, 1.0,
            1.5, 0.8,
        ]);

        assert!(!has_nan(&matrix));
        assert!(validate_distance_matrix(&matrix).is_ok());
    }

    #[test]
    fn test_find_matches_reports_failing_pair() {
        let good = DMatrix::from_row_slice(1, 1, &[0.0]);
        let bad = DMatrix::from_row_slice(1, 1, &[f64::NAN]);
        let err = find_matches(&[good.clone(), bad], false).unwrap_err();
        assert!(err.to_string().contains("FOV pair 1"));

        let ok = find_matches(&[good.clone(), good], true).unwrap();
        assert_eq!(ok.len(), 2);
    }

    // ===== Test Assignment Validation =====

    #[test]
    fn test_validate_solved_assignment() {
        let matrix = DMatrix::from_row_slice(2, 3, &[
            0.3, 0.1, 0.9,
            0.2, 0.8, 0.4,
        ]);
        assert!(match_pair(&matrix, false).unwrap().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_ragged_vectors() {
        let m = Matches {
            rows: vec![0, 1],
            cols: vec![0, 1],
            costs: vec![0.0],
            shape: (2, 2),
        };
        assert!(matches!(m.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_pairs() {
        let row = Matches {
            rows: vec![5],
            cols: vec![0],
            costs: vec![0.0],
            shape: (1, 1),
        };
        assert!(row.validate().is_err());

        let col = Matches {
            rows: vec![0],
            cols: vec![1],
            costs: vec![0.0],
            shape: (1, 1),
        };
        assert!(col.validate().is_err());
    }
}
