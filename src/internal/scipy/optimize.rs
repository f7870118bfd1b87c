//! SciPy optimization functions port.
//!
//! Ported from scipy.optimize.linear_sum_assignment (rectangular LSAP solver,
//! shortest augmenting path variant of Crouse 2016).
//! License: BSD 3-Clause (SciPy Developers)
#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]

use nalgebra::DMatrix;
use crate::{Error, Result};

/// Solve the linear sum assignment problem.
///
/// Finds the assignment of rows to columns minimizing total cost. Every row is
/// assigned when `nrows <= ncols`, every column otherwise, so the result has
/// `min(nrows, ncols)` pairs. Row indices in the result are ascending.
///
/// Ties are broken exactly as scipy does, so results are reproducible across
/// both implementations.
///
/// # Errors
/// `Error::InvalidInput` if the matrix contains NaN or -inf, or if no
/// finite-cost complete assignment exists.
pub fn linear_sum_assignment(cost_matrix: &DMatrix<f64>) -> Result<(Vec<usize>, Vec<usize>)> {
    let (num_rows, num_cols) = cost_matrix.shape();
    if num_rows == 0 || num_cols == 0 {
        return Ok((Vec::new(), Vec::new()));
    }

    if let Some(bad) = cost_matrix.iter().find(|x| x.is_nan() || **x == f64::NEG_INFINITY) {
        return Err(Error::InvalidInput(format!(
            "cost matrix contains invalid numeric entries ({})",
            bad
        )));
    }

    // The solver needs at least as many columns as rows.
    let transpose = num_cols < num_rows;
    let cost = if transpose {
        cost_matrix.transpose()
    } else {
        cost_matrix.clone()
    };
    let (nr, nc) = cost.shape();

    let mut u = vec![0.0; nr];
    let mut v = vec![0.0; nc];
    let mut shortest_path_costs = vec![f64::INFINITY; nc];
    let mut path = vec![0usize; nc];
    let mut col4row: Vec<Option<usize>> = vec![None; nr];
    let mut row4col: Vec<Option<usize>> = vec![None; nc];
    let mut sr = vec![false; nr];
    let mut sc = vec![false; nc];
    let mut remaining = vec![0usize; nc];

    for cur_row in 0..nr {
        let (sink, min_val) = augmenting_path(
            &cost,
            &u,
            &v,
            &mut path,
            &row4col,
            &mut shortest_path_costs,
            cur_row,
            &mut sr,
            &mut sc,
            &mut remaining,
        )
        .ok_or_else(|| Error::InvalidInput("cost matrix is infeasible".to_string()))?;

        // Update dual variables
        u[cur_row] += min_val;
        for i in 0..nr {
            if sr[i] && i != cur_row {
                if let Some(j) = col4row[i] {
                    u[i] += min_val - shortest_path_costs[j];
                }
            }
        }
        for j in 0..nc {
            if sc[j] {
                v[j] -= min_val - shortest_path_costs[j];
            }
        }

        // Augment along the alternating path back to cur_row
        let mut j = sink;
        loop {
            let i = path[j];
            row4col[j] = Some(i);
            let previous = col4row[i].replace(j);
            if i == cur_row {
                break;
            }
            match previous {
                Some(prev_col) => j = prev_col,
                None => break,
            }
        }
    }

    let mut rows = Vec::with_capacity(nr);
    let mut cols = Vec::with_capacity(nr);
    if transpose {
        // Transposed rows are original columns; report sorted by original row.
        let mut pairs: Vec<(usize, usize)> = col4row
            .iter()
            .enumerate()
            .filter_map(|(t_row, t_col)| t_col.map(|c| (c, t_row)))
            .collect();
        pairs.sort_unstable();
        for (row, col) in pairs {
            rows.push(row);
            cols.push(col);
        }
    } else {
        for (row, col) in col4row.iter().enumerate() {
            if let Some(col) = col {
                rows.push(row);
                cols.push(*col);
            }
        }
    }

    Ok((rows, cols))
}

/// Find the shortest augmenting path starting at row `i`.
///
/// Returns the sink column and the path's reduced cost, or `None` when every
/// remaining column is unreachable at finite cost.
fn augmenting_path(
    cost: &DMatrix<f64>,
    u: &[f64],
    v: &[f64],
    path: &mut [usize],
    row4col: &[Option<usize>],
    shortest_path_costs: &mut [f64],
    mut i: usize,
    sr: &mut [bool],
    sc: &mut [bool],
    remaining: &mut [usize],
) -> Option<(usize, f64)> {
    let nc = cost.ncols();
    let mut min_val = 0.0;

    // Columns are scanned in reverse order, as in scipy.
    let mut num_remaining = nc;
    for it in 0..nc {
        remaining[it] = nc - it - 1;
    }

    sr.fill(false);
    sc.fill(false);
    shortest_path_costs.fill(f64::INFINITY);

    loop {
        let mut index = None;
        let mut lowest = f64::INFINITY;
        sr[i] = true;

        for it in 0..num_remaining {
            let j = remaining[it];

            let r = min_val + cost[(i, j)] - u[i] - v[j];
            if r < shortest_path_costs[j] {
                path[j] = i;
                shortest_path_costs[j] = r;
            }

            // Prefer unassigned columns on ties; reaching one ends the search.
            if shortest_path_costs[j] < lowest
                || (shortest_path_costs[j] == lowest && row4col[j].is_none())
            {
                lowest = shortest_path_costs[j];
                index = Some(it);
            }
        }

        min_val = lowest;
        if min_val == f64::INFINITY {
            return None;
        }
        let index = index?;

        let j = remaining[index];
        sc[j] = true;
        num_remaining -= 1;
        remaining[index] = remaining[num_remaining];

        match row4col[j] {
            None => return Some((j, min_val)),
            Some(next_row) => i = next_row,
        }
    }
}
