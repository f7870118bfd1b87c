//! NumPy-like array operations.
//!
//! Pixel indices in this crate always follow Fortran (column-major) order:
//! a pixel at `(row, col)` of an image with `height` rows has flat index
//! `col * height + row`. This matches nalgebra's storage order.

use nalgebra::DMatrix;
use crate::{Error, Result};

/// Flat column-major index of `(row, col)`.
#[inline]
pub fn ravel_index_f(row: usize, col: usize, height: usize) -> usize {
    col * height + row
}

/// Inverse of [`ravel_index_f`].
#[inline]
pub fn unravel_index_f(index: usize, height: usize) -> (usize, usize) {
    (index % height, index / height)
}

/// Reorder a row-major (C order) 2-D buffer into column-major order.
pub fn c_to_f_order<T: Copy>(data: &[T], height: usize, width: usize) -> Result<Vec<T>> {
    if data.len() != height * width {
        return Err(Error::InvalidInput(format!(
            "expected buffer of length {} for shape ({}, {}), got {}",
            height * width,
            height,
            width,
            data.len()
        )));
    }

    let mut out = Vec::with_capacity(data.len());
    for col in 0..width {
        for row in 0..height {
            out.push(data[row * width + col]);
        }
    }
    Ok(out)
}

/// Reshape a column-major vector into a matrix.
pub fn reshape_f<T>(data: Vec<T>, rows: usize, cols: usize) -> Result<DMatrix<T>>
where
    T: nalgebra::Scalar,
{
    if data.len() != rows * cols {
        return Err(Error::InvalidInput(format!(
            "cannot reshape vector of length {} into ({}, {})",
            data.len(),
            rows,
            cols
        )));
    }

    Ok(DMatrix::from_vec(rows, cols, data))
}

/// Indices that sort `values` in descending order.
///
/// Stable: equal values keep their original relative order. NaN sorts last.
pub fn argsort_desc(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        let (x, y) = (values[a], values[b]);
        match (x.is_nan(), y.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => y.total_cmp(&x),
        }
    });
    order
}

/// Sorted unique values.
pub fn unique(values: impl IntoIterator<Item = usize>) -> Vec<usize> {
    let mut out: Vec<usize> = values.into_iter().collect();
    out.sort_unstable();
    out.dedup();
    out
}

/// Sorted values of `0..total` that are not in `remove` (numpy `setdiff1d`).
pub fn setdiff_range(total: usize, remove: &[usize]) -> Vec<usize> {
    let mut removed = vec![false; total];
    for &idx in remove {
        if idx < total {
            removed[idx] = true;
        }
    }
    (0..total).filter(|&i| !removed[i]).collect()
}
