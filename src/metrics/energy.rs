//! Enclosed-energy fields for contour drawing.

use nalgebra::DMatrix;

use crate::dispatch::MapBackend;
use crate::internal::numpy::{argsort_desc, reshape_f};
use crate::{Error, MaskSet, Result};

/// Iso-level at which the energy field approximates a mask boundary.
pub const DEFAULT_CONTOUR_LEVEL: f64 = 0.98;

/// Normalized cumulative energy of a real-valued mask.
///
/// Pixels are ranked by value (descending); each pixel receives the fraction
/// of the total squared energy held by itself and every brighter pixel. The
/// field is monotone in pixel value, so its iso-contour at
/// [`DEFAULT_CONTOUR_LEVEL`] outlines the pixels carrying 98% of the energy.
/// An all-zero mask has no energy and yields NaN everywhere.
pub fn norm_nrg(mask: &DMatrix<f64>) -> DMatrix<f64> {
    let (rows, cols) = mask.shape();
    let values: Vec<f64> = mask.iter().copied().collect();
    let order = argsort_desc(&values);

    let mut field = vec![0.0; values.len()];
    let mut cumulative = 0.0;
    for &idx in &order {
        cumulative += values[idx] * values[idx];
        field[idx] = cumulative;
    }

    let max = field.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    for value in &mut field {
        *value /= max;
    }

    // Same length as the input by construction
    DMatrix::from_vec(rows, cols, field)
}

/// [`norm_nrg`] over many masks, in input order.
pub fn norm_nrg_all<B: MapBackend>(masks: &[DMatrix<f64>], backend: &B) -> Vec<DMatrix<f64>> {
    backend.map(masks, norm_nrg)
}

/// Energy fields of the masks of `set` at `indices`, ready for contour drawing.
pub fn contour_fields<B: MapBackend>(
    set: &MaskSet,
    indices: &[usize],
    backend: &B,
) -> Result<Vec<DMatrix<f64>>> {
    let (height, width) = set.shape();
    let masks = indices
        .iter()
        .map(|&idx| {
            let pixels = set.pixels(idx).ok_or_else(|| {
                Error::InvalidInput(format!("mask index {} out of range for {} masks", idx, set.len()))
            })?;
            let flat: Vec<f64> = (0..set.n_pixels())
                .map(|p| if pixels.contains(p) { 1.0 } else { 0.0 })
                .collect();
            reshape_f(flat, height, width)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(norm_nrg_all(&masks, backend))
}
