//! Mask representation.
//!
//! A [`MaskSet`] holds the binary masks of one field of view as bit-vectors
//! over the flattened image, plus one centroid per mask. Flattening is always
//! column-major (`col * height + row`), and centroids are computed from the
//! same flat indices so pixel data and coordinates never desynchronize.

use bitvec::prelude::*;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::internal::numpy::{c_to_f_order, ravel_index_f, unravel_index_f};
use crate::{Error, Result};

/// Set of "on" pixels of one mask, stored as a bit-vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSet {
    bits: BitVec,
    count: usize,
}

impl PixelSet {
    /// Empty set over `n_pixels` pixels.
    pub fn new(n_pixels: usize) -> Self {
        Self {
            bits: bitvec![0; n_pixels],
            count: 0,
        }
    }

    /// Build from a flat boolean buffer (already in column-major order).
    pub fn from_bools(values: &[bool]) -> Self {
        let bits: BitVec = values.iter().copied().collect();
        let count = bits.count_ones();
        Self { bits, count }
    }

    /// Build from flat pixel indices.
    ///
    /// # Errors
    /// `Error::InvalidInput` if an index is outside `0..n_pixels`.
    pub fn from_indices(n_pixels: usize, indices: impl IntoIterator<Item = usize>) -> Result<Self> {
        let mut bits = bitvec![0; n_pixels];
        for idx in indices {
            if idx >= n_pixels {
                return Err(Error::InvalidInput(format!(
                    "pixel index {} out of range for {} pixels",
                    idx, n_pixels
                )));
            }
            bits.set(idx, true);
        }
        let count = bits.count_ones();
        Ok(Self { bits, count })
    }

    /// Whether pixel `idx` is on. Out of range pixels are off.
    pub fn contains(&self, idx: usize) -> bool {
        self.bits.get(idx).map_or(false, |bit| *bit)
    }

    /// Number of pixels in the underlying image.
    pub fn n_pixels(&self) -> usize {
        self.bits.len()
    }

    /// Number of "on" pixels.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// |self ∩ other|, the dot product of the two boolean vectors.
    pub fn intersection_count(&self, other: &PixelSet) -> usize {
        let mut both = self.bits.clone();
        both &= other.bits.as_bitslice();
        both.count_ones()
    }

    /// Flat indices of "on" pixels, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }
}

/// Center of mass of a mask in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub row: f64,
    pub col: f64,
}

impl Centroid {
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }

    /// Euclidean distance to another centroid.
    pub fn distance(&self, other: &Centroid) -> f64 {
        (self.row - other.row).hypot(self.col - other.col)
    }

    pub fn is_nan(&self) -> bool {
        self.row.is_nan() || self.col.is_nan()
    }

    /// Mass-weighted center of the "on" pixels of `pixels`.
    ///
    /// An empty mask has an undefined center and yields NaN coordinates.
    pub fn of_pixels(pixels: &PixelSet, height: usize) -> Self {
        let (mut sum_row, mut sum_col) = (0.0, 0.0);
        for idx in pixels.iter_ones() {
            let (row, col) = unravel_index_f(idx, height);
            sum_row += row as f64;
            sum_col += col as f64;
        }
        let mass = pixels.count() as f64;
        Self::new(sum_row / mass, sum_col / mass)
    }
}

/// Masks of one field of view with their centroids.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskSet {
    height: usize,
    width: usize,
    masks: Vec<PixelSet>,
    centroids: Vec<Centroid>,
}

impl MaskSet {
    /// Create a mask set, computing centroids from the pixels.
    ///
    /// # Errors
    /// `Error::InvalidInput` if a mask does not cover `height * width` pixels.
    pub fn new(height: usize, width: usize, masks: Vec<PixelSet>) -> Result<Self> {
        Self::check_masks(height, width, &masks)?;
        let centroids = masks
            .iter()
            .map(|m| Centroid::of_pixels(m, height))
            .collect();
        Ok(Self { height, width, masks, centroids })
    }

    /// Create a mask set with externally supplied centroids.
    ///
    /// The centroids must be in the same order as `masks` and expressed in the
    /// same (row, col) convention.
    pub fn with_centroids(
        height: usize,
        width: usize,
        masks: Vec<PixelSet>,
        centroids: Vec<Centroid>,
    ) -> Result<Self> {
        Self::check_masks(height, width, &masks)?;
        if centroids.len() != masks.len() {
            return Err(Error::InvalidInput(format!(
                "got {} centroids for {} masks",
                centroids.len(),
                masks.len()
            )));
        }
        Ok(Self { height, width, masks, centroids })
    }

    /// Mask set without any mask.
    pub fn empty(height: usize, width: usize) -> Self {
        Self { height, width, masks: Vec::new(), centroids: Vec::new() }
    }

    /// Build from 2-D boolean masks (height x width each).
    ///
    /// # Errors
    /// `Error::InvalidInput` if `masks` is empty (the shape is unknown) or the
    /// masks do not all share one shape.
    pub fn from_masks(masks: &[DMatrix<bool>]) -> Result<Self> {
        let first = masks.first().ok_or_else(|| {
            Error::InvalidInput("cannot infer FOV shape from an empty mask list".to_string())
        })?;
        let (height, width) = first.shape();

        let mut sets = Vec::with_capacity(masks.len());
        for (idx, mask) in masks.iter().enumerate() {
            if mask.shape() != (height, width) {
                return Err(Error::InvalidInput(format!(
                    "mask {} has shape {:?}, expected ({}, {})",
                    idx,
                    mask.shape(),
                    height,
                    width
                )));
            }
            // nalgebra storage is column-major already
            let flat: Vec<bool> = mask.iter().copied().collect();
            sets.push(PixelSet::from_bools(&flat));
        }
        Self::new(height, width, sets)
    }

    /// Build from a pixel-by-component matrix of shape (height * width, n).
    pub fn from_pixel_matrix(height: usize, width: usize, matrix: &DMatrix<bool>) -> Result<Self> {
        if matrix.nrows() != height * width {
            return Err(Error::InvalidInput(format!(
                "pixel matrix has {} rows, expected {} for FOV ({}, {})",
                matrix.nrows(),
                height * width,
                height,
                width
            )));
        }
        let masks = matrix
            .column_iter()
            .map(|col| PixelSet::from_bools(&col.iter().copied().collect::<Vec<_>>()))
            .collect();
        Self::new(height, width, masks)
    }

    /// Build from a row-major boolean volume.
    ///
    /// `shape` is `[height, width]` for a single mask or `[n, height, width]`
    /// for a stack of masks; `data` is laid out in C order.
    ///
    /// # Errors
    /// `Error::InvalidInput` for any other rank or a length mismatch.
    pub fn from_volume(shape: &[usize], data: &[bool]) -> Result<Self> {
        let (n, height, width) = match *shape {
            [height, width] => (1, height, width),
            [n, height, width] => (n, height, width),
            _ => {
                return Err(Error::InvalidInput(format!(
                    "expected a 2-D mask or a 3-D stack of masks, got shape {:?}",
                    shape
                )))
            }
        };

        let plane = height * width;
        if data.len() != n * plane {
            return Err(Error::InvalidInput(format!(
                "volume of shape {:?} needs {} values, got {}",
                shape,
                n * plane,
                data.len()
            )));
        }

        let masks = (0..n)
            .map(|k| {
                let chunk = &data[k * plane..(k + 1) * plane];
                c_to_f_order(chunk, height, width).map(|f| PixelSet::from_bools(&f))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(height, width, masks)
    }

    fn check_masks(height: usize, width: usize, masks: &[PixelSet]) -> Result<()> {
        for (idx, mask) in masks.iter().enumerate() {
            if mask.n_pixels() != height * width {
                return Err(Error::InvalidInput(format!(
                    "mask {} covers {} pixels, expected {} for FOV ({}, {})",
                    idx,
                    mask.n_pixels(),
                    height * width,
                    height,
                    width
                )));
            }
        }
        Ok(())
    }

    /// Number of masks.
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// FOV shape as (height, width).
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn n_pixels(&self) -> usize {
        self.height * self.width
    }

    pub fn pixels(&self, idx: usize) -> Option<&PixelSet> {
        self.masks.get(idx)
    }

    pub fn masks(&self) -> &[PixelSet] {
        &self.masks
    }

    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    /// Rebuild mask `idx` as a 2-D boolean image.
    pub fn mask(&self, idx: usize) -> Option<DMatrix<bool>> {
        let pixels = self.masks.get(idx)?;
        Some(DMatrix::from_fn(self.height, self.width, |row, col| {
            pixels.contains(ravel_index_f(row, col, self.height))
        }))
    }

    /// Pixel-by-component matrix of shape (height * width, n).
    pub fn to_pixel_matrix(&self) -> DMatrix<bool> {
        DMatrix::from_fn(self.n_pixels(), self.len(), |pixel, comp| {
            self.masks[comp].contains(pixel)
        })
    }

    /// Subset of the masks (and centroids) at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let mut masks = Vec::with_capacity(indices.len());
        let mut centroids = Vec::with_capacity(indices.len());
        for &idx in indices {
            let mask = self.masks.get(idx).ok_or_else(|| {
                Error::InvalidInput(format!("mask index {} out of range for {} masks", idx, self.len()))
            })?;
            masks.push(mask.clone());
            centroids.push(self.centroids[idx]);
        }
        Ok(Self { height: self.height, width: self.width, masks, centroids })
    }
}
