//! Per-pair mask distance functions.

use crate::PixelSet;

/// Upper bound applied to the distance of a fully enclosed mask.
pub const ENCLOSED_MAX_DISTANCE: f64 = 0.5;

/// Jaccard distance (1 - IoU) between two masks.
///
/// `union` is the elementwise sum of both masks, so the overlap is counted
/// twice; `union - intersection` is the true set union. Two empty masks have
/// distance 1.
pub fn jaccard_distance(left: &PixelSet, right: &PixelSet) -> f64 {
    let union = left.count() + right.count();
    let intersection = left.intersection_count(right);
    jaccard_from_counts(union, intersection)
}

#[inline]
pub(crate) fn jaccard_from_counts(union: usize, intersection: usize) -> f64 {
    if union > 0 {
        1.0 - intersection as f64 / (union - intersection) as f64
    } else {
        1.0
    }
}

/// Cap the distance of a left mask enclosed in the right one.
///
/// A small mask lying entirely inside a larger one is not penalized as a poor
/// match: its distance is capped at [`ENCLOSED_MAX_DISTANCE`].
#[inline]
pub fn enclosure_clamp(distance: f64, enclosed: bool) -> f64 {
    if enclosed {
        distance.min(ENCLOSED_MAX_DISTANCE)
    } else {
        distance
    }
}

/// Distance between two masks whose centroids are within range.
///
/// With `relax_enclosed`, a left mask whose every pixel is in the right mask
/// gets its distance clamped by [`enclosure_clamp`].
pub fn mask_distance(left: &PixelSet, right: &PixelSet, relax_enclosed: bool) -> f64 {
    let union = left.count() + right.count();
    if union == 0 {
        return 1.0;
    }
    let intersection = left.intersection_count(right);
    let distance = jaccard_from_counts(union, intersection);
    enclosure_clamp(distance, relax_enclosed && intersection == left.count())
}
