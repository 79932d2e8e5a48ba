//! Extreme-value search over score fields.

use crate::image::ImageView;
use std::cmp::Ordering;

/// Score and location of one extreme of a score field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// X coordinate (column) of the peak.
    pub x: usize,
    /// Y coordinate (row) of the peak.
    pub y: usize,
    /// Score at the peak location.
    pub score: f32,
}

/// Minimum and maximum of a score field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extremes {
    pub min: Peak,
    pub max: Peak,
}

/// Finds the minimum and maximum of `scores`, ignoring NaN.
///
/// Ties keep the first location in row-major order. Returns `None` when the
/// view is empty or holds only NaN.
pub fn find_extremes(scores: ImageView<'_, f32>) -> Option<Extremes> {
    let mut extremes: Option<Extremes> = None;
    for (y, row) in scores.rows().enumerate() {
        for (x, &score) in row.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            let peak = Peak { x, y, score };
            match extremes.as_mut() {
                None => extremes = Some(Extremes { min: peak, max: peak }),
                Some(e) => {
                    if score.total_cmp(&e.min.score) == Ordering::Less {
                        e.min = peak;
                    }
                    if score.total_cmp(&e.max.score) == Ordering::Greater {
                        e.max = peak;
                    }
                }
            }
        }
    }
    extremes
}
