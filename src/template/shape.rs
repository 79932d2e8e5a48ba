//! Silhouette loading and contour normalization.
//!
//! A silhouette is a dark shape on a light background. It is padded, inverted
//! and smoothed with a morphological opening before its border is traced.
//! The traced contour is then expressed relative to its minimum enclosing
//! circle: centered on the circle and divided by its diameter, so that one
//! normalized contour serves every template size.

use crate::geometry::{min_enclosing_circle, Circle, Point, PointF};
use crate::util::{LeafMatchError, LeafMatchResult};
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};

/// Constant border added around a silhouette before tracing.
pub const SHAPE_BORDER: u32 = 10;

/// Erosion and dilation passes (3x3 square element) of the opening.
pub const OPEN_ITERATIONS: u8 = 5;

/// Background level of the padding, before inversion.
const BACKGROUND: u8 = 255;

/// Silhouette pixels darker than this are foreground.
const FOREGROUND_THRESHOLD: u8 = 128;

/// Contour of one silhouette together with its normalized form.
#[derive(Clone, Debug)]
pub struct ShapeModel {
    contour: Vec<Point>,
    circle: Circle,
    normalized: Vec<PointF>,
    stem: [PointF; 2],
}

impl ShapeModel {
    /// Traces `silhouette` and normalizes its outer contour.
    ///
    /// The stem starts at the bottom of the enclosing circle and extends
    /// downward by `max_stem_length_ratio` diameters.
    pub fn from_silhouette(
        silhouette: &GrayImage,
        max_stem_length_ratio: f32,
    ) -> LeafMatchResult<Self> {
        let contour = extract_outer_contour(silhouette)?;
        let circle = min_enclosing_circle(&contour).ok_or(LeafMatchError::NoContour)?;
        let diameter = circle.diameter();
        if diameter < 1.0 {
            return Err(LeafMatchError::NoContour);
        }

        let normalized = contour
            .iter()
            .map(|p| {
                PointF::new(
                    ((p.x as f64 - circle.cx) / diameter) as f32,
                    ((p.y as f64 - circle.cy) / diameter) as f32,
                )
            })
            .collect();
        let stem = [
            PointF::new(0.0, 0.5),
            PointF::new(0.0, 0.5 + max_stem_length_ratio),
        ];

        Ok(Self {
            contour,
            circle,
            normalized,
            stem,
        })
    }

    /// Contour in padded silhouette coordinates.
    pub fn contour(&self) -> &[Point] {
        &self.contour
    }

    /// Minimum enclosing circle of the contour.
    pub fn circle(&self) -> Circle {
        self.circle
    }

    /// Contour centered on the enclosing circle, in diameters.
    pub fn normalized(&self) -> &[PointF] {
        &self.normalized
    }

    /// Stem base and tip, in the normalized frame.
    pub fn stem(&self) -> [PointF; 2] {
        self.stem
    }
}

/// Returns the single outer contour of a dark-on-light silhouette.
///
/// Fails with `NoContour` when nothing survives the opening and with
/// `AmbiguousShape` when more than one top-level blob remains.
pub fn extract_outer_contour(silhouette: &GrayImage) -> LeafMatchResult<Vec<Point>> {
    let binary = binarize_padded(silhouette);
    let opened = dilate(
        &erode(&binary, Norm::LInf, OPEN_ITERATIONS),
        Norm::LInf,
        OPEN_ITERATIONS,
    );

    let mut outer: Vec<Vec<Point>> = find_contours::<i32>(&opened)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points.iter().map(|p| Point::new(p.x, p.y)).collect())
        .collect();

    match outer.len() {
        0 => Err(LeafMatchError::NoContour),
        1 => Ok(outer.remove(0)),
        count => Err(LeafMatchError::AmbiguousShape { count }),
    }
}

/// Pads with the background level, then inverts into a 0/255 mask.
fn binarize_padded(silhouette: &GrayImage) -> GrayImage {
    let (width, height) = silhouette.dimensions();
    let padded_w = width + 2 * SHAPE_BORDER;
    let padded_h = height + 2 * SHAPE_BORDER;
    GrayImage::from_fn(padded_w, padded_h, |x, y| {
        let inside = x >= SHAPE_BORDER
            && y >= SHAPE_BORDER
            && x < width + SHAPE_BORDER
            && y < height + SHAPE_BORDER;
        let value = if inside {
            silhouette.get_pixel(x - SHAPE_BORDER, y - SHAPE_BORDER)[0]
        } else {
            BACKGROUND
        };
        if value < FOREGROUND_THRESHOLD {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{extract_outer_contour, ShapeModel, SHAPE_BORDER};
    use crate::util::LeafMatchError;
    use image::{GrayImage, Luma};

    fn silhouette_with_blocks(blocks: &[(u32, u32, u32)]) -> GrayImage {
        GrayImage::from_fn(80, 60, |x, y| {
            let hit = blocks
                .iter()
                .any(|&(bx, by, side)| x >= bx && x < bx + side && y >= by && y < by + side);
            if hit {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn square_contour_is_traced_in_padded_coordinates() {
        let img = silhouette_with_blocks(&[(10, 10, 30)]);
        let contour = extract_outer_contour(&img).unwrap();
        let min_x = contour.iter().map(|p| p.x).min().unwrap();
        let max_x = contour.iter().map(|p| p.x).max().unwrap();
        assert_eq!(min_x, 10 + SHAPE_BORDER as i32);
        assert_eq!(max_x, 39 + SHAPE_BORDER as i32);
    }

    #[test]
    fn small_specks_are_removed_by_opening() {
        let img = silhouette_with_blocks(&[(10, 10, 30), (60, 40, 4)]);
        assert!(extract_outer_contour(&img).is_ok());
    }

    #[test]
    fn two_blobs_are_ambiguous() {
        let img = silhouette_with_blocks(&[(2, 2, 20), (45, 30, 20)]);
        let err = extract_outer_contour(&img).err().unwrap();
        assert_eq!(err, LeafMatchError::AmbiguousShape { count: 2 });
    }

    #[test]
    fn blank_image_has_no_contour() {
        let img = GrayImage::from_pixel(20, 20, Luma([255]));
        assert_eq!(
            extract_outer_contour(&img).err().unwrap(),
            LeafMatchError::NoContour
        );
    }

    #[test]
    fn normalized_contour_fits_the_unit_diameter() {
        let img = silhouette_with_blocks(&[(10, 10, 30)]);
        let model = ShapeModel::from_silhouette(&img, 0.25).unwrap();
        let max_radius = model
            .normalized()
            .iter()
            .map(|p| (p.x * p.x + p.y * p.y).sqrt())
            .fold(0.0f32, f32::max);
        assert!((max_radius - 0.5).abs() < 1e-4);
        let [base, tip] = model.stem();
        assert_eq!(base.y, 0.5);
        assert!((tip.y - 0.75).abs() < 1e-6);
    }
}
