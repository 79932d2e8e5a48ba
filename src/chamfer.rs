//! Chamfer scoring of a contour against an edge map.
//!
//! The distance map holds, for every pixel, the L1 distance to the nearest
//! edge pixel, normalized to [0, 1]. A contour placed with its local origin at
//! `(x, y)` scores the mean distance sampled under its points. Scoring a
//! whole window is done by summing one shifted sub-view of the distance map
//! per contour point, so the cost is `points x window area` additions.

use crate::geometry::Point;
use crate::image::io::owned_from_gray_image;
use crate::image::{ImageView, ImageViewMut, OwnedImage};
use crate::preprocess::edges::EDGE;
use crate::util::{LeafMatchError, LeafMatchResult};
use image::{GrayImage, Luma};
use imageproc::distance_transform::{distance_transform, Norm};

/// Normalized distance map and sliding chamfer accumulation.
#[derive(Clone, Debug)]
pub struct ChamferScorer {
    distance: OwnedImage<f32>,
}

impl ChamferScorer {
    /// Builds the distance map of `edges`, whose edge pixels are 0.
    ///
    /// Distances saturate at 255 px before normalization. A map without
    /// edges is all ones; a map made only of edges is all zeros.
    pub fn new(edges: &GrayImage) -> LeafMatchResult<Self> {
        if edges.width() == 0 || edges.height() == 0 {
            return Err(LeafMatchError::InvalidDimensions {
                width: edges.width() as usize,
                height: edges.height() as usize,
            });
        }
        let features = GrayImage::from_fn(edges.width(), edges.height(), |x, y| {
            if edges.get_pixel(x, y)[0] == EDGE {
                Luma([u8::MAX])
            } else {
                Luma([0])
            }
        });
        let raw = owned_from_gray_image(&distance_transform(&features, Norm::L1))?;
        let max = raw.data().iter().copied().max().unwrap_or(0);
        let distance = if max == 0 {
            raw.map(|_| 0.0)
        } else {
            let scale = 1.0 / max as f32;
            raw.map(|d| d as f32 * scale)
        };
        Ok(Self { distance })
    }

    /// Wraps an already computed distance map.
    pub fn from_distance_map(distance: OwnedImage<f32>) -> Self {
        Self { distance }
    }

    pub fn distance_map(&self) -> ImageView<'_, f32> {
        self.distance.view()
    }

    /// Adds the mean chamfer distance of `contour` into `result`.
    ///
    /// `result[(x, y)]` receives the mean of the distance map sampled at
    /// `origin + (x, y) + q` over every contour point `q`. `result` is not
    /// cleared here; callers zero it before the first contour.
    pub fn run_matching(
        &self,
        contour: &[Point],
        origin: Point,
        result: &mut ImageViewMut<'_, f32>,
    ) -> LeafMatchResult<()> {
        if contour.is_empty() {
            return Err(LeafMatchError::InvalidInput("contour is empty"));
        }
        let (width, height) = (result.width(), result.height());
        let map = self.distance.view();
        let mut windows = Vec::with_capacity(contour.len());
        for q in contour {
            let x = origin.x + q.x;
            let y = origin.y + q.y;
            if x < 0 || y < 0 {
                return Err(LeafMatchError::RoiOutOfBounds {
                    x: x.max(0) as usize,
                    y: y.max(0) as usize,
                    width,
                    height,
                    img_width: map.width(),
                    img_height: map.height(),
                });
            }
            windows.push(map.roi(x as usize, y as usize, width, height)?);
        }

        let scale = 1.0 / contour.len() as f32;
        for y in 0..height {
            let Some(out) = result.row_mut(y) else {
                continue;
            };
            for window in &windows {
                if let Some(src) = window.row(y) {
                    for (dst, &d) in out.iter_mut().zip(src) {
                        *dst += d * scale;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ChamferScorer;
    use crate::geometry::Point;
    use crate::image::OwnedImage;
    use image::{GrayImage, Luma};

    fn edges_with_column(width: u32, height: u32, column: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            if x == column {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn distance_is_normalized_l1_to_edges() {
        let scorer = ChamferScorer::new(&edges_with_column(9, 3, 2)).unwrap();
        let map = scorer.distance_map();
        assert_eq!(map.get(2, 1), Some(&0.0));
        assert_eq!(map.get(8, 0), Some(&1.0));
        assert!((map.get(5, 0).unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn degenerate_maps() {
        let none = ChamferScorer::new(&GrayImage::from_pixel(4, 4, Luma([255]))).unwrap();
        assert!(none.distance_map().as_slice().iter().all(|&d| d == 1.0));
        let all = ChamferScorer::new(&GrayImage::new(4, 4)).unwrap();
        assert!(all.distance_map().as_slice().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn vertical_contour_scores_zero_on_the_edge() {
        let scorer = ChamferScorer::new(&edges_with_column(12, 12, 6)).unwrap();
        let contour: Vec<Point> = (0..4).map(|y| Point::new(0, y)).collect();
        let mut result = OwnedImage::filled(8, 4, 0.0f32).unwrap();
        scorer
            .run_matching(&contour, Point::new(0, 2), &mut result.view_mut())
            .unwrap();
        assert_eq!(result.get(6, 0), Some(&0.0));
        assert!(result.get(5, 0).unwrap() > &0.0);
    }

    #[test]
    fn matching_is_linear_in_the_distance_map() {
        let data: Vec<f32> = (0..100).map(|i| ((i * 37) % 11) as f32 / 10.0).collect();
        let doubled: Vec<f32> = data.iter().map(|d| d * 2.0).collect();
        let a = ChamferScorer::from_distance_map(OwnedImage::new(data, 10, 10).unwrap());
        let b = ChamferScorer::from_distance_map(OwnedImage::new(doubled, 10, 10).unwrap());
        let contour = [Point::new(0, 0), Point::new(2, 1), Point::new(1, 3)];

        let mut ra = OwnedImage::filled(5, 5, 0.0f32).unwrap();
        let mut rb = OwnedImage::filled(5, 5, 0.0f32).unwrap();
        a.run_matching(&contour, Point::new(1, 1), &mut ra.view_mut()).unwrap();
        b.run_matching(&contour, Point::new(1, 1), &mut rb.view_mut()).unwrap();
        for (x, y) in ra.data().iter().zip(rb.data()) {
            assert!((2.0 * x - y).abs() < 1e-5);
        }

        // Point at (2, 1), placement (0, 0) samples the map at (3, 2).
        let single = [Point::new(2, 1)];
        let mut rs = OwnedImage::filled(5, 5, 0.0f32).unwrap();
        a.run_matching(&single, Point::new(1, 1), &mut rs.view_mut()).unwrap();
        assert_eq!(rs.get(0, 0), a.distance_map().get(3, 2));
    }

    #[test]
    fn rejects_out_of_range_placements() {
        let scorer = ChamferScorer::new(&edges_with_column(8, 8, 3)).unwrap();
        let mut result = OwnedImage::filled(4, 4, 0.0f32).unwrap();
        let far = [Point::new(6, 0)];
        let err = scorer.run_matching(&far, Point::new(0, 0), &mut result.view_mut());
        assert!(err.is_err());
        assert!(scorer
            .run_matching(&[], Point::new(0, 0), &mut result.view_mut())
            .is_err());
    }
}
