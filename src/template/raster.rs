//! Rasterization of closed contours into `u8` views.
//!
//! Drawing goes through `imageproc::drawing`. Coordinates are relative to the
//! view's top-left corner and pixels outside the view are clipped, so callers
//! may draw into a tight sub-view of a larger buffer.

use crate::geometry::Point;
use crate::image::ImageViewMut;
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_antialiased_line_segment_mut, draw_polygon_mut, Canvas};
use imageproc::point::Point as DrawPoint;

impl Canvas for ImageViewMut<'_, u8> {
    type Pixel = Luma<u8>;

    fn dimensions(&self) -> (u32, u32) {
        (self.width() as u32, self.height() as u32)
    }

    fn get_pixel(&self, x: u32, y: u32) -> Luma<u8> {
        Luma([self.get(x as usize, y as usize).copied().unwrap_or(0)])
    }

    fn draw_pixel(&mut self, x: u32, y: u32, color: Luma<u8>) {
        if let Some(px) = self.get_mut(x as usize, y as usize) {
            *px = color[0];
        }
    }
}

/// Draws the closed outline of `points` with 1 px anti-aliased (Wu) lines.
///
/// Coverage is blended with `max`, so overlapping segments never darken
/// each other.
pub fn draw_antialiased_polygon(view: &mut ImageViewMut<'_, u8>, points: &[Point], value: u8) {
    let ring = open_ring(points);
    if ring.is_empty() {
        return;
    }
    let mut scratch = GrayImage::new(view.width() as u32, view.height() as u32);
    let blend = |line: Luma<u8>, under: Luma<u8>, weight: f32| {
        let shade = (line[0] as f32 * weight.clamp(0.0, 1.0)).round() as u8;
        Luma([under[0].max(shade)])
    };
    for (idx, &start) in ring.iter().enumerate() {
        let end = ring[(idx + 1) % ring.len()];
        draw_antialiased_line_segment_mut(
            &mut scratch,
            (start.x, start.y),
            (end.x, end.y),
            Luma([value]),
            blend,
        );
    }

    for (x, y, shade) in scratch.enumerate_pixels() {
        if let Some(px) = view.get_mut(x as usize, y as usize) {
            *px = (*px).max(shade[0]);
        }
    }
}

/// Fills the polygon described by `points`, including its boundary pixels.
pub fn fill_polygon(view: &mut ImageViewMut<'_, u8>, points: &[Point], value: u8) {
    let ring = open_ring(points);
    match ring.as_slice() {
        [] => {}
        [p] => {
            if p.x >= 0 && p.y >= 0 {
                Canvas::draw_pixel(view, p.x as u32, p.y as u32, Luma([value]));
            }
        }
        _ => {
            let poly: Vec<DrawPoint<i32>> =
                ring.iter().map(|p| DrawPoint::new(p.x, p.y)).collect();
            draw_polygon_mut(view, &poly, Luma([value]));
        }
    }
}

/// Drops a trailing point equal to the first; polygons are closed implicitly.
fn open_ring(points: &[Point]) -> Vec<Point> {
    let mut ring = points.to_vec();
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::{draw_antialiased_polygon, fill_polygon};
    use crate::geometry::Point;
    use crate::image::OwnedImage;

    fn square(x0: i32, y0: i32, side: i32) -> Vec<Point> {
        vec![
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ]
    }

    #[test]
    fn fill_covers_square_including_boundary() {
        let mut img = OwnedImage::filled(10, 10, 0u8).unwrap();
        fill_polygon(&mut img.view_mut(), &square(2, 3, 4), 255);
        let count = img.data().iter().filter(|&&v| v == 255).count();
        assert_eq!(count, 25);
        assert_eq!(img.get(2, 3), Some(&255));
        assert_eq!(img.get(6, 7), Some(&255));
        assert_eq!(img.get(7, 7), Some(&0));
    }

    #[test]
    fn axis_aligned_outline_is_crisp() {
        let mut img = OwnedImage::filled(10, 10, 0u8).unwrap();
        draw_antialiased_polygon(&mut img.view_mut(), &square(1, 1, 5), 255);
        assert_eq!(img.get(1, 1), Some(&255));
        assert_eq!(img.get(6, 4), Some(&255));
        assert_eq!(img.get(3, 3), Some(&0));
        let lit = img.data().iter().filter(|&&v| v > 0).count();
        assert_eq!(lit, 20);
    }

    #[test]
    fn explicitly_closed_contours_are_accepted() {
        let mut closed = square(2, 2, 3);
        closed.push(Point::new(2, 2));
        let mut img = OwnedImage::filled(8, 8, 0u8).unwrap();
        fill_polygon(&mut img.view_mut(), &closed, 7);
        draw_antialiased_polygon(&mut img.view_mut(), &closed, 9);
        assert_eq!(img.data().iter().filter(|&&v| v > 0).count(), 16);
        assert_eq!(img.get(3, 3), Some(&7));
        assert_eq!(img.get(2, 2), Some(&9));
    }

    #[test]
    fn drawing_clips_to_the_view() {
        let mut img = OwnedImage::filled(6, 6, 0u8).unwrap();
        {
            let mut view = img.view_mut();
            let mut roi = view.roi_mut(2, 2, 2, 2).unwrap();
            fill_polygon(&mut roi, &square(-3, -3, 10), 100);
        }
        let lit = img.data().iter().filter(|&&v| v == 100).count();
        assert_eq!(lit, 4);
    }
}
