//! Sobel edge map with inverted polarity.

use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Value of non-edge pixels in the edge map.
pub const BACKGROUND: u8 = u8::MAX;

/// Value of edge pixels in the edge map.
pub const EDGE: u8 = 0;

/// Thresholds the Sobel gradient magnitude of `img`.
///
/// Pixels whose magnitude exceeds `threshold` become [`EDGE`]; all others
/// become [`BACKGROUND`].
pub fn edge_map(img: &GrayImage, threshold: f32) -> GrayImage {
    let gx = horizontal_sobel(img);
    let gy = vertical_sobel(img);
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let dx = gx.get_pixel(x, y)[0] as f32;
        let dy = gy.get_pixel(x, y)[0] as f32;
        if (dx * dx + dy * dy).sqrt() <= threshold {
            Luma([BACKGROUND])
        } else {
            Luma([EDGE])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{edge_map, BACKGROUND, EDGE};
    use image::{GrayImage, Luma};

    #[test]
    fn flat_image_has_no_edges() {
        let img = GrayImage::from_pixel(8, 8, Luma([77]));
        let edges = edge_map(&img, 10.0);
        assert!(edges.pixels().all(|p| p[0] == BACKGROUND));
    }

    #[test]
    fn step_produces_edges_on_both_sides() {
        let img = GrayImage::from_fn(10, 6, |x, _| if x >= 5 { Luma([200]) } else { Luma([0]) });
        let edges = edge_map(&img, 50.0);
        assert_eq!(edges.get_pixel(4, 3)[0], EDGE);
        assert_eq!(edges.get_pixel(5, 3)[0], EDGE);
        assert_eq!(edges.get_pixel(1, 3)[0], BACKGROUND);
        assert_eq!(edges.get_pixel(8, 3)[0], BACKGROUND);
    }
}
