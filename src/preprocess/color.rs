//! sRGB to CIE L*a*b* conversion for plant segmentation.

use image::{GrayImage, Luma, RgbImage};
use palette::white_point::D65;
use palette::{FromColor, Lab, Srgb};

/// Converts one 8-bit sRGB pixel to `(L, a, b)` with `L` in [0, 100].
pub fn srgb_to_lab(rgb: [u8; 3]) -> (f32, f32, f32) {
    let [r, g, b] = rgb;
    let linear = Srgb::new(r, g, b).into_format::<f32>().into_linear::<f32>();
    let lab: Lab<D65, f32> = Lab::from_color(linear);
    (lab.l, lab.a, lab.b)
}

/// Encodes a chroma channel into 8 bits (`value + 128`).
fn encode_chroma(value: f32) -> u8 {
    (value + 128.0).round().clamp(0.0, 255.0) as u8
}

/// Segmentation value of one pixel: `|A - B|` of the 8-bit Lab encoding.
///
/// Green foliage has strongly negative a* and positive b*, so it separates
/// well from soil and gray backgrounds.
pub fn segmentation_value(rgb: [u8; 3]) -> u8 {
    let (_, a, b) = srgb_to_lab(rgb);
    let a = encode_chroma(a) as i16;
    let b = encode_chroma(b) as i16;
    (a - b).unsigned_abs() as u8
}

/// Maps a color image to its single-channel segmentation image.
pub fn segmentation_image(rgb: &RgbImage) -> GrayImage {
    let (width, height) = rgb.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        Luma([segmentation_value(rgb.get_pixel(x, y).0)])
    })
}
