//! Plant preprocessing: color photograph and mask to a cropped edge map.
//!
//! The pipeline runs in a fixed order:
//! 1. color to segmentation image (`|A - B|` of the Lab encoding),
//! 2. optional resolution reduction,
//! 3. masking,
//! 4. plant bounding rectangle,
//! 5. padded crop,
//! 6. inverted Sobel edge map.
//!
//! All outputs of [`PreparedPlant`] share the cropped coordinate space.

use crate::geometry::{Point, Rect};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{diagonal, round_i32};
use crate::util::{LeafMatchError, LeafMatchResult};
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

pub mod color;
pub mod edges;

/// Preprocessing parameters.
#[derive(Clone, Debug)]
pub struct PreprocessConfig {
    /// Downsampling factor applied to the segmentation image (>= 1).
    pub reduction_factor: u32,
    /// Crop padding around the plant, as a ratio of its width and height.
    pub plant_padding: f32,
    /// Sobel magnitude above which a pixel is an edge.
    pub edge_threshold: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            reduction_factor: 4,
            plant_padding: 0.1,
            edge_threshold: 100.0,
        }
    }
}

impl PreprocessConfig {
    /// Checks ranges; returns the first violation.
    pub fn validate(&self) -> LeafMatchResult<()> {
        if self.reduction_factor == 0 {
            return Err(LeafMatchError::InvalidConfig {
                reason: "reduction_factor must be >= 1",
            });
        }
        if !self.plant_padding.is_finite() || self.plant_padding < 0.0 {
            return Err(LeafMatchError::InvalidConfig {
                reason: "plant_padding must be finite and >= 0",
            });
        }
        if !self.edge_threshold.is_finite() || self.edge_threshold < 0.0 {
            return Err(LeafMatchError::InvalidConfig {
                reason: "edge_threshold must be finite and >= 0",
            });
        }
        Ok(())
    }
}

/// Preprocessed plant in cropped coordinates.
#[derive(Clone, Debug)]
pub struct PreparedPlant {
    /// Masked, cropped segmentation image.
    pub segmentation: GrayImage,
    /// Cropped mask.
    pub mask: GrayImage,
    /// Edge map; edges are 0, everything else 255.
    pub edges: GrayImage,
    /// Stem reference point.
    pub reference: Point,
    /// Crop region in (reduced) segmentation coordinates.
    pub crop: Rect,
    /// Unpadded plant bounds.
    pub plant_rect: Rect,
    /// Diagonal of `plant_rect` in pixels.
    pub extent: f32,
}

impl PreparedPlant {
    /// Rect covering the whole cropped image.
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.edges.width() as usize, self.edges.height() as usize)
    }
}

/// Runs the preprocessing pipeline with a fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct PlantPreprocessor {
    cfg: PreprocessConfig,
}

impl PlantPreprocessor {
    pub fn new(cfg: PreprocessConfig) -> LeafMatchResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.cfg
    }

    /// Full pipeline from a color photograph.
    ///
    /// `center` is given in full-resolution photograph coordinates.
    pub fn prepare(
        &self,
        rgb: &RgbImage,
        mask: &GrayImage,
        center: Point,
    ) -> LeafMatchResult<PreparedPlant> {
        let _span = trace_span!("preprocess", width = rgb.width(), height = rgb.height()).entered();
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(LeafMatchError::InvalidDimensions {
                width: rgb.width() as usize,
                height: rgb.height() as usize,
            });
        }
        let segmentation = color::segmentation_image(rgb);
        let (segmentation, reference) = self.reduce(segmentation, center);
        self.prepare_segmentation(segmentation, mask, reference)
    }

    /// Masking, cropping and edge detection of an existing segmentation image.
    ///
    /// No resolution reduction is applied; `reference` is in `segmentation`
    /// coordinates.
    pub fn prepare_segmentation(
        &self,
        segmentation: GrayImage,
        mask: &GrayImage,
        reference: Point,
    ) -> LeafMatchResult<PreparedPlant> {
        let (width, height) = segmentation.dimensions();
        if width == 0 || height == 0 {
            return Err(LeafMatchError::InvalidDimensions {
                width: width as usize,
                height: height as usize,
            });
        }
        let mask = if mask.dimensions() == (width, height) {
            mask.clone()
        } else {
            imageops::resize(mask, width, height, FilterType::Triangle)
        };

        let mut segmentation = segmentation;
        for (px, m) in segmentation.pixels_mut().zip(mask.pixels()) {
            if m[0] == 0 {
                px[0] = 0;
            }
        }

        let plant = plant_bounds(&segmentation).ok_or(LeafMatchError::EmptyPlant)?;
        let pad_x = round_i32(plant.width() as f32 * self.cfg.plant_padding);
        let pad_y = round_i32(plant.height() as f32 * self.cfg.plant_padding);
        let crop = Rect::from_ltrb(
            plant.left - pad_x,
            plant.top - pad_y,
            plant.right + pad_x,
            plant.bottom + pad_y,
        )
        .intersection(Rect::from_size(width as usize, height as usize));
        let (cx, cy, cw, ch) = crop.to_usize().ok_or(LeafMatchError::EmptyPlant)?;
        let (cx, cy, cw, ch) = (cx as u32, cy as u32, cw as u32, ch as u32);

        let segmentation = imageops::crop_imm(&segmentation, cx, cy, cw, ch).to_image();
        let mask = imageops::crop_imm(&mask, cx, cy, cw, ch).to_image();
        let edges = edges::edge_map(&segmentation, self.cfg.edge_threshold);
        let plant_rect = plant.translate(-crop.left, -crop.top);
        let extent = diagonal(plant.width() as usize, plant.height() as usize);

        trace_event!(
            "plant_cropped",
            crop_width = cw,
            crop_height = ch,
            extent = extent,
        );

        Ok(PreparedPlant {
            segmentation,
            mask,
            edges,
            reference: reference.translate(-crop.left, -crop.top),
            crop,
            plant_rect,
            extent,
        })
    }

    fn reduce(&self, segmentation: GrayImage, center: Point) -> (GrayImage, Point) {
        let factor = self.cfg.reduction_factor;
        if factor <= 1 {
            return (segmentation, center);
        }
        let width = (segmentation.width() / factor).max(1);
        let height = (segmentation.height() / factor).max(1);
        let reduced = imageops::resize(&segmentation, width, height, FilterType::Triangle);
        let f = factor as f32;
        let reference = Point::new(round_i32(center.x as f32 / f), round_i32(center.y as f32 / f));
        (reduced, reference)
    }
}

/// Bounding rect of the non-zero pixels, or `None` when all are zero.
fn plant_bounds(img: &GrayImage) -> Option<Rect> {
    let mut bounds: Option<Rect> = None;
    for (x, y, px) in img.enumerate_pixels() {
        if px[0] == 0 {
            continue;
        }
        let (x, y) = (x as i32, y as i32);
        bounds = Some(match bounds {
            None => Rect::from_ltrb(x, y, x + 1, y + 1),
            Some(r) => Rect::from_ltrb(
                r.left.min(x),
                r.top.min(y),
                r.right.max(x + 1),
                r.bottom.max(y + 1),
            ),
        });
    }
    bounds
}
