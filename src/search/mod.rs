//! Search orchestration: preprocessing, template sweep and result encoding.
//!
//! [`Segmenter`] owns the run configuration, the plant inputs and every
//! result buffer. A run either completes and replaces the previous results,
//! or fails early and leaves them untouched.
//!
//! Acceptance uses the minimum of the chamfer score field: lower scores mean
//! the contour sits on real edges. A hypothesis is accepted when the minimum
//! lies in `[min_match_threshold, max_match_threshold]` and the template
//! placed there stays inside the plant mask.

use crate::chamfer::ChamferScorer;
use crate::geometry::Point;
use crate::image::io::{gray_view, FsImageSource, ImageSource};
use crate::image::{ImageView, OwnedImage};
use crate::preprocess::{PlantPreprocessor, PreparedPlant, PreprocessConfig};
use crate::sink::{NullSink, RenderSink};
use crate::template::{GeneratorConfig, MIN_TEMPLATE_SIZE};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::math::round_i32;
use crate::util::{LeafMatchError, LeafMatchResult};
use image::GrayImage;
use std::path::PathBuf;

pub mod indicator;
mod sweep;

pub use indicator::{LeafIndicator, ScatterPoint};

/// Configuration of a segmentation run.
#[derive(Clone, Debug)]
pub struct SegmentationConfig {
    /// Downsampling factor applied before the search (>= 1).
    pub reduction_factor: u32,
    /// Crop padding around the plant, as a ratio of its width and height.
    pub plant_padding: f32,
    /// Sobel magnitude above which a pixel is an edge.
    pub edge_threshold: f32,
    /// Discretization of a full turn.
    pub num_rotation_steps: usize,
    /// Template diameters as ratios of the plant extent.
    pub template_sizes: Vec<f32>,
    /// When set, replaces `template_sizes` with this many evenly spaced
    /// ratios over `(0, max_template_plant_ratio]`.
    pub generate_template_sizes: Option<usize>,
    /// Silhouette files, one per shape id.
    pub template_shape_paths: Vec<PathBuf>,
    /// Diameter of the region the stem tip may occupy, relative to the
    /// plant extent.
    pub plant_center_size: f32,
    /// Largest template diameter, relative to the plant extent.
    pub max_template_plant_ratio: f32,
    /// Stem length beyond the enclosing circle, in template diameters.
    pub max_stem_length_ratio: f32,
    pub min_match_threshold: f32,
    pub max_match_threshold: f32,
    /// Largest tolerated fraction of template mass outside the mask.
    pub outside_mask_ratio: f32,
    /// Sweep shapes in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        let pre = PreprocessConfig::default();
        Self {
            reduction_factor: pre.reduction_factor,
            plant_padding: pre.plant_padding,
            edge_threshold: pre.edge_threshold,
            num_rotation_steps: 24,
            template_sizes: vec![0.2, 0.3, 0.4, 0.5],
            generate_template_sizes: None,
            template_shape_paths: Vec::new(),
            plant_center_size: 0.3,
            max_template_plant_ratio: 0.6,
            max_stem_length_ratio: 0.1,
            min_match_threshold: 0.0,
            max_match_threshold: 0.1,
            outside_mask_ratio: 0.1,
            parallel: false,
        }
    }
}

impl SegmentationConfig {
    /// Checks ranges; returns the first violation.
    pub fn validate(&self) -> LeafMatchResult<()> {
        self.preprocess_config().validate()?;
        if self.num_rotation_steps == 0 {
            return Err(LeafMatchError::InvalidConfig {
                reason: "num_rotation_steps must be > 0",
            });
        }
        if self.generate_template_sizes == Some(0) {
            return Err(LeafMatchError::InvalidConfig {
                reason: "generate_template_sizes must be > 0",
            });
        }
        if self.generate_template_sizes.is_none()
            && self
                .template_sizes
                .iter()
                .any(|s| !s.is_finite() || *s <= 0.0)
        {
            return Err(LeafMatchError::InvalidConfig {
                reason: "template_sizes must be finite and > 0",
            });
        }
        if !self.plant_center_size.is_finite() || self.plant_center_size < 0.0 {
            return Err(LeafMatchError::InvalidConfig {
                reason: "plant_center_size must be finite and >= 0",
            });
        }
        if !self.max_template_plant_ratio.is_finite() || self.max_template_plant_ratio <= 0.0 {
            return Err(LeafMatchError::InvalidConfig {
                reason: "max_template_plant_ratio must be finite and > 0",
            });
        }
        if !self.max_stem_length_ratio.is_finite() || self.max_stem_length_ratio < 0.0 {
            return Err(LeafMatchError::InvalidConfig {
                reason: "max_stem_length_ratio must be finite and >= 0",
            });
        }
        if !self.min_match_threshold.is_finite()
            || !self.max_match_threshold.is_finite()
            || self.min_match_threshold > self.max_match_threshold
        {
            return Err(LeafMatchError::InvalidConfig {
                reason: "match thresholds must be finite with min <= max",
            });
        }
        if !(0.0..=1.0).contains(&self.outside_mask_ratio) {
            return Err(LeafMatchError::InvalidConfig {
                reason: "outside_mask_ratio must lie in [0, 1]",
            });
        }
        Ok(())
    }

    /// Preprocessing subset of the configuration.
    pub fn preprocess_config(&self) -> PreprocessConfig {
        PreprocessConfig {
            reduction_factor: self.reduction_factor,
            plant_padding: self.plant_padding,
            edge_threshold: self.edge_threshold,
        }
    }

    /// Size ratios the sweep will use.
    pub fn effective_template_sizes(&self) -> Vec<f32> {
        match self.generate_template_sizes {
            Some(count) => (1..=count)
                .map(|i| self.max_template_plant_ratio * i as f32 / count as f32)
                .collect(),
            None => self.template_sizes.clone(),
        }
    }

    /// Generator geometry for a plant of the given extent.
    pub fn generator_config(&self, plant_extent: f32) -> GeneratorConfig {
        GeneratorConfig {
            num_rotation_steps: self.num_rotation_steps,
            max_template_size: (self.max_template_plant_ratio * plant_extent)
                .max(MIN_TEMPLATE_SIZE),
            max_stem_length_ratio: self.max_stem_length_ratio,
            shift_distance: round_i32(self.plant_center_size * plant_extent / 2.0),
            outside_mask_ratio: self.outside_mask_ratio,
        }
    }
}

/// Plant inputs of a run.
#[derive(Clone, Debug, Default)]
pub struct PlantParams {
    pub image_path: PathBuf,
    pub mask_path: PathBuf,
    /// Stem reference point in full-resolution photograph coordinates.
    pub center: Point,
}

/// One accepted (shape, size, rotation) hypothesis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeafMatch {
    pub shape_id: usize,
    pub size_id: usize,
    pub rotation_id: usize,
    /// Mean normalized chamfer distance (lower is better).
    pub score: f32,
    /// Template top-left corner in cropped plant coordinates.
    pub position: Point,
    /// Template diameter in pixels.
    pub size_px: f32,
    pub angle_deg: f32,
}

/// Runs leaf segmentation for one plant.
pub struct Segmenter {
    cfg: SegmentationConfig,
    params: PlantParams,
    sizes: Vec<f32>,
    source: Box<dyn ImageSource>,
    sink: Box<dyn RenderSink>,
    indicator: LeafIndicator,
    matches: Vec<LeafMatch>,
    accumulation: Option<OwnedImage<f32>>,
    plant: Option<PreparedPlant>,
}

impl Segmenter {
    /// Validates `cfg` and sizes the Leaf Indicator.
    pub fn new(cfg: SegmentationConfig, params: PlantParams) -> LeafMatchResult<Self> {
        cfg.validate()?;
        let sizes = cfg.effective_template_sizes();
        let indicator = LeafIndicator::new(
            cfg.template_shape_paths.len(),
            sizes.len(),
            cfg.num_rotation_steps,
        );
        Ok(Self {
            cfg,
            params,
            sizes,
            source: Box::new(FsImageSource),
            sink: Box::new(NullSink),
            indicator,
            matches: Vec::new(),
            accumulation: None,
            plant: None,
        })
    }

    /// Replaces the filesystem image source.
    pub fn with_source<S: ImageSource + 'static>(mut self, source: S) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Replaces the render sink.
    pub fn with_sink<R: RenderSink + 'static>(mut self, sink: R) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.cfg
    }

    pub fn params(&self) -> &PlantParams {
        &self.params
    }

    /// Size ratios in size-id order.
    pub fn template_sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn indicator(&self) -> &LeafIndicator {
        &self.indicator
    }

    /// Accepted hypotheses in sweep order.
    pub fn matches(&self) -> &[LeafMatch] {
        &self.matches
    }

    /// Summed footprints of accepted templates, in cropped coordinates.
    pub fn accumulation(&self) -> Option<ImageView<'_, f32>> {
        self.accumulation.as_ref().map(OwnedImage::view)
    }

    /// Preprocessed plant of the last successful run.
    pub fn prepared_plant(&self) -> Option<&PreparedPlant> {
        self.plant.as_ref()
    }

    /// Loads the plant photograph and mask, preprocesses them and sweeps
    /// every template hypothesis.
    pub fn run_segmentation(&mut self) -> LeafMatchResult<()> {
        let _span = trace_span!("segmentation").entered();
        let rgb = self.source.load_color(&self.params.image_path)?;
        let mask = self.source.load_gray(&self.params.mask_path)?;
        let plant = PlantPreprocessor::new(self.cfg.preprocess_config())?.prepare(
            &rgb,
            &mask,
            self.params.center,
        )?;
        self.run_prepared(plant)
    }

    /// Sweeps every template hypothesis over an already prepared plant.
    pub fn run_prepared(&mut self, plant: PreparedPlant) -> LeafMatchResult<()> {
        let scorer = ChamferScorer::new(&plant.edges)?;
        self.sink.show("segmentation", gray_view(&plant.segmentation)?);
        self.sink.show("mask", gray_view(&plant.mask)?);
        self.sink.show("edges", gray_view(&plant.edges)?);

        let shapes = self.load_shapes();
        let ctx = sweep::SweepContext {
            plant: &plant,
            scorer: &scorer,
            sizes: &self.sizes,
            generator: self.cfg.generator_config(plant.extent),
            min_match_threshold: self.cfg.min_match_threshold,
            max_match_threshold: self.cfg.max_match_threshold,
        };
        let outcomes = sweep::sweep_shapes(&ctx, &shapes, self.cfg.parallel)?;

        let (width, height) = (plant.edges.width() as usize, plant.edges.height() as usize);
        let mut indicator = self.indicator.clone();
        indicator.clear();
        let mut accumulation = OwnedImage::filled(width, height, 0.0f32)?;
        let mut matches = Vec::new();
        for outcome in outcomes {
            for m in &outcome.matches {
                indicator.set(m.shape_id, m.size_id, m.rotation_id)?;
            }
            for (acc, &v) in accumulation
                .data_mut()
                .iter_mut()
                .zip(outcome.accumulation.data())
            {
                *acc += v;
            }
            matches.extend(outcome.matches);
        }

        trace_event!(
            "segmentation_done",
            matches = matches.len(),
            slots = indicator.len(),
        );
        let preview = accumulation_preview(&accumulation)?;
        self.sink.show("accumulation", gray_view(&preview)?);

        self.indicator = indicator;
        self.matches = matches;
        self.accumulation = Some(accumulation);
        self.plant = Some(plant);
        Ok(())
    }

    /// Decodes every silhouette; unreadable ones are logged and skipped.
    fn load_shapes(&self) -> Vec<(usize, GrayImage)> {
        let mut shapes = Vec::with_capacity(self.cfg.template_shape_paths.len());
        for (shape_id, path) in self.cfg.template_shape_paths.iter().enumerate() {
            match self.source.load_gray(path) {
                Ok(img) => shapes.push((shape_id, img)),
                Err(err) => {
                    let reason = err.to_string();
                    trace_warn!("shape_skipped", shape_id = shape_id, reason = reason.as_str());
                }
            }
        }
        shapes
    }
}

/// Scales the accumulation buffer to 8 bits for display.
fn accumulation_preview(accumulation: &OwnedImage<f32>) -> LeafMatchResult<GrayImage> {
    let max = accumulation.data().iter().copied().fold(0.0f32, f32::max);
    let scale = if max > 0.0 { 255.0 / max } else { 0.0 };
    let bytes = accumulation.map(|v| (v * scale).round().clamp(0.0, 255.0) as u8);
    crate::image::io::gray_image_from_owned(&bytes)
}
