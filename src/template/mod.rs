//! Template generation: shape -> size -> rotation.
//!
//! [`TemplateGenerator`] is a state machine. Each stage keeps the data it
//! produced, and accessors only answer once the stage that produces their data
//! has completed:
//!
//! ```text
//! Empty --load_shape--> ShapeLoaded --set_size--> SizeSet --set_rotation_step--> Ready
//! ```
//!
//! A failing operation drops back to the last completed stage. The two raster
//! buffers (outline and filled) are allocated once for the largest template
//! size and reused: every rotation clears and redraws only the template's
//! bounding box. Views returned by [`TemplateGenerator::template`] borrow the
//! generator, so they cannot outlive the next rotation step.

use crate::geometry::{Point, PointF, Rect};
use crate::image::io::ImageSource;
use crate::image::{ImageView, OwnedImage};
use crate::util::{LeafMatchError, LeafMatchResult};
use image::GrayImage;
use std::path::Path;

pub mod raster;
pub mod rotation;
pub mod shape;

pub use rotation::RotationTable;
pub use shape::ShapeModel;

/// Smallest template diameter in pixels.
pub const MIN_TEMPLATE_SIZE: f32 = 2.0;

/// Extra raster margin around the largest template.
const RASTER_MARGIN: usize = 4;

/// Completed stage of a [`TemplateGenerator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeneratorState {
    Empty,
    ShapeLoaded,
    SizeSet,
    Ready,
}

/// Geometry parameters of a [`TemplateGenerator`].
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Discretization of a full turn.
    pub num_rotation_steps: usize,
    /// Largest enclosing-circle diameter that will be requested, in pixels.
    pub max_template_size: f32,
    /// Stem length beyond the enclosing circle, in diameters.
    pub max_stem_length_ratio: f32,
    /// How far the stem tip may sit from the reference point, in pixels.
    pub shift_distance: i32,
    /// Largest tolerated fraction of template mass outside the mask.
    pub outside_mask_ratio: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_rotation_steps: 24,
            max_template_size: 64.0,
            max_stem_length_ratio: 0.1,
            shift_distance: 8,
            outside_mask_ratio: 0.1,
        }
    }
}

impl GeneratorConfig {
    /// Checks ranges; returns the first violation.
    pub fn validate(&self) -> LeafMatchResult<()> {
        if self.num_rotation_steps == 0 {
            return Err(LeafMatchError::InvalidConfig {
                reason: "num_rotation_steps must be > 0",
            });
        }
        if !self.max_template_size.is_finite() || self.max_template_size < MIN_TEMPLATE_SIZE {
            return Err(LeafMatchError::InvalidConfig {
                reason: "max_template_size must be finite and >= 2",
            });
        }
        if !self.max_stem_length_ratio.is_finite() || self.max_stem_length_ratio < 0.0 {
            return Err(LeafMatchError::InvalidConfig {
                reason: "max_stem_length_ratio must be finite and >= 0",
            });
        }
        if self.shift_distance < 0 {
            return Err(LeafMatchError::InvalidConfig {
                reason: "shift_distance must be >= 0",
            });
        }
        if !(0.0..=1.0).contains(&self.outside_mask_ratio) {
            return Err(LeafMatchError::InvalidConfig {
                reason: "outside_mask_ratio must lie in [0, 1]",
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct SizedTemplate {
    size: f32,
    contour: Vec<PointF>,
    stem: [PointF; 2],
}

#[derive(Clone, Debug)]
struct PlacedTemplate {
    step: usize,
    /// Template bounds in raster buffer coordinates.
    bbox: Rect,
    /// Contour relative to `bbox`'s top-left corner.
    contour: Vec<Point>,
    stem_tip: Point,
    matching_rect: Rect,
}

/// Stateful generator of rotated, scaled templates for one plant.
pub struct TemplateGenerator<'a> {
    cfg: GeneratorConfig,
    rotations: RotationTable,
    mask: ImageView<'a, u8>,
    reference: Point,
    max_rect: Rect,
    outline: OwnedImage<u8>,
    filled: OwnedImage<u8>,
    shape: Option<ShapeModel>,
    sized: Option<SizedTemplate>,
    placed: Option<PlacedTemplate>,
}

impl<'a> TemplateGenerator<'a> {
    /// Creates a generator for a plant.
    ///
    /// `mask` defines the coordinate space of `reference` and `max_rect`;
    /// `max_rect` is clamped to the mask bounds.
    pub fn new(
        cfg: GeneratorConfig,
        mask: ImageView<'a, u8>,
        reference: Point,
        max_rect: Rect,
    ) -> LeafMatchResult<Self> {
        cfg.validate()?;
        let rotations = RotationTable::new(cfg.num_rotation_steps)?;
        let max_rect = max_rect.intersection(Rect::from_size(mask.width(), mask.height()));
        if max_rect.is_empty() {
            return Err(LeafMatchError::InvalidInput("max_rect does not overlap the mask"));
        }
        let side = cfg.max_template_size.ceil() as usize + RASTER_MARGIN;
        Ok(Self {
            outline: OwnedImage::filled(side, side, 0)?,
            filled: OwnedImage::filled(side, side, 0)?,
            cfg,
            rotations,
            mask,
            reference,
            max_rect,
            shape: None,
            sized: None,
            placed: None,
        })
    }

    /// Returns the last completed stage.
    pub fn state(&self) -> GeneratorState {
        if self.placed.is_some() {
            GeneratorState::Ready
        } else if self.sized.is_some() {
            GeneratorState::SizeSet
        } else if self.shape.is_some() {
            GeneratorState::ShapeLoaded
        } else {
            GeneratorState::Empty
        }
    }

    /// Returns the generator configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.cfg
    }

    /// Returns the rotation table.
    pub fn rotations(&self) -> &RotationTable {
        &self.rotations
    }

    /// Side length of the square raster buffers.
    pub fn raster_side(&self) -> usize {
        self.outline.width()
    }

    fn require(&self, required: GeneratorState) -> LeafMatchResult<()> {
        let actual = self.state();
        if actual < required {
            return Err(LeafMatchError::NotReady { required, actual });
        }
        Ok(())
    }

    /// Loads a silhouette from the filesystem.
    pub fn load_shape<P: AsRef<Path>>(&mut self, path: P) -> LeafMatchResult<()> {
        self.load_shape_from(&crate::image::io::FsImageSource, path.as_ref())
    }

    /// Loads a silhouette through `source`.
    pub fn load_shape_from(
        &mut self,
        source: &dyn ImageSource,
        path: &Path,
    ) -> LeafMatchResult<()> {
        self.clear();
        let img = source.load_gray(path)?;
        self.load_shape_image(&img)
    }

    /// Traces and normalizes an already decoded silhouette.
    pub fn load_shape_image(&mut self, silhouette: &GrayImage) -> LeafMatchResult<()> {
        self.clear();
        self.shape = Some(ShapeModel::from_silhouette(
            silhouette,
            self.cfg.max_stem_length_ratio,
        )?);
        Ok(())
    }

    fn clear(&mut self) {
        self.shape = None;
        self.sized = None;
        self.placed = None;
    }

    /// Scales the normalized contour to an enclosing diameter of `size` pixels.
    pub fn set_size(&mut self, size: f32) -> LeafMatchResult<()> {
        self.require(GeneratorState::ShapeLoaded)?;
        self.sized = None;
        self.placed = None;

        if !size.is_finite() || size < MIN_TEMPLATE_SIZE || size > self.cfg.max_template_size {
            return Err(LeafMatchError::InvalidSize {
                size: size.max(0.0) as u32,
                min: MIN_TEMPLATE_SIZE as u32,
                max: self.cfg.max_template_size as u32,
            });
        }

        let shape = self.shape.as_ref().ok_or(LeafMatchError::NotReady {
            required: GeneratorState::ShapeLoaded,
            actual: GeneratorState::Empty,
        })?;
        let contour = shape.normalized().iter().map(|p| p.scale(size)).collect();
        let [base, tip] = shape.stem();
        self.sized = Some(SizedTemplate {
            size,
            contour,
            stem: [base.scale(size), tip.scale(size)],
        });
        Ok(())
    }

    /// Rotates the sized template, rasterizes it and derives the matching
    /// rectangle.
    pub fn set_rotation_step(&mut self, step: usize) -> LeafMatchResult<()> {
        self.require(GeneratorState::SizeSet)?;
        self.placed = None;

        let sized = self.sized.as_ref().ok_or(LeafMatchError::NotReady {
            required: GeneratorState::SizeSet,
            actual: GeneratorState::ShapeLoaded,
        })?;
        let center = (self.raster_side() / 2) as f32;
        let to_raster = |p: PointF| {
            let r = self.rotations.rotate(step, p);
            PointF::new(r.x + center, r.y + center).round()
        };

        let mut points: Vec<Point> = sized.contour.iter().map(|&p| to_raster(p)).collect();
        points.dedup();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        let stem_tip = to_raster(sized.stem[1]);
        let bbox = Rect::bounding(&points).ok_or(LeafMatchError::NoContour)?;
        let contour: Vec<Point> = points
            .iter()
            .map(|p| p.translate(-bbox.left, -bbox.top))
            .collect();

        self.rasterize(bbox, &contour)?;

        let matching_rect = matching_rect_for(
            bbox,
            stem_tip,
            self.cfg.shift_distance,
            self.reference,
            self.max_rect,
        );
        if matching_rect.width() <= bbox.width() || matching_rect.height() <= bbox.height() {
            return Err(LeafMatchError::SearchAreaTooSmall {
                rect_width: matching_rect.width().max(0) as usize,
                rect_height: matching_rect.height().max(0) as usize,
                tpl_width: bbox.width() as usize,
                tpl_height: bbox.height() as usize,
            });
        }

        self.placed = Some(PlacedTemplate {
            step,
            bbox,
            contour,
            stem_tip,
            matching_rect,
        });
        Ok(())
    }

    fn rasterize(&mut self, bbox: Rect, contour: &[Point]) -> LeafMatchResult<()> {
        let (x, y, w, h) = bbox
            .to_usize()
            .ok_or(LeafMatchError::InvalidInput("template bounds outside raster"))?;

        let mut outline = self.outline.view_mut();
        let mut outline = outline.roi_mut(x, y, w, h)?;
        outline.fill(0);
        raster::draw_antialiased_polygon(&mut outline, contour, u8::MAX);

        let mut filled = self.filled.view_mut();
        let mut filled = filled.roi_mut(x, y, w, h)?;
        filled.fill(0);
        raster::fill_polygon(&mut filled, contour, u8::MAX);
        Ok(())
    }

    fn placed(&self) -> LeafMatchResult<&PlacedTemplate> {
        self.placed.as_ref().ok_or(LeafMatchError::NotReady {
            required: GeneratorState::Ready,
            actual: self.state(),
        })
    }

    /// Returns the normalized contour of the loaded shape.
    pub fn normalized_contour(&self) -> LeafMatchResult<&[PointF]> {
        self.shape
            .as_ref()
            .map(ShapeModel::normalized)
            .ok_or(LeafMatchError::NotReady {
                required: GeneratorState::ShapeLoaded,
                actual: GeneratorState::Empty,
            })
    }

    /// Returns the contour scaled by the current size, centered on the
    /// enclosing circle.
    pub fn scaled_contour(&self) -> LeafMatchResult<&[PointF]> {
        self.require(GeneratorState::SizeSet)?;
        self.sized
            .as_ref()
            .map(|s| s.contour.as_slice())
            .ok_or(LeafMatchError::NotReady {
                required: GeneratorState::SizeSet,
                actual: self.state(),
            })
    }

    /// Returns the current template diameter in pixels.
    pub fn size(&self) -> LeafMatchResult<f32> {
        self.require(GeneratorState::SizeSet)?;
        Ok(self.sized.as_ref().map_or(0.0, |s| s.size))
    }

    /// Returns the rotation step the template was placed with.
    pub fn rotation_step(&self) -> LeafMatchResult<usize> {
        Ok(self.placed()?.step)
    }

    /// Returns the search window in mask coordinates.
    pub fn matching_rect(&self) -> LeafMatchResult<Rect> {
        Ok(self.placed()?.matching_rect)
    }

    /// Returns the anti-aliased outline raster, cropped to the template.
    ///
    /// Scoring samples the contour points directly; the outline is kept for
    /// callers that display or export the template.
    pub fn template(&self) -> LeafMatchResult<ImageView<'_, u8>> {
        let bbox = self.placed()?.bbox;
        raster_roi(&self.outline, bbox)
    }

    /// Returns the filled silhouette raster, cropped to the template.
    pub fn filled_template(&self) -> LeafMatchResult<ImageView<'_, u8>> {
        let bbox = self.placed()?.bbox;
        raster_roi(&self.filled, bbox)
    }

    /// Returns the contour relative to the template's top-left corner.
    pub fn template_contour(&self) -> LeafMatchResult<&[Point]> {
        Ok(&self.placed()?.contour)
    }

    /// Returns the stem tip relative to the template's top-left corner.
    pub fn stem_tip(&self) -> LeafMatchResult<Point> {
        let placed = self.placed()?;
        Ok(placed
            .stem_tip
            .translate(-placed.bbox.left, -placed.bbox.top))
    }

    /// Returns the template width and height.
    pub fn template_size(&self) -> LeafMatchResult<(usize, usize)> {
        let bbox = self.placed()?.bbox;
        Ok((bbox.width() as usize, bbox.height() as usize))
    }

    /// Returns the number of template placements along x and y inside the
    /// matching rectangle.
    pub fn result_size(&self) -> LeafMatchResult<(usize, usize)> {
        let placed = self.placed()?;
        let rect = placed.matching_rect;
        Ok((
            (rect.width() - placed.bbox.width() + 1) as usize,
            (rect.height() - placed.bbox.height() + 1) as usize,
        ))
    }

    /// Returns true if at most `outside_mask_ratio` of the filled template
    /// mass lies outside the mask when placed at `location`.
    ///
    /// `location` is relative to the matching rectangle's top-left corner.
    pub fn check_against_mask(&self, location: (usize, usize)) -> LeafMatchResult<bool> {
        let placed = self.placed()?;
        let (res_w, res_h) = self.result_size()?;
        if location.0 >= res_w {
            return Err(LeafMatchError::IndexOutOfBounds {
                index: location.0,
                len: res_w,
                context: "placement x",
            });
        }
        if location.1 >= res_h {
            return Err(LeafMatchError::IndexOutOfBounds {
                index: location.1,
                len: res_h,
                context: "placement y",
            });
        }

        let filled = raster_roi(&self.filled, placed.bbox)?;
        let origin_x = placed.matching_rect.left as usize + location.0;
        let origin_y = placed.matching_rect.top as usize + location.1;

        let mut total = 0u64;
        let mut outside = 0u64;
        for (ty, row) in filled.rows().enumerate() {
            for (tx, &mass) in row.iter().enumerate() {
                if mass == 0 {
                    continue;
                }
                total += u64::from(mass);
                let covered = self
                    .mask
                    .get(origin_x + tx, origin_y + ty)
                    .is_some_and(|&m| m != 0);
                if !covered {
                    outside += u64::from(mass);
                }
            }
        }
        if total == 0 {
            return Ok(false);
        }
        Ok(outside as f32 / total as f32 <= self.cfg.outside_mask_ratio)
    }
}

fn raster_roi(img: &OwnedImage<u8>, bbox: Rect) -> LeafMatchResult<ImageView<'_, u8>> {
    let (x, y, w, h) = bbox
        .to_usize()
        .ok_or(LeafMatchError::InvalidInput("template bounds outside raster"))?;
    img.view().roi(x, y, w, h)
}

/// Search window for a template whose stem tip must land within
/// `shift` pixels of `reference`.
///
/// Bounding rect of the stem-tip square and the shift-expanded template
/// bounds, moved so the stem tip sits on `reference`, then clamped to
/// `max_rect`. Computed in `i64` so any non-negative `shift` is safe.
fn matching_rect_for(
    bbox: Rect,
    stem_tip: Point,
    shift: i32,
    reference: Point,
    max_rect: Rect,
) -> Rect {
    let shift = i64::from(shift);
    let (tip_x, tip_y) = (i64::from(stem_tip.x), i64::from(stem_tip.y));
    let left = tip_x.min(i64::from(bbox.left)) - shift;
    let top = tip_y.min(i64::from(bbox.top)) - shift;
    let right = tip_x.max(i64::from(bbox.right) - 1) + shift + 1;
    let bottom = tip_y.max(i64::from(bbox.bottom) - 1) + shift + 1;

    let dx = i64::from(reference.x) - tip_x;
    let dy = i64::from(reference.y) - tip_y;
    let narrow = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    Rect::from_ltrb(
        narrow((left + dx).max(i64::from(max_rect.left))),
        narrow((top + dy).max(i64::from(max_rect.top))),
        narrow((right + dx).min(i64::from(max_rect.right))),
        narrow((bottom + dy).min(i64::from(max_rect.bottom))),
    )
}
