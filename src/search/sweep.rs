//! Shape x size x rotation sweep for one prepared plant.
//!
//! Each shape is swept with its own generator, result buffer and
//! accumulation buffer, so shapes can run sequentially or in parallel and
//! produce identical outcomes once merged in shape order.

use crate::candidate::find_extremes;
use crate::chamfer::ChamferScorer;
use crate::geometry::Point;
use crate::image::io::gray_view;
use crate::image::OwnedImage;
use crate::preprocess::PreparedPlant;
use crate::search::LeafMatch;
use crate::template::{GeneratorConfig, TemplateGenerator};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::LeafMatchResult;
use image::GrayImage;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Inputs shared by every shape of a sweep.
pub(crate) struct SweepContext<'a> {
    pub plant: &'a PreparedPlant,
    pub scorer: &'a ChamferScorer,
    /// Template sizes as ratios of the plant extent.
    pub sizes: &'a [f32],
    pub generator: GeneratorConfig,
    pub min_match_threshold: f32,
    pub max_match_threshold: f32,
}

/// Matches and footprint accumulation of one shape.
pub(crate) struct ShapeOutcome {
    pub matches: Vec<LeafMatch>,
    pub accumulation: OwnedImage<f32>,
}

/// Sweeps every decoded shape, in shape order.
pub(crate) fn sweep_shapes(
    ctx: &SweepContext<'_>,
    shapes: &[(usize, GrayImage)],
    parallel: bool,
) -> LeafMatchResult<Vec<ShapeOutcome>> {
    let _span = trace_span!("sweep", shapes = shapes.len(), parallel = parallel).entered();

    #[cfg(feature = "rayon")]
    if parallel {
        return shapes
            .par_iter()
            .map(|(shape_id, silhouette)| sweep_shape(ctx, *shape_id, silhouette))
            .collect();
    }
    #[cfg(not(feature = "rayon"))]
    if parallel {
        trace_event!("parallel_unavailable", shapes = shapes.len());
    }

    shapes
        .iter()
        .map(|(shape_id, silhouette)| sweep_shape(ctx, *shape_id, silhouette))
        .collect()
}

/// Sweeps sizes and rotations of one shape.
///
/// A shape that cannot be traced yields an empty outcome.
pub(crate) fn sweep_shape(
    ctx: &SweepContext<'_>,
    shape_id: usize,
    silhouette: &GrayImage,
) -> LeafMatchResult<ShapeOutcome> {
    let _span = trace_span!("shape", shape_id = shape_id).entered();

    let plant = ctx.plant;
    let (width, height) = (plant.edges.width() as usize, plant.edges.height() as usize);
    let mut outcome = ShapeOutcome {
        matches: Vec::new(),
        accumulation: OwnedImage::filled(width, height, 0.0)?,
    };
    let mut result = OwnedImage::filled(width, height, 0.0f32)?;

    let mut generator = TemplateGenerator::new(
        ctx.generator.clone(),
        gray_view(&plant.mask)?,
        plant.reference,
        plant.bounds(),
    )?;
    if let Err(err) = generator.load_shape_image(silhouette) {
        let reason = err.to_string();
        trace_warn!("shape_skipped", shape_id = shape_id, reason = reason.as_str());
        return Ok(outcome);
    }

    for (size_id, &ratio) in ctx.sizes.iter().enumerate() {
        let size_px = ratio * plant.extent;
        if let Err(err) = generator.set_size(size_px) {
            let reason = err.to_string();
            trace_warn!(
                "size_skipped",
                shape_id = shape_id,
                size_id = size_id,
                reason = reason.as_str(),
            );
            continue;
        }

        for rotation_id in 0..generator.rotations().len() {
            if let Err(err) = generator.set_rotation_step(rotation_id) {
                let reason = err.to_string();
                trace_event!(
                    "rotation_skipped",
                    size_id = size_id,
                    rotation_id = rotation_id,
                    reason = reason.as_str(),
                );
                continue;
            }

            let Some((position, score)) = score_rotation(ctx, &generator, &mut result)? else {
                continue;
            };
            let angle_deg = generator.rotations().angle_deg(rotation_id);
            trace_event!(
                "match_accepted",
                shape_id = shape_id,
                size_id = size_id,
                rotation_id = rotation_id,
                score = score,
            );
            add_footprint(&generator, position, &mut outcome.accumulation)?;
            outcome.matches.push(LeafMatch {
                shape_id,
                size_id,
                rotation_id,
                score,
                position,
                size_px,
                angle_deg,
            });
        }
    }

    trace_event!("shape_done", shape_id = shape_id, matches = outcome.matches.len());
    Ok(outcome)
}

/// Scores the current placement window; returns the accepted template
/// position (in plant coordinates) and its score.
fn score_rotation(
    ctx: &SweepContext<'_>,
    generator: &TemplateGenerator<'_>,
    result: &mut OwnedImage<f32>,
) -> LeafMatchResult<Option<(Point, f32)>> {
    let rect = generator.matching_rect()?;
    let (res_w, res_h) = generator.result_size()?;
    let mut window = result.view_mut().into_roi(0, 0, res_w, res_h)?;
    window.fill(0.0);
    ctx.scorer
        .run_matching(generator.template_contour()?, rect.top_left(), &mut window)?;

    let Some(extremes) = find_extremes(window.as_view()) else {
        return Ok(None);
    };
    let best = extremes.min;
    if best.score < ctx.min_match_threshold || best.score > ctx.max_match_threshold {
        return Ok(None);
    }
    if !generator.check_against_mask((best.x, best.y))? {
        return Ok(None);
    }
    let position = Point::new(rect.left + best.x as i32, rect.top + best.y as i32);
    Ok(Some((position, best.score)))
}

/// Adds the filled template, scaled to [0, 1], at `position`.
fn add_footprint(
    generator: &TemplateGenerator<'_>,
    position: Point,
    accumulation: &mut OwnedImage<f32>,
) -> LeafMatchResult<()> {
    let filled = generator.filled_template()?;
    let mut dst = accumulation.view_mut().into_roi(
        position.x.max(0) as usize,
        position.y.max(0) as usize,
        filled.width(),
        filled.height(),
    )?;
    for (y, src) in filled.rows().enumerate() {
        let Some(row) = dst.row_mut(y) else {
            continue;
        };
        for (acc, &mass) in row.iter_mut().zip(src) {
            *acc += mass as f32 / u8::MAX as f32;
        }
    }
    Ok(())
}
