//! Rotation table for discrete rotation steps.

use crate::geometry::PointF;
use crate::util::math::{sin_cos_deg, wrap_deg_positive};
use crate::util::{LeafMatchError, LeafMatchResult};

/// Cosine and sine precomputed for every step of a full turn.
///
/// Step `k` rotates by `k * 360 / num_steps` degrees. Steps are taken modulo
/// `num_steps`, so step `k` and `k + num_steps` share one table entry.
#[derive(Clone, Debug)]
pub struct RotationTable {
    step_deg: f32,
    cos: Vec<f32>,
    sin: Vec<f32>,
}

impl RotationTable {
    /// Builds the table for `num_steps` evenly spaced rotations.
    pub fn new(num_steps: usize) -> LeafMatchResult<Self> {
        if num_steps == 0 {
            return Err(LeafMatchError::InvalidConfig {
                reason: "num_rotation_steps must be > 0",
            });
        }
        let step_deg = 360.0 / num_steps as f32;
        let (sin, cos): (Vec<f32>, Vec<f32>) = (0..num_steps)
            .map(|step| {
                if step == 0 {
                    (0.0, 1.0)
                } else {
                    sin_cos_deg(step as f32 * step_deg)
                }
            })
            .unzip();
        Ok(Self { step_deg, cos, sin })
    }

    /// Returns the number of discrete rotations.
    pub fn len(&self) -> usize {
        self.cos.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.cos.is_empty()
    }

    /// Returns the angular distance between consecutive steps in degrees.
    pub fn step_deg(&self) -> f32 {
        self.step_deg
    }

    /// Returns the angle of `step` in degrees, wrapped to [0, 360).
    pub fn angle_deg(&self, step: usize) -> f32 {
        wrap_deg_positive((step % self.len()) as f32 * self.step_deg)
    }

    /// Returns `(sin, cos)` for `step`.
    pub fn sin_cos(&self, step: usize) -> (f32, f32) {
        let idx = step % self.len();
        (self.sin[idx], self.cos[idx])
    }

    /// Rotates `p` about the origin by the angle of `step`.
    pub fn rotate(&self, step: usize, p: PointF) -> PointF {
        let (sin, cos) = self.sin_cos(step);
        PointF::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos)
    }
}
