//! Mathematical helpers for rotation and geometry.

/// Wraps an angle in degrees to the range [0, 360).
pub(crate) fn wrap_deg_positive(angle_deg: f32) -> f32 {
    let wrapped = angle_deg % 360.0;
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Computes sine and cosine for an angle in degrees.
pub(crate) fn sin_cos_deg(angle_deg: f32) -> (f32, f32) {
    angle_deg.to_radians().sin_cos()
}

/// Rounds to the nearest integer, saturating at the `i32` range.
pub(crate) fn round_i32(value: f32) -> i32 {
    value.round() as i32
}

/// Euclidean length of a pixel rectangle diagonal.
pub(crate) fn diagonal(width: usize, height: usize) -> f32 {
    let w = width as f32;
    let h = height as f32;
    (w * w + h * h).sqrt()
}

#[cfg(test)]
mod tests {
    use super::{diagonal, round_i32, sin_cos_deg, wrap_deg_positive};

    #[test]
    fn wrap_deg_positive_maps_to_expected_range() {
        assert!((wrap_deg_positive(370.0) - 10.0).abs() < 1e-4);
        assert!((wrap_deg_positive(-90.0) - 270.0).abs() < 1e-4);
        assert!(wrap_deg_positive(360.0).abs() < 1e-4);
    }

    #[test]
    fn sin_cos_deg_matches_quadrants() {
        let (sin, cos) = sin_cos_deg(90.0);
        assert!(sin > 0.999);
        assert!(cos.abs() < 1e-6);
    }

    #[test]
    fn round_and_diagonal() {
        assert_eq!(round_i32(2.5), 3);
        assert_eq!(round_i32(-2.5), -3);
        assert!((diagonal(3, 4) - 5.0).abs() < 1e-6);
    }
}
