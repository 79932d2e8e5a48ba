use leafmatch::lowlevel::{min_enclosing_circle, RotationTable};
use leafmatch::{ChamferScorer, OwnedImage, Point, PointF};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn enclosing_circle_contains_random_point_sets() {
    let mut rng = StdRng::seed_from_u64(0x1eaf);
    for _ in 0..50 {
        let count = rng.random_range(1..40);
        let points: Vec<Point> = (0..count)
            .map(|_| Point::new(rng.random_range(-200..200), rng.random_range(-200..200)))
            .collect();
        let circle = min_enclosing_circle(&points).unwrap();
        for p in &points {
            let d = ((p.x as f64 - circle.cx).powi(2) + (p.y as f64 - circle.cy).powi(2)).sqrt();
            assert!(d <= circle.radius + 1e-6, "{p:?} outside {circle:?}");
        }
        // Minimal: at least one point lies on the boundary.
        let on_boundary = points.iter().any(|p| {
            let d = ((p.x as f64 - circle.cx).powi(2) + (p.y as f64 - circle.cy).powi(2)).sqrt();
            (d - circle.radius).abs() < 1e-6
        });
        assert!(on_boundary);
    }
}

#[test]
fn full_turn_of_rotations_returns_to_start() {
    let mut rng = StdRng::seed_from_u64(7);
    for steps in [1usize, 5, 24, 36] {
        let table = RotationTable::new(steps).unwrap();
        let start = PointF::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
        let mut p = start;
        for _ in 0..steps {
            p = table.rotate(1, p);
        }
        assert!((p.x - start.x).abs() < 1e-4 && (p.y - start.y).abs() < 1e-4);
    }
}

#[test]
fn chamfer_score_is_linear_in_the_distance_map() {
    let mut rng = StdRng::seed_from_u64(42);
    let (w, h) = (24usize, 20usize);
    let base: Vec<f32> = (0..w * h).map(|_| rng.random_range(0.0..1.0)).collect();
    let other: Vec<f32> = (0..w * h).map(|_| rng.random_range(0.0..1.0)).collect();
    let sum: Vec<f32> = base.iter().zip(&other).map(|(a, b)| 3.0 * a + b).collect();

    let contour: Vec<Point> = (0..12)
        .map(|_| Point::new(rng.random_range(0..6), rng.random_range(0..6)))
        .collect();
    let origin = Point::new(2, 3);
    let score = |map: Vec<f32>| {
        let scorer = ChamferScorer::from_distance_map(OwnedImage::new(map, w, h).unwrap());
        let mut result = OwnedImage::filled(10, 8, 0.0f32).unwrap();
        scorer
            .run_matching(&contour, origin, &mut result.view_mut())
            .unwrap();
        result.into_vec()
    };

    let a = score(base);
    let b = score(other);
    let s = score(sum);
    for i in 0..a.len() {
        assert!((3.0 * a[i] + b[i] - s[i]).abs() < 1e-4);
    }
}

#[test]
fn constant_distance_map_yields_constant_scores() {
    let mut rng = StdRng::seed_from_u64(99);
    for (count, value) in [(1usize, 0.25f32), (7, 0.6), (50, 1.0)] {
        let scorer = ChamferScorer::from_distance_map(OwnedImage::filled(40, 40, value).unwrap());
        let contour: Vec<Point> = (0..count)
            .map(|_| Point::new(rng.random_range(0..10), rng.random_range(0..10)))
            .collect();
        let mut result = OwnedImage::filled(20, 20, 0.0f32).unwrap();
        scorer
            .run_matching(&contour, Point::new(1, 1), &mut result.view_mut())
            .unwrap();
        for &score in result.data() {
            assert!((score - value).abs() < 1e-5, "n={count}: {score} != {value}");
        }
    }
}
