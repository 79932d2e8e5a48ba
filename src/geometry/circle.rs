//! Minimum enclosing circle.

use crate::geometry::Point;

/// Circle in pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

impl Circle {
    fn from_diameter(a: (f64, f64), b: (f64, f64)) -> Self {
        let cx = (a.0 + b.0) * 0.5;
        let cy = (a.1 + b.1) * 0.5;
        let radius = ((a.0 - cx).powi(2) + (a.1 - cy).powi(2)).sqrt();
        Self { cx, cy, radius }
    }

    fn circumscribed(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Option<Self> {
        let bx = b.0 - a.0;
        let by = b.1 - a.1;
        let cx = c.0 - a.0;
        let cy = c.1 - a.1;
        let d = 2.0 * (bx * cy - by * cx);
        if d.abs() < 1e-12 {
            return None;
        }
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let ux = (cy * b2 - by * c2) / d;
        let uy = (bx * c2 - cx * b2) / d;
        Some(Self {
            cx: a.0 + ux,
            cy: a.1 + uy,
            radius: (ux * ux + uy * uy).sqrt(),
        })
    }

    /// Returns true if `p` lies inside the circle, with a small tolerance.
    pub fn contains(&self, p: (f64, f64)) -> bool {
        let dx = p.0 - self.cx;
        let dy = p.1 - self.cy;
        (dx * dx + dy * dy).sqrt() <= self.radius + 1e-7
    }

    pub fn diameter(&self) -> f64 {
        self.radius * 2.0
    }
}

/// Computes the smallest circle containing all `points`.
///
/// The points are first reduced to their convex hull; the incremental
/// construction then runs over the hull vertices only. Returns `None` for an
/// empty slice.
pub fn min_enclosing_circle(points: &[Point]) -> Option<Circle> {
    let hull = convex_hull(points);
    let first = *hull.first()?;
    let mut circle = Circle {
        cx: first.0,
        cy: first.1,
        radius: 0.0,
    };
    for i in 1..hull.len() {
        if circle.contains(hull[i]) {
            continue;
        }
        circle = Circle {
            cx: hull[i].0,
            cy: hull[i].1,
            radius: 0.0,
        };
        for j in 0..i {
            if circle.contains(hull[j]) {
                continue;
            }
            circle = Circle::from_diameter(hull[i], hull[j]);
            for k in 0..j {
                if circle.contains(hull[k]) {
                    continue;
                }
                circle = Circle::circumscribed(hull[i], hull[j], hull[k])
                    .unwrap_or_else(|| widest_pair(hull[i], hull[j], hull[k]));
            }
        }
    }
    Some(circle)
}

fn widest_pair(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Circle {
    let candidates = [
        Circle::from_diameter(a, b),
        Circle::from_diameter(a, c),
        Circle::from_diameter(b, c),
    ];
    candidates
        .into_iter()
        .fold(candidates[0], |best, c| if c.radius > best.radius { c } else { best })
}

/// Andrew's monotone chain; collinear points are dropped.
fn convex_hull(points: &[Point]) -> Vec<(f64, f64)> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|a, b| a.x.cmp(&b.x).then(a.y.cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    }

    let cross = |o: Point, a: Point, b: Point| -> i64 {
        (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
    };

    let mut hull: Vec<Point> = Vec::with_capacity(pts.len() * 2);
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull.iter().map(|p| (p.x as f64, p.y as f64)).collect()
}
