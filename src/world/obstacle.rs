//! Obstacle and bounds primitives
//!
//! Obstacles are axis-aligned boxes. An optional 2D footprint polygon can be
//! attached for finer planar checks, but the box is what validity uses.

use serde::{Deserialize, Serialize};

use crate::common::{Point2D, Point3D};

/// Axis-aligned obstacle with an optional footprint outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub min: Point3D,
    pub max: Point3D,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footprint: Option<Vec<Point2D>>,
}

impl Obstacle {
    /// Create a box obstacle; corners are sorted per axis
    pub fn new(a: Point3D, b: Point3D) -> Self {
        Self {
            min: Point3D::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3D::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
            footprint: None,
        }
    }

    pub fn with_footprint(mut self, footprint: Vec<Point2D>) -> Self {
        self.footprint = Some(footprint);
        self
    }

    /// Closed-box containment: a point on any face counts as inside
    pub fn contains(&self, p: &Point3D) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Planar containment against the footprint polygon (even-odd rule).
    ///
    /// Without a footprint (or with a degenerate one) the XY rectangle of
    /// the box is used instead.
    pub fn footprint_contains(&self, x: f64, y: f64) -> bool {
        match &self.footprint {
            Some(poly) if poly.len() >= 3 => point_in_polygon(x, y, poly),
            _ => x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y,
        }
    }
}

/// Even-odd ray casting test; the polygon is implicitly closed
fn point_in_polygon(x: f64, y: f64, poly: &[Point2D]) -> bool {
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (pi, pj) = (poly[i], poly[j]);
        if (pi.y > y) != (pj.y > y) {
            let x_cross = pi.x + (y - pi.y) * (pj.x - pi.x) / (pj.y - pi.y);
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Per-axis inclusive ranges; an absent axis is unconstrained
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<[f64; 2]>,
}

impl Bounds {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Bounds on x and y only
    pub fn planar(x: [f64; 2], y: [f64; 2]) -> Self {
        Self { x: Some(x), y: Some(y), z: None }
    }

    pub fn with_z(mut self, z: [f64; 2]) -> Self {
        self.z = Some(z);
        self
    }

    pub fn contains(&self, p: &Point3D) -> bool {
        let within = |range: &Option<[f64; 2]>, v: f64| match range {
            Some([lo, hi]) => *lo <= v && v <= *hi,
            None => true,
        };
        within(&self.x, p.x) && within(&self.y, p.y) && within(&self.z, p.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Obstacle {
        Obstacle::new(Point3D::new(-1.0, -1.0, -1.0), Point3D::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_contains_is_inclusive() {
        let obs = unit_box();
        assert!(obs.contains(&Point3D::new(0.0, 0.0, 0.0)));
        assert!(obs.contains(&Point3D::new(1.0, 0.0, 0.0)));
        assert!(obs.contains(&Point3D::new(-1.0, -1.0, -1.0)));
        assert!(!obs.contains(&Point3D::new(1.0 + 1e-9, 0.0, 0.0)));
    }

    #[test]
    fn test_new_sorts_corners() {
        let obs = Obstacle::new(Point3D::new(5.0, -2.0, 3.0), Point3D::new(1.0, 4.0, 0.0));
        assert_eq!(obs.min, Point3D::new(1.0, -2.0, 0.0));
        assert_eq!(obs.max, Point3D::new(5.0, 4.0, 3.0));
    }

    #[test]
    fn test_footprint_triangle() {
        let obs = Obstacle::new(Point3D::new(0.0, 0.0, 0.0), Point3D::new(10.0, 10.0, 5.0)).with_footprint(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(0.0, 10.0),
        ]);
        assert!(obs.footprint_contains(2.0, 2.0));
        // inside the box but outside the triangle
        assert!(!obs.footprint_contains(8.0, 8.0));
    }

    #[test]
    fn test_footprint_falls_back_to_box() {
        let obs = unit_box();
        assert!(obs.footprint_contains(0.5, -0.5));
        assert!(!obs.footprint_contains(1.5, 0.0));
    }

    #[test]
    fn test_bounds_missing_axis_is_unconstrained() {
        let bounds = Bounds::planar([-10.0, 10.0], [-10.0, 10.0]);
        assert!(bounds.contains(&Point3D::new(10.0, -10.0, 1e6)));
        assert!(!bounds.contains(&Point3D::new(10.1, 0.0, 0.0)));
        assert!(!bounds.with_z([0.0, 1.0]).contains(&Point3D::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn test_obstacle_deserialize() {
        let obs: Obstacle =
            serde_json::from_str(r#"{"min": [0, 0, 0], "max": [1, 2, 3], "footprint": [[0, 0], [1, 0], [1, 2]]}"#)
                .unwrap();
        assert_eq!(obs.max, Point3D::new(1.0, 2.0, 3.0));
        assert_eq!(obs.footprint.as_ref().map(|f| f.len()), Some(3));
    }
}
