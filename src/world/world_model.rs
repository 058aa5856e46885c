//! Static world: bounds plus obstacles, and the validity queries every
//! strategy relies on.

use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::common::{MotionResult, Point3D};
use crate::world::obstacle::{Bounds, Obstacle};

/// Segments shorter than this cannot be obstructed
pub const LOS_MIN_DISTANCE: f64 = 1e-3;

/// Default sampling step for line-of-sight checks [m]
pub const DEFAULT_LOS_STEP: f64 = 2.0;

/// Immutable planning world
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct World {
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub bounds: Bounds,
}

impl World {
    pub fn new(obstacles: Vec<Obstacle>, bounds: Bounds) -> Self {
        Self { obstacles, bounds }
    }

    /// Parse `{"obstacles": [...], "bounds": {...}}`
    pub fn from_json_str(json: &str) -> MotionResult<Self> {
        let world: World = serde_json::from_str(json)?;
        debug!("Loaded world with {} obstacles", world.obstacles.len());
        Ok(world)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> MotionResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// A position is valid when it satisfies every present bound and lies
    /// outside every obstacle box (box faces count as inside).
    pub fn is_position_valid(&self, p: &Point3D) -> bool {
        self.bounds.contains(p) && !self.obstacles.iter().any(|o| o.contains(p))
    }

    /// Batched form of [`World::is_position_valid`]
    pub fn validate_positions(&self, points: &[Point3D]) -> Vec<bool> {
        points.iter().map(|p| self.is_position_valid(p)).collect()
    }

    pub fn all_valid(&self, points: &[Point3D]) -> bool {
        points.iter().all(|p| self.is_position_valid(p))
    }

    /// Approximate straight-line clearance between `p1` and `p2`.
    ///
    /// Samples `ceil(d / step_size)` points along `(p1, p2]`, the last one
    /// being `p2` itself. Obstacles thinner than `step_size` that fall
    /// between two samples are not detected.
    pub fn check_line_of_sight(&self, p1: &Point3D, p2: &Point3D, step_size: f64) -> bool {
        let dist = p1.distance(p2);
        if dist < LOS_MIN_DISTANCE {
            return true;
        }

        let step = if step_size > 0.0 { step_size } else { dist };
        let n_steps = (dist / step).ceil().max(1.0) as usize;
        let direction = (*p2 - *p1) * (1.0 / dist);

        (1..=n_steps).all(|i| {
            let sample = if i == n_steps { *p2 } else { *p1 + direction * (i as f64 * step) };
            self.is_position_valid(&sample)
        })
    }

    /// Planar footprint hit test, used for display-quality checks only
    pub fn footprint_collision(&self, p: &Point3D) -> bool {
        self.obstacles
            .iter()
            .any(|o| p.z >= o.min.z && p.z <= o.max.z && o.footprint_contains(p.x, p.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Point2D;

    fn world() -> World {
        World::new(
            vec![Obstacle::new(Point3D::new(-10.0, -10.0, -10.0), Point3D::new(10.0, 10.0, 10.0))],
            Bounds::planar([-100.0, 100.0], [-100.0, 100.0]),
        )
    }

    #[test]
    fn test_position_validity() {
        let w = world();
        assert!(!w.is_position_valid(&Point3D::new(0.0, 0.0, 0.0)));
        assert!(!w.is_position_valid(&Point3D::new(10.0, 0.0, 0.0)));
        assert!(w.is_position_valid(&Point3D::new(10.5, 0.0, 0.0)));
        assert!(!w.is_position_valid(&Point3D::new(150.0, 0.0, 0.0)));
        // above the box, z is unconstrained
        assert!(w.is_position_valid(&Point3D::new(0.0, 0.0, 11.0)));
    }

    #[test]
    fn test_validate_positions_matches_pointwise() {
        let w = world();
        let pts = vec![
            Point3D::new(-20.0, 0.0, 0.0),
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(200.0, 0.0, 0.0),
        ];
        assert_eq!(w.validate_positions(&pts), vec![true, false, false]);
        assert!(!w.all_valid(&pts));
        assert!(w.all_valid(&pts[..1]));
    }

    #[test]
    fn test_line_of_sight() {
        let w = world();
        let a = Point3D::new(-50.0, 0.0, 0.0);
        let b = Point3D::new(50.0, 0.0, 0.0);
        let c = Point3D::new(-50.0, 50.0, 0.0);
        assert!(!w.check_line_of_sight(&a, &b, 2.0));
        assert!(w.check_line_of_sight(&a, &c, 2.0));
    }

    #[test]
    fn test_line_of_sight_degenerate() {
        let w = world();
        let inside = Point3D::new(0.0, 0.0, 0.0);
        assert!(w.check_line_of_sight(&inside, &inside, 1.0));
        let p = Point3D::new(30.0, 30.0, 0.0);
        assert!(w.check_line_of_sight(&p, &Point3D::new(30.0, 30.0005, 0.0), 0.1));
    }

    #[test]
    fn test_line_of_sight_checks_endpoint() {
        let w = world();
        // 3 m with 2 m steps: samples at 2 m and at the endpoint
        let a = Point3D::new(-13.0, 0.0, 0.0);
        let b = Point3D::new(-10.0, 0.0, 0.0);
        assert!(!w.check_line_of_sight(&a, &b, 2.0));
    }

    #[test]
    fn test_line_of_sight_misses_thin_obstacle() {
        let w = World::new(
            vec![Obstacle::new(Point3D::new(0.9, -1.0, -1.0), Point3D::new(1.1, 1.0, 1.0))],
            Bounds::unbounded(),
        );
        let a = Point3D::new(0.0, 0.0, 0.0);
        let b = Point3D::new(4.0, 0.0, 0.0);
        assert!(w.check_line_of_sight(&a, &b, 2.0));
        assert!(!w.check_line_of_sight(&a, &b, 0.5));
    }

    #[test]
    fn test_footprint_collision_ignores_validity() {
        let obs = Obstacle::new(Point3D::new(0.0, 0.0, 0.0), Point3D::new(10.0, 10.0, 5.0)).with_footprint(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(0.0, 10.0),
        ]);
        let w = World::new(vec![obs], Bounds::unbounded());
        let corner = Point3D::new(9.0, 9.0, 1.0);
        assert!(!w.footprint_collision(&corner));
        assert!(!w.is_position_valid(&corner));
        assert!(w.footprint_collision(&Point3D::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_world_from_json() {
        let json = r#"{
            "obstacles": [{"min": [-10, -10, -10], "max": [10, 10, 10]}],
            "bounds": {"x": [-100, 100], "y": [-100, 100]}
        }"#;
        let w = World::from_json_str(json).unwrap();
        assert_eq!(w, world());
        assert!(World::from_json_str("{\"obstacles\": 3}").is_err());
    }
}
