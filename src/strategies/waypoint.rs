//! Waypoint following at constant speed, optionally through a spline

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::common::{MotionError, MotionResult, MotionStrategy, Path3D, PathMetadata, Point3D};
use crate::path_planning::{calculate_smooth_path, resample_constant_speed, DEFAULT_RESOLUTION_PER_METER};
use crate::world::World;

/// Consecutive points closer than this are treated as duplicates [m]
pub const DUPLICATE_WAYPOINT_DISTANCE: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointConfig {
    pub time_step: f64,
    pub starting_position: Point3D,
    pub waypoints: Vec<Point3D>,
    /// Travel speed [m/s]
    pub velocity: f64,
    pub enable_smoothing: bool,
    /// Spline resampling density [samples/m]
    pub smoothing_resolution: f64,
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0,
            starting_position: Point3D::origin(),
            waypoints: Vec::new(),
            velocity: 5.0,
            enable_smoothing: true,
            smoothing_resolution: DEFAULT_RESOLUTION_PER_METER,
        }
    }
}

impl WaypointConfig {
    pub fn validate(&self) -> MotionResult<()> {
        if !(self.time_step > 0.0) {
            return Err(MotionError::InvalidParameter(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if !(self.velocity > 0.0) {
            return Err(MotionError::InvalidParameter(format!(
                "velocity must be positive, got {}",
                self.velocity
            )));
        }
        Ok(())
    }

    /// Start position followed by the waypoints, consecutive duplicates removed
    pub fn control_points(&self) -> Vec<Point3D> {
        let mut points: Vec<Point3D> = Vec::with_capacity(self.waypoints.len() + 1);
        for p in std::iter::once(self.starting_position).chain(self.waypoints.iter().copied()) {
            match points.last() {
                Some(last) if last.distance(&p) < DUPLICATE_WAYPOINT_DISTANCE => {}
                _ => points.push(p),
            }
        }
        points
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WaypointStrategy;

impl WaypointStrategy {
    pub fn new() -> Self {
        WaypointStrategy
    }
}

impl MotionStrategy for WaypointStrategy {
    type Config = WaypointConfig;

    fn name(&self) -> &'static str {
        "Waypoint"
    }

    fn generate(&self, world: &World, config: &WaypointConfig) -> MotionResult<(Path3D, PathMetadata)> {
        config.validate()?;

        let control = config.control_points();
        if control.len() < 2 {
            return Err(MotionError::InvalidParameter(
                "at least one waypoint distinct from the start is required".to_string(),
            ));
        }

        let mut mode = "Linear";
        let mut geometry = control.clone();
        if config.enable_smoothing && control.len() >= 3 {
            let smoothed = calculate_smooth_path(&control, config.smoothing_resolution);
            if world.all_valid(&smoothed) {
                geometry = smoothed;
                mode = "Smoothed";
            } else {
                warn!("Smoothed waypoint path collides with an obstacle, falling back to linear");
                mode = "Linear (Fallback)";
            }
        }

        let timed = resample_constant_speed(&geometry, config.velocity, config.time_step)?;
        debug!(
            "Waypoint path: {} control points, {} samples, {:.2} m ({})",
            control.len(),
            timed.points.len(),
            timed.total_length,
            mode
        );

        let metadata = PathMetadata::new(self.name(), timed.total_length, timed.duration, config.time_step)
            .with("mode", mode)
            .with("velocity", config.velocity)
            .with("num_waypoints", (control.len() - 1) as u64);
        Ok((Path3D::from_points(timed.points), metadata))
    }
}
