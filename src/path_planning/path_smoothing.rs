//! Spline smoothing and constant-speed resampling of geometric paths

use log::warn;

use crate::common::{cumulative_distances, MotionError, MotionResult, Point3D};
use crate::path_planning::cubic_spline_planner::Spline3D;

/// Default resampling density of smoothed paths [samples/m]
pub const DEFAULT_RESOLUTION_PER_METER: f64 = 10.0;

/// Smooth a polyline with a natural cubic spline against chord length.
///
/// Fewer than 3 points are returned unchanged. If the fit fails the input
/// polyline is returned as is; smoothing never fails the caller.
pub fn calculate_smooth_path(points: &[Point3D], resolution_per_meter: f64) -> Vec<Point3D> {
    if points.len() < 3 {
        return points.to_vec();
    }

    match fit_and_resample(points, resolution_per_meter) {
        Ok(smoothed) => smoothed,
        Err(e) => {
            warn!("Spline smoothing failed: {}. Returning linear path.", e);
            points.to_vec()
        }
    }
}

fn fit_and_resample(points: &[Point3D], resolution_per_meter: f64) -> MotionResult<Vec<Point3D>> {
    let spline = Spline3D::new(points)?;
    let total = spline.total_length();

    let by_length = (total * resolution_per_meter.max(0.0)) as usize;
    let num_samples = by_length.max(points.len() * 2);

    let smoothed: Vec<Point3D> = (0..num_samples)
        .map(|i| spline.calc_position(total * i as f64 / (num_samples - 1) as f64))
        .collect();

    if smoothed.iter().any(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite())) {
        return Err(MotionError::NumericalError("spline produced non-finite samples".to_string()));
    }
    Ok(smoothed)
}

/// Largest number of samples a single time grid may hold
pub const MAX_TIME_GRID_SAMPLES: usize = 10_000_000;

/// Uniform time grid `0, dt, 2dt, ...` below `total`, closed with `total`
/// itself unless the last regular sample is within `tolerance` of it.
///
/// Fails when `time_step` is not positive or the grid would exceed
/// [`MAX_TIME_GRID_SAMPLES`].
pub fn uniform_time_grid(total: f64, time_step: f64, tolerance: f64) -> MotionResult<Vec<f64>> {
    if !(time_step > 0.0 && time_step.is_finite()) {
        return Err(MotionError::InvalidParameter(format!("time_step must be positive, got {}", time_step)));
    }
    let steps = if total > 0.0 { (total / time_step).ceil() } else { 0.0 };
    if !(steps < MAX_TIME_GRID_SAMPLES as f64) {
        return Err(MotionError::InvalidParameter(format!(
            "{} s at a {} s step needs more than {} samples",
            total, time_step, MAX_TIME_GRID_SAMPLES
        )));
    }

    let n = steps as usize;
    let mut grid: Vec<f64> = (0..n).map(|k| (k as f64 * time_step).min(total)).collect();
    if grid.last().map_or(true, |&t| t < total - tolerance) {
        grid.push(total);
    }
    Ok(grid)
}

/// Geometric path resampled at constant speed
#[derive(Debug, Clone, PartialEq)]
pub struct TimedPath {
    pub points: Vec<Point3D>,
    pub total_length: f64,
    pub duration: f64,
}

/// Resample `path` so consecutive samples are `time_step` apart when
/// travelled at `velocity`; the final sample lands on the path end.
pub fn resample_constant_speed(path: &[Point3D], velocity: f64, time_step: f64) -> MotionResult<TimedPath> {
    if path.is_empty() {
        return Err(MotionError::InvalidParameter("cannot resample an empty path".to_string()));
    }
    if !(velocity > 0.0 && velocity.is_finite()) {
        return Err(MotionError::InvalidParameter(format!("velocity must be positive, got {}", velocity)));
    }
    if !(time_step > 0.0 && time_step.is_finite()) {
        return Err(MotionError::InvalidParameter(format!("time_step must be positive, got {}", time_step)));
    }

    let cumulative = cumulative_distances(path);
    let total_length = cumulative[cumulative.len() - 1];
    let duration = total_length / velocity;

    let points = uniform_time_grid(duration, time_step, 0.0)?
        .into_iter()
        .map(|t| interpolate_at(t * velocity, &cumulative, path))
        .collect();

    Ok(TimedPath { points, total_length, duration })
}

/// Piecewise-linear position at distance `d`, clamped to the path ends
fn interpolate_at(d: f64, cumulative: &[f64], path: &[Point3D]) -> Point3D {
    let last = cumulative.len() - 1;
    if d <= cumulative[0] {
        return path[0];
    }
    if d >= cumulative[last] {
        return path[last];
    }

    let i = cumulative.partition_point(|&c| c <= d);
    let (c0, c1) = (cumulative[i - 1], cumulative[i]);
    let span = c1 - c0;
    if span <= 0.0 {
        return path[i];
    }
    path[i - 1].lerp(&path[i], (d - c0) / span)
}
