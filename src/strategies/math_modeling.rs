//! Deterministic kinematic strategy: samples a chain of closed-form
//! segments on a global uniform time grid.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::common::{MotionError, MotionResult, MotionStrategy, Path3D, PathMetadata, Point3D};
use crate::kinematics::MathSegment;
use crate::path_planning::uniform_time_grid;
use crate::world::World;

/// Tolerance for grid times that land on a segment boundary [s]
pub const SEGMENT_BOUNDARY_EPSILON: f64 = 1e-9;

/// Math modeling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MathModelingConfig {
    pub time_step: f64,
    pub starting_position: Point3D,
    pub segments: Vec<MathSegment>,
}

impl Default for MathModelingConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0,
            starting_position: Point3D::origin(),
            segments: Vec::new(),
        }
    }
}

impl MathModelingConfig {
    pub fn validate(&self) -> MotionResult<()> {
        if !(self.time_step > 0.0) {
            return Err(MotionError::InvalidParameter(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.segments.is_empty() {
            return Err(MotionError::InvalidParameter("no segments provided".to_string()));
        }
        self.segments.iter().try_for_each(MathSegment::validate)
    }
}

/// Cumulative end times of consecutive segments
struct SegmentTimeline {
    ends: Vec<f64>,
}

impl SegmentTimeline {
    fn new(segments: &[MathSegment]) -> Self {
        let ends = segments
            .iter()
            .scan(0.0, |acc, s| {
                *acc += s.duration;
                Some(*acc)
            })
            .collect();
        SegmentTimeline { ends }
    }

    fn total(&self) -> f64 {
        self.ends.last().copied().unwrap_or(0.0)
    }

    fn start_of(&self, i: usize) -> f64 {
        if i == 0 {
            0.0
        } else {
            self.ends[i - 1]
        }
    }

    /// Segment owning global time `t`; a time within the boundary epsilon
    /// of a segment end belongs to the next segment
    fn locate(&self, t: f64) -> usize {
        let elapsed = self.ends.partition_point(|&end| t >= end - SEGMENT_BOUNDARY_EPSILON);
        elapsed.min(self.ends.len() - 1)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MathModelingStrategy;

impl MathModelingStrategy {
    pub fn new() -> Self {
        MathModelingStrategy
    }
}

impl MotionStrategy for MathModelingStrategy {
    type Config = MathModelingConfig;

    fn name(&self) -> &'static str {
        "MathModeling"
    }

    fn generate(&self, _world: &World, config: &MathModelingConfig) -> MotionResult<(Path3D, PathMetadata)> {
        config.validate()?;

        let timeline = SegmentTimeline::new(&config.segments);
        let total_duration = timeline.total();

        let points = uniform_time_grid(total_duration, config.time_step, SEGMENT_BOUNDARY_EPSILON)?
            .into_iter()
            .map(|t| {
                let i = timeline.locate(t);
                let seg = &config.segments[i];
                let local = (t - timeline.start_of(i)).clamp(0.0, seg.duration);
                seg.position_at(local)
            })
            .collect();
        let path = Path3D::from_points(points);

        debug!(
            "Sampled {} segments into {} points over {:.3} s",
            config.segments.len(),
            path.len(),
            total_duration
        );

        let metadata = PathMetadata::new(self.name(), path.total_length(), total_duration, config.time_step)
            .with("num_segments", config.segments.len() as u64);
        Ok((path, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::{KinematicState, MotionMode, SegmentChain, PARAM_TURN_RATE, PARAM_VELOCITY};
    use approx::assert_abs_diff_eq;

    fn straight(duration: f64, v: f64) -> MathSegment {
        MathSegment::new(MotionMode::ConstVel, duration, KinematicState::new(Point3D::origin(), 0.0, v))
            .with_param(PARAM_VELOCITY, v)
    }

    fn config(segments: Vec<MathSegment>, dt: f64) -> MathModelingConfig {
        MathModelingConfig { time_step: dt, segments, ..MathModelingConfig::default() }
    }

    #[test]
    fn test_requires_segments() {
        let err = MathModelingStrategy.generate(&World::default(), &config(vec![], 1.0)).unwrap_err();
        assert!(matches!(err, MotionError::InvalidParameter(_)));
    }

    #[test]
    fn test_tiny_time_step_is_rejected() {
        let err = MathModelingStrategy
            .generate(&World::default(), &config(vec![straight(4.0, 5.0)], 1e-300))
            .unwrap_err();
        assert!(matches!(err, MotionError::InvalidParameter(_)));
    }

    #[test]
    fn test_single_segment_grid() {
        let (path, meta) = MathModelingStrategy.generate(&World::default(), &config(vec![straight(4.0, 5.0)], 1.0)).unwrap();
        assert_eq!(path.x_coords(), vec![0.0, 5.0, 10.0, 15.0, 20.0]);
        assert_abs_diff_eq!(meta.duration, 4.0);
        assert_abs_diff_eq!(meta.total_distance, 20.0, epsilon = 1e-12);
    }

    #[test]
    fn test_final_time_included() {
        let (path, _) = MathModelingStrategy.generate(&World::default(), &config(vec![straight(2.5, 2.0)], 1.0)).unwrap();
        assert_eq!(path.len(), 4);
        assert_abs_diff_eq!(path.points[3].x, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_timeline_locate() {
        let segs = vec![straight(1.0, 1.0), straight(0.1, 1.0), straight(2.0, 1.0)];
        let timeline = SegmentTimeline::new(&segs);
        assert_eq!(timeline.locate(0.0), 0);
        assert_eq!(timeline.locate(0.999), 0);
        assert_eq!(timeline.locate(1.0 - 1e-12), 1);
        assert_eq!(timeline.locate(1.05), 1);
        assert_eq!(timeline.locate(1.1), 2);
        assert_eq!(timeline.locate(3.1), 2);
        assert_eq!(timeline.locate(10.0), 2);
    }

    #[test]
    fn test_chained_segments_are_continuous() {
        let mut chain = SegmentChain::new(Point3D::new(0.0, 0.0, 1.5), 0.0, 3.0);
        chain.push(MotionMode::ConstVel, 2.0, &[(PARAM_VELOCITY, 3.0)]).unwrap();
        chain
            .push(MotionMode::Turn, 3.0, &[(PARAM_VELOCITY, 3.0), (PARAM_TURN_RATE, 30.0)])
            .unwrap();
        chain.push(MotionMode::ConstVel, 1.7, &[(PARAM_VELOCITY, 3.0)]).unwrap();

        let cfg = config(chain.segments().to_vec(), 0.1);
        let (path, meta) = MathModelingStrategy.generate(&World::default(), &cfg).unwrap();

        // constant 3 m/s: every step covers at most 0.3 m
        for pair in path.points.windows(2) {
            assert!(pair[0].distance(&pair[1]) <= 0.3 + 1e-9);
        }
        let end = chain.current_state().position;
        assert!(path.last().unwrap().distance(&end) < 1e-9);
        assert_eq!(meta.extra("num_segments"), Some(&serde_json::Value::from(3u64)));
    }
}
