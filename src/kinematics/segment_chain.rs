//! Incremental segment builder
//!
//! Every appended segment starts from the closed-form end state of the one
//! before it, never from the last point of a preview sampling.

use crate::common::{MotionError, MotionResult, Point3D};
use crate::kinematics::motion_model::{KinematicState, MathSegment, MotionMode};
use crate::world::World;

/// Preview density used by [`SegmentChain::preview`]: 5 samples per second, at least 10
pub fn preview_sample_count(duration: f64) -> usize {
    ((duration * 5.0) as usize).max(10)
}

/// Ordered list of chained kinematic segments
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentChain {
    origin: KinematicState,
    segments: Vec<MathSegment>,
}

impl SegmentChain {
    pub fn new(start_pos: Point3D, heading: f64, velocity: f64) -> Self {
        Self {
            origin: KinematicState::new(start_pos, heading, velocity),
            segments: Vec::new(),
        }
    }

    pub fn segments(&self) -> &[MathSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<MathSegment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Initial heading can only change before the first segment is added
    pub fn set_initial_heading(&mut self, heading: f64) -> MotionResult<()> {
        if !self.segments.is_empty() {
            return Err(MotionError::InvalidParameter(
                "initial heading is fixed once a segment exists".to_string(),
            ));
        }
        self.origin.heading = heading;
        Ok(())
    }

    /// State the next segment will start from
    pub fn current_state(&self) -> KinematicState {
        self.segments.last().map(MathSegment::end_state).unwrap_or(self.origin)
    }

    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Append a segment starting at the current state
    pub fn push(&mut self, mode: MotionMode, duration: f64, params: &[(&str, f64)]) -> MotionResult<&MathSegment> {
        let segment = params
            .iter()
            .fold(MathSegment::new(mode, duration, self.current_state()), |seg, (k, v)| seg.with_param(k, *v));
        segment.validate()?;
        self.segments.push(segment);
        Ok(&self.segments[self.segments.len() - 1])
    }

    /// Remove the last segment; the chain resumes from its start state
    pub fn undo(&mut self) -> Option<MathSegment> {
        self.segments.pop()
    }

    /// Dense samples of every segment, for display
    pub fn preview(&self) -> Vec<Point3D> {
        self.segments
            .iter()
            .flat_map(|s| s.sample(preview_sample_count(s.duration)))
            .collect()
    }

    /// First preview sample that fails the world validity check
    pub fn first_collision(&self, world: &World) -> Option<Point3D> {
        self.preview().into_iter().find(|p| !world.is_position_valid(p))
    }
}
