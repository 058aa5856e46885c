//! Kinematic segment models
//!
//! - `motion_model`: closed-form constant-velocity, constant-acceleration
//!   and coordinated-turn motion
//! - `segment_chain`: builds segment lists where each segment starts from
//!   the exact end state of the previous one

pub mod motion_model;
pub mod segment_chain;

pub use motion_model::{
    KinematicState, MathSegment, MotionMode, PARAM_ACCEL, PARAM_TURN_RATE, PARAM_VELOCITY, TURN_RATE_EPSILON,
};
pub use segment_chain::{preview_sample_count, SegmentChain};
