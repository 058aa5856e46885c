//! Jammer motion planning
//!
//! Generates time-sampled 3D trajectories for moving entities inside a
//! static world of box obstacles, using random walks, chained kinematic
//! segments, waypoint following, or roadmap navigation, and aligns them to
//! a common step count.

// Core modules
pub mod common;
pub mod world;

// Algorithm modules
pub mod kinematics;
pub mod path_planning;
pub mod strategies;

// Orchestration
pub mod engine;
pub mod scenario;

// Re-export common types for convenience
pub use common::{Path3D, PathMetadata, Point2D, Point3D};
pub use common::MotionStrategy;
pub use common::{MotionError, MotionResult};
pub use engine::{MotionEngine, PaddingMode};
pub use strategies::StrategyConfig;
pub use world::{Bounds, Obstacle, World};
