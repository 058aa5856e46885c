pub mod motion_engine;

pub use motion_engine::{MotionEngine, PaddingMode, TrajectoryEntry};
