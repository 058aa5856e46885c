//! World model: bounds, axis-aligned obstacles and collision queries

pub mod obstacle;
pub mod world_model;

pub use obstacle::{Bounds, Obstacle};
pub use world_model::{World, DEFAULT_LOS_STEP, LOS_MIN_DISTANCE};
