//! Common traits defining interfaces for motion strategies

use crate::common::error::MotionResult;
use crate::common::types::{Path3D, PathMetadata};
use crate::world::World;

/// Trait for path generation strategies.
///
/// A strategy reads the world but never changes it. Any cached state (such as
/// a roadmap) belongs to the strategy instance.
pub trait MotionStrategy {
    /// Configuration record consumed by this strategy
    type Config;

    /// Short strategy name recorded in the metadata
    fn name(&self) -> &'static str;

    /// Generate a time-sampled path and its metadata
    fn generate(&self, world: &World, config: &Self::Config) -> MotionResult<(Path3D, PathMetadata)>;
}
