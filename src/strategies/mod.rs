//! Motion strategies
//!
//! Each strategy pairs a config struct with a [`MotionStrategy`] impl.
//! [`StrategyConfig`] is the tagged form used by scenario files.

pub mod graph_nav;
pub mod math_modeling;
pub mod random_walk;
pub mod waypoint;

pub use graph_nav::{GraphNavConfig, GraphNavStrategy};
pub use math_modeling::{MathModelingConfig, MathModelingStrategy, SEGMENT_BOUNDARY_EPSILON};
pub use random_walk::{RandomWalkConfig, RandomWalkStrategy};
pub use waypoint::{WaypointConfig, WaypointStrategy, DUPLICATE_WAYPOINT_DISTANCE};

use serde::{Deserialize, Serialize};

use crate::common::{MotionResult, MotionStrategy, Path3D, PathMetadata};
use crate::world::World;

/// Strategy selection plus its parameters, tagged by `strategy_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy_type")]
pub enum StrategyConfig {
    RandomWalk(RandomWalkConfig),
    MathModeling(MathModelingConfig),
    Waypoint(WaypointConfig),
    GraphNav(GraphNavConfig),
}

impl StrategyConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyConfig::RandomWalk(_) => "RandomWalk",
            StrategyConfig::MathModeling(_) => "MathModeling",
            StrategyConfig::Waypoint(_) => "Waypoint",
            StrategyConfig::GraphNav(_) => "GraphNav",
        }
    }

    pub fn time_step(&self) -> f64 {
        match self {
            StrategyConfig::RandomWalk(c) => c.time_step,
            StrategyConfig::MathModeling(c) => c.time_step,
            StrategyConfig::Waypoint(c) => c.time_step,
            StrategyConfig::GraphNav(c) => c.time_step,
        }
    }

    pub fn validate(&self) -> MotionResult<()> {
        match self {
            StrategyConfig::RandomWalk(c) => c.validate(),
            StrategyConfig::MathModeling(c) => c.validate(),
            StrategyConfig::Waypoint(c) => c.validate(),
            StrategyConfig::GraphNav(c) => c.validate(),
        }
    }

    /// Run the selected strategy. Graph navigation builds its roadmap here,
    /// so repeated calls resample it unless a precomputed graph is set.
    pub fn generate(&self, world: &World) -> MotionResult<(Path3D, PathMetadata)> {
        match self {
            StrategyConfig::RandomWalk(c) => RandomWalkStrategy.generate(world, c),
            StrategyConfig::MathModeling(c) => MathModelingStrategy.generate(world, c),
            StrategyConfig::Waypoint(c) => WaypointStrategy.generate(world, c),
            StrategyConfig::GraphNav(c) => GraphNavStrategy::build(world, c)?.generate(world, c),
        }
    }
}

impl From<RandomWalkConfig> for StrategyConfig {
    fn from(config: RandomWalkConfig) -> Self {
        StrategyConfig::RandomWalk(config)
    }
}

impl From<MathModelingConfig> for StrategyConfig {
    fn from(config: MathModelingConfig) -> Self {
        StrategyConfig::MathModeling(config)
    }
}

impl From<WaypointConfig> for StrategyConfig {
    fn from(config: WaypointConfig) -> Self {
        StrategyConfig::Waypoint(config)
    }
}

impl From<GraphNavConfig> for StrategyConfig {
    fn from(config: GraphNavConfig) -> Self {
        StrategyConfig::GraphNav(config)
    }
}
