//! Obstacle-aware random walk in the XY plane

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::common::{MotionError, MotionResult, MotionStrategy, Path3D, PathMetadata, Point3D};
use crate::world::World;

/// Random walk configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalkConfig {
    /// Sampling interval [s]
    pub time_step: f64,
    pub starting_position: Point3D,
    pub num_steps: usize,
    /// Distance covered per step [m]
    pub step_size: f64,
    /// Directions tried per step before standing still
    pub max_retries: usize,
    /// Seed for reproducible walks
    pub random_seed: Option<u64>,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0,
            starting_position: Point3D::origin(),
            num_steps: 500,
            step_size: 1.0,
            max_retries: 10,
            random_seed: None,
        }
    }
}

impl RandomWalkConfig {
    pub fn validate(&self) -> MotionResult<()> {
        if !(self.time_step > 0.0) {
            return Err(MotionError::InvalidParameter(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.num_steps == 0 {
            return Err(MotionError::InvalidParameter("num_steps must be at least 1".to_string()));
        }
        if !(self.step_size >= 0.0) {
            return Err(MotionError::InvalidParameter(format!(
                "step_size must be non-negative, got {}",
                self.step_size
            )));
        }
        Ok(())
    }
}

/// Stochastic walk that never steps into an obstacle or out of bounds
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomWalkStrategy;

impl RandomWalkStrategy {
    pub fn new() -> Self {
        RandomWalkStrategy
    }

    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        world: &World,
        config: &RandomWalkConfig,
        rng: &mut R,
    ) -> MotionResult<(Path3D, PathMetadata)> {
        config.validate()?;

        let start = config.starting_position;
        if !world.is_position_valid(&start) {
            warn!("Random walk starts at an invalid position {:?}", start);
        }

        let mut path = Path3D::from_points(Vec::with_capacity(config.num_steps));
        path.push(start);
        let mut current = start;
        let mut stalled = 0usize;

        for _ in 1..config.num_steps {
            match self.next_step(world, config, &current, rng) {
                Some(next) => current = next,
                None => stalled += 1,
            }
            path.push(current);
        }

        if stalled > 0 {
            debug!("Random walk stood still on {} of {} steps", stalled, config.num_steps - 1);
        }

        let metadata = PathMetadata::new(
            self.name(),
            path.total_length(),
            config.num_steps as f64 * config.time_step,
            config.time_step,
        )
        .with("avg_velocity", config.step_size / config.time_step)
        .with("stalled_steps", stalled as u64);

        Ok((path, metadata))
    }

    /// First of up to `max_retries` random unit steps that lands on a valid
    /// position; z stays at the starting height.
    fn next_step<R: Rng + ?Sized>(
        &self,
        world: &World,
        config: &RandomWalkConfig,
        current: &Point3D,
        rng: &mut R,
    ) -> Option<Point3D> {
        let z_height = config.starting_position.z;
        for _ in 0..config.max_retries {
            let dx: f64 = StandardNormal.sample(rng);
            let dy: f64 = StandardNormal.sample(rng);
            let norm = dx.hypot(dy);
            let (ux, uy) = if norm > 0.0 { (dx / norm, dy / norm) } else { (dx, dy) };

            let candidate = Point3D::new(
                current.x + ux * config.step_size,
                current.y + uy * config.step_size,
                z_height,
            );
            if world.is_position_valid(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

impl MotionStrategy for RandomWalkStrategy {
    type Config = RandomWalkConfig;

    fn name(&self) -> &'static str {
        "RandomWalk"
    }

    fn generate(&self, world: &World, config: &RandomWalkConfig) -> MotionResult<(Path3D, PathMetadata)> {
        let mut rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.generate_with_rng(world, config, &mut rng)
    }
}
