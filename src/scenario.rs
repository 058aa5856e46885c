//! JSON scenario files: a world, a list of entities with their strategy
//! configs, and an optional batch of graph-navigation paths.

use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::common::{MotionError, MotionResult};
use crate::engine::{MotionEngine, PaddingMode};
use crate::strategies::{GraphNavConfig, GraphNavStrategy, StrategyConfig};
use crate::world::World;

/// Two time steps closer than this are treated as equal [s]
const TIME_STEP_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub id: String,
    #[serde(default)]
    pub padding_mode: PaddingMode,
    pub config: StrategyConfig,
}

/// Many graph-navigation paths over one shared roadmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSpec {
    #[serde(default = "default_batch_prefix")]
    pub prefix: String,
    /// Defaults to `config.num_simulations`
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub padding_mode: PaddingMode,
    #[serde(default)]
    pub config: GraphNavConfig,
}

fn default_batch_prefix() -> String {
    "jammer".to_string()
}

impl BatchSpec {
    pub fn count(&self) -> usize {
        self.count.unwrap_or(self.config.num_simulations)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub world: World,
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchSpec>,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> MotionResult<Self> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> MotionResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Entity ids must be unique and every config must share one time step,
    /// otherwise step indices would not line up across entities.
    pub fn validate(&self) -> MotionResult<()> {
        let mut ids: Vec<&str> = self.entities.iter().map(|e| e.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(MotionError::InvalidParameter(format!("duplicate entity id '{}'", pair[0])));
        }

        let steps = self
            .entities
            .iter()
            .map(|e| e.config.time_step())
            .chain(self.batch.iter().map(|b| b.config.time_step));
        let mut reference: Option<f64> = None;
        for dt in steps {
            match reference {
                None => reference = Some(dt),
                Some(r) if (r - dt).abs() > TIME_STEP_TOLERANCE => {
                    return Err(MotionError::InvalidParameter(format!(
                        "all entities must share one time_step, found {} and {}",
                        r, dt
                    )));
                }
                Some(_) => {}
            }
        }

        self.entities.iter().try_for_each(|e| e.config.validate())?;
        if let Some(batch) = &self.batch {
            batch.config.validate()?;
        }
        Ok(())
    }

    /// Generate every entity, then the batch, and pad all trajectories to a
    /// common length.
    pub fn run(&self) -> MotionResult<MotionEngine> {
        self.validate()?;
        let mut engine = MotionEngine::new(self.world.clone());

        for entity in &self.entities {
            engine.generate_from_config(&entity.id, &entity.config, entity.padding_mode)?;
        }

        if let Some(batch) = &self.batch {
            let strategy = GraphNavStrategy::build(engine.world(), &batch.config)?;
            engine.generate_batch(&batch.prefix, &strategy, &batch.config, batch.count(), batch.padding_mode)?;
        }

        engine.finalize_trajectories();
        info!(
            "Scenario complete: {} entities, {} steps",
            engine.len(),
            engine.get_max_path_length()
        );
        Ok(engine)
    }
}
