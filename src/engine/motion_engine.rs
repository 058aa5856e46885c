//! Multi-entity trajectory store with padding to a common length

use std::collections::BTreeMap;
use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::common::{MotionError, MotionResult, MotionStrategy, Path3D, PathMetadata, Point3D};
use crate::strategies::StrategyConfig;
use crate::world::World;

/// How a short path is stretched to the common trajectory length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingMode {
    /// Repeat the last position after the path ends
    #[default]
    PadEnd,
    /// Repeat the first position before the path starts
    PadStart,
}

impl fmt::Display for PaddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaddingMode::PadEnd => write!(f, "pad_end"),
            PaddingMode::PadStart => write!(f, "pad_start"),
        }
    }
}

/// Stored trajectory of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryEntry {
    pub path: Path3D,
    pub metadata: PathMetadata,
    pub padding: PaddingMode,
}

/// Generates and stores per-entity trajectories over one shared world.
///
/// Entity ids are kept in sorted order, so every listing is deterministic.
#[derive(Debug, Clone, Default)]
pub struct MotionEngine {
    world: World,
    entries: BTreeMap<String, TrajectoryEntry>,
}

impl MotionEngine {
    pub fn new(world: World) -> Self {
        MotionEngine { world, entries: BTreeMap::new() }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run `strategy` and store the result under `entity_id`, replacing any
    /// previous trajectory. On error the store is left untouched.
    pub fn generate_path<S: MotionStrategy>(
        &mut self,
        entity_id: &str,
        strategy: &S,
        config: &S::Config,
        padding: PaddingMode,
    ) -> MotionResult<(Path3D, PathMetadata)> {
        let (path, metadata) = strategy.generate(&self.world, config)?;
        self.store(entity_id, &path, &metadata, padding)?;
        Ok((path, metadata))
    }

    /// Tagged-config form of [`MotionEngine::generate_path`]
    pub fn generate_from_config(
        &mut self,
        entity_id: &str,
        config: &StrategyConfig,
        padding: PaddingMode,
    ) -> MotionResult<(Path3D, PathMetadata)> {
        let (path, metadata) = config.generate(&self.world)?;
        self.store(entity_id, &path, &metadata, padding)?;
        Ok((path, metadata))
    }

    /// Generate `count` paths with one strategy instance, stored as
    /// `{prefix}_000`, `{prefix}_001`, and so on. Stops at the first failure;
    /// paths generated before it stay stored.
    pub fn generate_batch<S: MotionStrategy>(
        &mut self,
        prefix: &str,
        strategy: &S,
        config: &S::Config,
        count: usize,
        padding: PaddingMode,
    ) -> MotionResult<Vec<String>> {
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let id = format!("{}_{:03}", prefix, i);
            let (path, mut metadata) = strategy.generate(&self.world, config)?;
            metadata.strategy = format!("{}_Batch", metadata.strategy);
            metadata = metadata.with("batch_index", i as u64);
            self.store(&id, &path, &metadata, padding)?;
            ids.push(id);
        }
        info!("Generated batch '{}' of {} paths", prefix, count);
        Ok(ids)
    }

    /// Store an externally produced trajectory. Empty paths are rejected,
    /// since padding needs a first and a last position.
    pub fn insert_path(
        &mut self,
        entity_id: &str,
        path: Path3D,
        metadata: PathMetadata,
        padding: PaddingMode,
    ) -> MotionResult<()> {
        if path.is_empty() {
            return Err(MotionError::InvalidParameter(format!("empty path for entity '{}'", entity_id)));
        }
        self.entries
            .insert(entity_id.to_string(), TrajectoryEntry { path, metadata, padding });
        Ok(())
    }

    fn store(
        &mut self,
        entity_id: &str,
        path: &Path3D,
        metadata: &PathMetadata,
        padding: PaddingMode,
    ) -> MotionResult<()> {
        info!(
            "Generated {} path for {}: {} points, {:.2} m",
            metadata.strategy,
            entity_id,
            path.len(),
            metadata.total_distance
        );
        self.insert_path(entity_id, path.clone(), metadata.clone(), padding)
    }

    pub fn set_padding_mode(&mut self, entity_id: &str, padding: PaddingMode) -> MotionResult<()> {
        let entry = self
            .entries
            .get_mut(entity_id)
            .ok_or_else(|| MotionError::UnknownEntity(entity_id.to_string()))?;
        entry.padding = padding;
        Ok(())
    }

    pub fn remove_entity(&mut self, entity_id: &str) -> Option<TrajectoryEntry> {
        self.entries.remove(entity_id)
    }

    pub fn get_path(&self, entity_id: &str) -> Option<&Path3D> {
        self.entries.get(entity_id).map(|e| &e.path)
    }

    pub fn get_metadata(&self, entity_id: &str) -> Option<&PathMetadata> {
        self.entries.get(entity_id).map(|e| &e.metadata)
    }

    pub fn padding_mode(&self, entity_id: &str) -> Option<PaddingMode> {
        self.entries.get(entity_id).map(|e| e.padding)
    }

    pub fn entity_ids(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn get_all_paths(&self) -> impl Iterator<Item = (&str, &Path3D)> + '_ {
        self.entries.iter().map(|(id, e)| (id.as_str(), &e.path))
    }

    /// Length of the longest stored path, 0 when empty
    pub fn get_max_path_length(&self) -> usize {
        self.entries.values().map(|e| e.path.len()).max().unwrap_or(0)
    }

    /// Pad every stored path to the longest length. Never truncates;
    /// running it twice changes nothing.
    pub fn finalize_trajectories(&mut self) {
        let target = self.get_max_path_length();
        for entry in self.entries.values_mut() {
            let points = &mut entry.path.points;
            let missing = target - points.len();
            if missing == 0 {
                continue;
            }
            match entry.padding {
                PaddingMode::PadEnd => {
                    if let Some(&last) = points.last() {
                        points.extend(std::iter::repeat(last).take(missing));
                    }
                }
                PaddingMode::PadStart => {
                    if let Some(&first) = points.first() {
                        points.splice(0..0, std::iter::repeat(first).take(missing));
                    }
                }
            }
        }
        info!("Finalized {} trajectories to {} steps", self.entries.len(), target);
    }

    /// Position of every entity at step `k`; paths shorter than `k + 1`
    /// are skipped.
    pub fn get_all_positions_at_step(&self, k: usize) -> BTreeMap<String, Point3D> {
        self.entries
            .iter()
            .filter_map(|(id, e)| e.path.get(k).map(|p| (id.clone(), *p)))
            .collect()
    }
}
