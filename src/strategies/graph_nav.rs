//! Roadmap navigation: route between random roadmap nodes, then travel it
//! at constant speed.

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::{MotionError, MotionResult, MotionStrategy, Path3D, PathMetadata};
use crate::path_planning::{
    build_roadmap, query_roadmap, query_roadmap_with_rng, resample_constant_speed, Graph, QueryConfig,
    RoadmapConfig, RoadmapQuery,
};
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphNavConfig {
    pub time_step: f64,
    /// Travel speed [m/s]
    pub velocity: f64,
    /// Paths produced by a batch run
    pub num_simulations: usize,
    #[serde(flatten)]
    pub roadmap: RoadmapConfig,
    #[serde(flatten)]
    pub query: QueryConfig,
    /// Reuse this roadmap instead of sampling a new one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precomputed_graph: Option<Graph>,
}

impl Default for GraphNavConfig {
    fn default() -> Self {
        Self {
            time_step: 1.0,
            velocity: 1.0,
            num_simulations: 100,
            roadmap: RoadmapConfig::default(),
            query: QueryConfig::default(),
            precomputed_graph: None,
        }
    }
}

impl GraphNavConfig {
    pub fn validate(&self) -> MotionResult<()> {
        if !(self.time_step > 0.0) {
            return Err(MotionError::InvalidParameter(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if !(self.velocity > 0.0) {
            return Err(MotionError::InvalidParameter(format!(
                "velocity must be positive, got {}",
                self.velocity
            )));
        }
        match &self.precomputed_graph {
            Some(graph) => graph.validate(),
            None => self.roadmap.validate(),
        }
    }
}

/// Navigation over a fixed roadmap. The roadmap is built once and shared by
/// every path generated through this strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNavStrategy {
    graph: Graph,
}

impl GraphNavStrategy {
    /// Wrap an existing roadmap; a malformed graph is reported on the first
    /// query
    pub fn new(graph: Graph) -> Self {
        GraphNavStrategy { graph }
    }

    /// Take the config's precomputed roadmap, or sample one over `world`
    pub fn build(world: &World, config: &GraphNavConfig) -> MotionResult<Self> {
        config.validate()?;
        let graph = match &config.precomputed_graph {
            Some(graph) => graph.clone(),
            None => build_roadmap(world, &config.roadmap)?,
        };
        info!(
            "Graph navigation ready: {} nodes, {} edges",
            graph.num_nodes(),
            graph.num_edges()
        );
        Ok(Self::new(graph))
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Same as [`MotionStrategy::generate`] with a caller-supplied RNG
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        world: &World,
        config: &GraphNavConfig,
        rng: &mut R,
    ) -> MotionResult<(Path3D, PathMetadata)> {
        config.validate()?;
        let route = query_roadmap_with_rng(&self.graph, world, &config.query, rng)?;
        self.finish(route, config)
    }

    fn finish(&self, route: RoadmapQuery, config: &GraphNavConfig) -> MotionResult<(Path3D, PathMetadata)> {
        let timed = resample_constant_speed(&route.path.points, config.velocity, config.time_step)?;
        let metadata = PathMetadata::new(self.name(), timed.total_length, timed.duration, config.time_step)
            .with("velocity", config.velocity)
            .with("graph_nodes", self.graph.num_nodes() as u64)
            .with("start_node", route.start as u64)
            .with("goal_node", route.goal as u64)
            .with("attempts", route.attempts as u64)
            .with("smoothed", route.smoothed);
        Ok((Path3D::from_points(timed.points), metadata))
    }
}

impl MotionStrategy for GraphNavStrategy {
    type Config = GraphNavConfig;

    fn name(&self) -> &'static str {
        "GraphNav"
    }

    fn generate(&self, world: &World, config: &GraphNavConfig) -> MotionResult<(Path3D, PathMetadata)> {
        config.validate()?;
        let route = query_roadmap(&self.graph, world, &config.query)?;
        self.finish(route, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Point3D;
    use crate::path_planning::build_roadmap_with_rng;
    use crate::world::{Bounds, Obstacle};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn world() -> World {
        World::new(
            vec![Obstacle::new(Point3D::new(-5.0, -30.0, 0.0), Point3D::new(5.0, 30.0, 10.0))],
            Bounds::planar([-50.0, 50.0], [-50.0, 50.0]),
        )
    }

    fn config() -> GraphNavConfig {
        GraphNavConfig {
            velocity: 2.0,
            roadmap: RoadmapConfig {
                num_samples: 120,
                max_connection_radius: 30.0,
                min_connection_radius: 4.0,
                los_step: 1.0,
                max_sampling_rounds: 50,
                ..RoadmapConfig::default()
            },
            query: QueryConfig {
                min_path_distance: 40.0,
                ..QueryConfig::default()
            },
            ..GraphNavConfig::default()
        }
    }

    fn strategy(w: &World, cfg: &GraphNavConfig, rng: &mut StdRng) -> GraphNavStrategy {
        GraphNavStrategy::new(build_roadmap_with_rng(w, &cfg.roadmap, rng).unwrap())
    }

    #[test]
    fn test_generated_path_is_valid_and_timed() {
        let w = world();
        let cfg = config();
        let mut rng = StdRng::seed_from_u64(11);
        let nav = strategy(&w, &cfg, &mut rng);

        let (path, meta) = nav.generate_with_rng(&w, &cfg, &mut rng).unwrap();
        assert!(w.all_valid(&path.points));
        assert!(meta.total_distance >= 40.0);
        for pair in path.points.windows(2) {
            assert!(pair[0].distance(&pair[1]) <= 2.0 + 1e-9);
        }
        assert!(path.points.iter().all(|p| (p.z - 1.5).abs() < 1e-6));
        assert_eq!(meta.strategy, "GraphNav");
        assert_eq!(
            meta.extra("graph_nodes"),
            Some(&serde_json::Value::from(nav.graph().num_nodes() as u64))
        );
    }

    #[test]
    fn test_shared_roadmap_yields_distinct_paths() {
        let w = world();
        let cfg = config();
        let mut rng = StdRng::seed_from_u64(5);
        let nav = strategy(&w, &cfg, &mut rng);

        let (a, _) = nav.generate_with_rng(&w, &cfg, &mut rng).unwrap();
        let (b, _) = nav.generate_with_rng(&w, &cfg, &mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_precomputed_graph_is_reused() {
        let w = world();
        let mut graph = Graph::from_nodes(vec![Point3D::new(-40.0, -40.0, 1.5), Point3D::new(40.0, -40.0, 1.5)]);
        graph.add_edge(0, 1);
        let cfg = GraphNavConfig {
            precomputed_graph: Some(graph.clone()),
            query: QueryConfig {
                enable_smoothing: false,
                min_path_distance: 50.0,
                ..QueryConfig::default()
            },
            velocity: 10.0,
            ..GraphNavConfig::default()
        };

        let nav = GraphNavStrategy::build(&w, &cfg).unwrap();
        assert_eq!(nav.graph(), &graph);
        let (path, meta) = nav.generate(&w, &cfg).unwrap();
        assert_eq!(path.len(), 9);
        assert!((meta.total_distance - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_unreachable_minimum_distance_exhausts() {
        let w = world();
        let mut cfg = config();
        cfg.query.min_path_distance = 1e6;
        cfg.query.max_attempts = 5;
        let mut rng = StdRng::seed_from_u64(3);
        let nav = strategy(&w, &cfg, &mut rng);

        let err = nav.generate_with_rng(&w, &cfg, &mut rng).unwrap_err();
        assert!(matches!(err, MotionError::SearchExhausted { attempts: 5 }));
    }

    #[test]
    fn test_tiny_graph_is_rejected() {
        let nav = GraphNavStrategy::new(Graph::from_nodes(vec![Point3D::origin()]));
        let err = nav.generate(&World::default(), &GraphNavConfig::default()).unwrap_err();
        assert!(matches!(err, MotionError::GraphTooSmall { nodes: 1 }));
    }

    #[test]
    fn test_config_from_flat_json() {
        let cfg: GraphNavConfig = serde_json::from_str(
            r#"{"time_step": 0.5, "velocity": 3, "num_samples": 200, "min_path_distance": 50}"#,
        )
        .unwrap();
        assert_eq!(cfg.time_step, 0.5);
        assert_eq!(cfg.velocity, 3.0);
        assert_eq!(cfg.roadmap.num_samples, 200);
        assert_eq!(cfg.roadmap.k_neighbors, 15);
        assert_eq!(cfg.query.min_path_distance, 50.0);
        assert!(cfg.query.enable_smoothing);
    }

    #[test]
    fn test_malformed_precomputed_graph_is_rejected() {
        let cfg: GraphNavConfig = serde_json::from_str(
            r#"{"precomputed_graph": {"nodes": [[0, 0, 0], [10, 0, 0]], "adjacency": [[7], []]}}"#,
        )
        .unwrap();
        assert!(matches!(cfg.validate(), Err(MotionError::InvalidParameter(_))));
        assert!(matches!(
            GraphNavStrategy::build(&World::default(), &cfg),
            Err(MotionError::InvalidParameter(_))
        ));

        let nav = GraphNavStrategy::new(cfg.precomputed_graph.clone().unwrap());
        let plain = GraphNavConfig { precomputed_graph: None, ..cfg };
        assert!(matches!(
            nav.generate(&World::default(), &plain),
            Err(MotionError::InvalidParameter(_))
        ));
    }
}
