// Probabilistic Road-Map (PRM) construction and querying
// author: Atsushi Sakai (@Atsushi_twi)
//         Ryohei Sasaki (@rsasaki0109)
//         Rust port

use std::collections::{BTreeSet, HashSet};

use itertools::Itertools;
use log::{debug, info};
use ordered_float::OrderedFloat;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::common::{MotionError, MotionResult, Path3D, Point3D};
use crate::path_planning::a_star::a_star_search;
use crate::path_planning::path_smoothing::{calculate_smooth_path, DEFAULT_RESOLUTION_PER_METER};
use crate::world::World;

/// Undirected roadmap; node indices address `nodes`, adjacency is symmetric
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Point3D>,
    adjacency: Vec<BTreeSet<usize>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph with the given nodes and no edges
    pub fn from_nodes(nodes: Vec<Point3D>) -> Self {
        let adjacency = vec![BTreeSet::new(); nodes.len()];
        Self { nodes, adjacency }
    }

    /// Insert both directions of an edge. Self loops and out-of-range
    /// indices are ignored; returns whether a new edge was added.
    pub fn add_edge(&mut self, i: usize, j: usize) -> bool {
        if i == j || i >= self.nodes.len() || j >= self.nodes.len() {
            return false;
        }
        let added = self.adjacency[i].insert(j);
        self.adjacency[j].insert(i);
        added
    }

    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        self.adjacency.get(i).map_or(false, |n| n.contains(&j))
    }

    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = &usize> + '_ {
        self.adjacency.get(i).into_iter().flatten()
    }

    pub fn nodes(&self) -> &[Point3D] {
        &self.nodes
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Each undirected edge once, as `(i, j)` with `i < j`
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(i, nbrs)| nbrs.iter().filter(move |&&j| i < j).map(move |&j| (i, j)))
            .collect()
    }

    /// Edge segments for display
    pub fn edge_segments(&self) -> Vec<(Point3D, Point3D)> {
        self.edges().into_iter().map(|(i, j)| (self.nodes[i], self.nodes[j])).collect()
    }

    /// Check the structure of a graph that did not come from `add_edge`,
    /// e.g. one read from JSON: one adjacency set per node, neighbour
    /// indices in range, no self loops and every edge stored both ways.
    pub fn validate(&self) -> MotionResult<()> {
        let n = self.nodes.len();
        if self.adjacency.len() != n {
            return Err(MotionError::InvalidParameter(format!(
                "graph has {} nodes but {} adjacency sets",
                n,
                self.adjacency.len()
            )));
        }
        for (i, nbrs) in self.adjacency.iter().enumerate() {
            for &j in nbrs {
                if j >= n {
                    return Err(MotionError::InvalidParameter(format!(
                        "edge {} -> {} points past the last node",
                        i, j
                    )));
                }
                if j == i {
                    return Err(MotionError::InvalidParameter(format!("self loop on node {}", i)));
                }
                if !self.adjacency[j].contains(&i) {
                    return Err(MotionError::InvalidParameter(format!(
                        "edge {} -> {} has no reverse entry",
                        i, j
                    )));
                }
            }
        }
        Ok(())
    }

    /// Sum of edge lengths along a node sequence
    pub fn path_length(points: &[Point3D]) -> f64 {
        points.iter().tuple_windows().map(|(a, b)| a.distance(b)).sum()
    }
}

/// Brute-force nearest neighbour index over accepted roadmap nodes
struct NodeIndex {
    points: Vec<Point3D>,
}

impl NodeIndex {
    fn new() -> Self {
        NodeIndex { points: Vec::new() }
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn push(&mut self, p: Point3D) {
        self.points.push(p);
    }

    /// Distance to the closest node, infinity when empty
    fn min_distance(&self, p: &Point3D) -> f64 {
        self.points.iter().map(|q| q.distance(p)).fold(f64::INFINITY, f64::min)
    }

    /// Up to `k` nearest other nodes within `radius` of node `i`
    fn query_knn(&self, i: usize, k: usize, radius: f64) -> Vec<(usize, f64)> {
        let origin = self.points[i];
        let mut distances: Vec<(usize, f64)> = self
            .points
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(j, q)| (j, origin.distance(q)))
            .filter(|&(_, d)| d <= radius)
            .collect();

        distances.sort_by_key(|&(_, d)| OrderedFloat(d));
        distances.truncate(k);
        distances
    }

    fn into_points(self) -> Vec<Point3D> {
        self.points
    }
}

/// Roadmap construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadmapConfig {
    /// Target number of nodes
    pub num_samples: usize,
    /// Maximum edge length [m]
    pub max_connection_radius: f64,
    /// Minimum spacing between nodes [m]
    pub min_connection_radius: f64,
    /// Fixed z of every node [m]
    pub sample_height: f64,
    /// Neighbours considered per node
    pub k_neighbors: usize,
    /// Line-of-sight sampling step for edges [m]
    pub los_step: f64,
    /// Sampling batches before giving up on reaching `num_samples`
    pub max_sampling_rounds: usize,
}

impl Default for RoadmapConfig {
    fn default() -> Self {
        Self {
            num_samples: 1500,
            max_connection_radius: 200.0,
            min_connection_radius: 20.0,
            sample_height: 1.5,
            k_neighbors: 15,
            los_step: 4.0,
            max_sampling_rounds: 100,
        }
    }
}

impl RoadmapConfig {
    pub fn validate(&self) -> MotionResult<()> {
        if self.num_samples < 2 {
            return Err(MotionError::InvalidParameter("num_samples must be at least 2".to_string()));
        }
        if !(self.max_connection_radius > 0.0) || self.min_connection_radius < 0.0 {
            return Err(MotionError::InvalidParameter(format!(
                "invalid connection radii: max {}, min {}",
                self.max_connection_radius, self.min_connection_radius
            )));
        }
        if !(self.los_step > 0.0) {
            return Err(MotionError::InvalidParameter("los_step must be positive".to_string()));
        }
        Ok(())
    }
}

fn planar_range(range: Option<[f64; 2]>, axis: &str) -> MotionResult<[f64; 2]> {
    match range {
        Some([lo, hi]) if lo.is_finite() && hi.is_finite() && lo <= hi => Ok([lo, hi]),
        Some(r) => Err(MotionError::InvalidParameter(format!("invalid {} bounds {:?}", axis, r))),
        None => Err(MotionError::InvalidParameter(format!(
            "roadmap sampling requires {} bounds",
            axis
        ))),
    }
}

/// Build a roadmap with the thread RNG; results are not reproducible
pub fn build_roadmap(world: &World, config: &RoadmapConfig) -> MotionResult<Graph> {
    build_roadmap_with_rng(world, config, &mut rand::thread_rng())
}

/// Sample spaced, valid nodes inside the world's x/y bounds, then connect
/// each node to its nearest neighbours that are in line of sight.
///
/// The graph may end up with fewer than `num_samples` nodes when the
/// sampling rounds run out.
pub fn build_roadmap_with_rng<R: Rng + ?Sized>(
    world: &World,
    config: &RoadmapConfig,
    rng: &mut R,
) -> MotionResult<Graph> {
    config.validate()?;
    let [x_min, x_max] = planar_range(world.bounds.x, "x")?;
    let [y_min, y_max] = planar_range(world.bounds.y, "y")?;

    let x_dist = Uniform::new_inclusive(x_min, x_max);
    let y_dist = Uniform::new_inclusive(y_min, y_max);
    let index = sample_nodes(world, config, rng, x_dist, y_dist);
    let edges = connect_nodes(world, config, &index);

    let mut graph = Graph::from_nodes(index.into_points());
    for (i, j) in edges {
        graph.add_edge(i, j);
    }

    info!(
        "Built roadmap with {} nodes and {} edges",
        graph.num_nodes(),
        graph.num_edges()
    );
    Ok(graph)
}

fn sample_nodes<R: Rng + ?Sized>(
    world: &World,
    config: &RoadmapConfig,
    rng: &mut R,
    x_dist: Uniform<f64>,
    y_dist: Uniform<f64>,
) -> NodeIndex {
    let mut index = NodeIndex::new();
    let mut rounds = 0;

    while index.len() < config.num_samples && rounds < config.max_sampling_rounds {
        for _ in 0..config.num_samples {
            if index.len() >= config.num_samples {
                break;
            }
            let candidate = Point3D::new(x_dist.sample(rng), y_dist.sample(rng), config.sample_height);
            if !world.is_position_valid(&candidate) {
                continue;
            }
            // the index already holds nodes accepted earlier in this batch
            if index.min_distance(&candidate) < config.min_connection_radius {
                continue;
            }
            index.push(candidate);
        }
        rounds += 1;
    }

    debug!("Sampled {} roadmap nodes in {} rounds", index.len(), rounds);
    index
}

/// Line-of-sight edges between k-nearest neighbours; each unordered pair is
/// checked once even when it shows up in both nodes' neighbour lists
fn connect_nodes(world: &World, config: &RoadmapConfig, index: &NodeIndex) -> Vec<(usize, usize)> {
    let mut considered: HashSet<(usize, usize)> = HashSet::new();
    let mut edges = Vec::new();

    for i in 0..index.len() {
        for (j, _) in index.query_knn(i, config.k_neighbors, config.max_connection_radius) {
            let pair = (i.min(j), i.max(j));
            if !considered.insert(pair) {
                continue;
            }
            if world.check_line_of_sight(&index.points[i], &index.points[j], config.los_step) {
                edges.push(pair);
            }
        }
    }
    edges
}

/// Roadmap query parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Shortest acceptable route length [m]
    pub min_path_distance: f64,
    pub enable_smoothing: bool,
    pub smoothing_resolution: f64,
    pub max_attempts: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            min_path_distance: 100.0,
            enable_smoothing: true,
            smoothing_resolution: DEFAULT_RESOLUTION_PER_METER,
            max_attempts: 100,
        }
    }
}

/// Accepted route between two random roadmap nodes
#[derive(Debug, Clone, PartialEq)]
pub struct RoadmapQuery {
    pub path: Path3D,
    pub start: usize,
    pub goal: usize,
    pub attempts: usize,
    pub smoothed: bool,
}

/// Query a random route with the thread RNG
pub fn query_roadmap(graph: &Graph, world: &World, config: &QueryConfig) -> MotionResult<RoadmapQuery> {
    query_roadmap_with_rng(graph, world, config, &mut rand::thread_rng())
}

/// Pick random distinct start/goal nodes and search with A*, retrying on
/// unreachable pairs, routes shorter than `min_path_distance`, and smoothed
/// routes that leave free space.
pub fn query_roadmap_with_rng<R: Rng + ?Sized>(
    graph: &Graph,
    world: &World,
    config: &QueryConfig,
    rng: &mut R,
) -> MotionResult<RoadmapQuery> {
    graph.validate()?;
    let n = graph.num_nodes();
    if n < 2 {
        return Err(MotionError::GraphTooSmall { nodes: n });
    }

    let pick = Uniform::new(0, n);
    for attempt in 1..=config.max_attempts {
        let start = pick.sample(rng);
        let goal = pick.sample(rng);
        if start == goal {
            continue;
        }

        let raw = a_star_search(graph, start, goal);
        if raw.is_empty() {
            continue;
        }
        if Graph::path_length(&raw) < config.min_path_distance {
            continue;
        }

        let (points, smoothed) = if config.enable_smoothing {
            let candidate = calculate_smooth_path(&raw, config.smoothing_resolution);
            // smoothed corners can cut through obstacles the raw route avoided
            if !world.all_valid(&candidate) {
                debug!("Attempt {}: smoothed route {} -> {} leaves free space", attempt, start, goal);
                continue;
            }
            (candidate, raw.len() >= 3)
        } else {
            (raw, false)
        };

        debug!("Found route {} -> {} after {} attempts", start, goal, attempt);
        return Ok(RoadmapQuery {
            path: Path3D::from_points(points),
            start,
            goal,
            attempts: attempt,
            smoothed,
        });
    }

    Err(MotionError::SearchExhausted { attempts: config.max_attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Bounds, Obstacle};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn walled_world() -> World {
        World::new(
            vec![Obstacle::new(Point3D::new(-5.0, -40.0, 0.0), Point3D::new(5.0, 40.0, 10.0))],
            Bounds::planar([-50.0, 50.0], [-50.0, 50.0]),
        )
    }

    fn small_config() -> RoadmapConfig {
        RoadmapConfig {
            num_samples: 150,
            max_connection_radius: 30.0,
            min_connection_radius: 4.0,
            sample_height: 1.5,
            k_neighbors: 15,
            los_step: 1.0,
            max_sampling_rounds: 50,
        }
    }

    #[test]
    fn test_graph_edges_are_symmetric() {
        let mut g = Graph::from_nodes(vec![
            Point3D::origin(),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(2.0, 0.0, 0.0),
        ]);
        assert!(g.add_edge(0, 1));
        assert!(!g.add_edge(1, 0));
        assert!(!g.add_edge(2, 2));
        assert!(!g.add_edge(0, 9));
        assert!(g.has_edge(1, 0));
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.edges(), vec![(0, 1)]);
        assert_eq!(g.neighbors(5).count(), 0);
    }

    #[test]
    fn test_validate_rejects_malformed_graphs() {
        let dangling: Graph =
            serde_json::from_str(r#"{"nodes": [[0, 0, 0], [10, 0, 0]], "adjacency": [[7], []]}"#).unwrap();
        assert!(matches!(dangling.validate(), Err(MotionError::InvalidParameter(_))));

        let one_way: Graph =
            serde_json::from_str(r#"{"nodes": [[0, 0, 0], [10, 0, 0]], "adjacency": [[1], []]}"#).unwrap();
        assert!(matches!(one_way.validate(), Err(MotionError::InvalidParameter(_))));

        let short: Graph = serde_json::from_str(r#"{"nodes": [[0, 0, 0], [10, 0, 0]], "adjacency": [[]]}"#).unwrap();
        assert!(short.validate().is_err());

        let looped: Graph =
            serde_json::from_str(r#"{"nodes": [[0, 0, 0], [10, 0, 0]], "adjacency": [[0], []]}"#).unwrap();
        assert!(looped.validate().is_err());

        let good: Graph =
            serde_json::from_str(r#"{"nodes": [[0, 0, 0], [10, 0, 0]], "adjacency": [[1], [0]]}"#).unwrap();
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_query_rejects_dangling_edge() {
        let world = World::new(vec![], Bounds::unbounded());
        let graph: Graph =
            serde_json::from_str(r#"{"nodes": [[0, 0, 0], [10, 0, 0]], "adjacency": [[7], []]}"#).unwrap();
        let config = QueryConfig { min_path_distance: 1.0, ..QueryConfig::default() };
        let err = query_roadmap_with_rng(&graph, &world, &config, &mut StdRng::seed_from_u64(2)).unwrap_err();
        assert!(matches!(err, MotionError::InvalidParameter(_)));
    }

    #[test]
    fn test_build_roadmap_invariants() {
        let world = walled_world();
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(7);
        let graph = build_roadmap_with_rng(&world, &config, &mut rng).unwrap();

        assert!(graph.num_nodes() >= 2);
        assert!(graph.num_nodes() <= config.num_samples);
        for (i, p) in graph.nodes().iter().enumerate() {
            assert!(world.is_position_valid(p));
            assert_eq!(p.z, 1.5);
            for q in &graph.nodes()[i + 1..] {
                assert!(p.distance(q) >= config.min_connection_radius);
            }
        }
        for (i, j) in graph.edges() {
            assert!(graph.has_edge(j, i));
            let (a, b) = (graph.nodes()[i], graph.nodes()[j]);
            assert!(a.distance(&b) <= config.max_connection_radius);
            assert!(world.check_line_of_sight(&a, &b, config.los_step));
        }
    }

    #[test]
    fn test_no_edge_crosses_the_wall() {
        let world = walled_world();
        let graph = build_roadmap_with_rng(&world, &small_config(), &mut StdRng::seed_from_u64(11)).unwrap();
        for (a, b) in graph.edge_segments() {
            let crosses = (a.x < -5.0 && b.x > 5.0) || (a.x > 5.0 && b.x < -5.0);
            if crosses {
                // only possible around the wall ends
                assert!(a.y.abs() > 40.0 || b.y.abs() > 40.0);
            }
        }
    }

    #[test]
    fn test_build_requires_planar_bounds() {
        let world = World::new(vec![], Bounds::unbounded());
        let err = build_roadmap(&world, &small_config()).unwrap_err();
        assert!(matches!(err, MotionError::InvalidParameter(_)));
    }

    #[test]
    fn test_sampling_may_fall_short() {
        // a 10 x 10 area cannot hold many nodes 8 m apart
        let world = World::new(vec![], Bounds::planar([0.0, 10.0], [0.0, 10.0]));
        let config = RoadmapConfig {
            num_samples: 100,
            min_connection_radius: 8.0,
            max_sampling_rounds: 5,
            ..small_config()
        };
        let graph = build_roadmap_with_rng(&world, &config, &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(graph.num_nodes() < 100);
        assert!(graph.num_nodes() >= 1);
    }

    #[test]
    fn test_query_rejects_tiny_graph() {
        let world = walled_world();
        let graph = Graph::from_nodes(vec![Point3D::new(20.0, 20.0, 1.5)]);
        let err = query_roadmap(&graph, &world, &QueryConfig::default()).unwrap_err();
        assert!(matches!(err, MotionError::GraphTooSmall { nodes: 1 }));
    }

    #[test]
    fn test_query_exhausts_on_disconnected_graph() {
        let world = walled_world();
        let graph = Graph::from_nodes(vec![Point3D::new(20.0, 20.0, 1.5), Point3D::new(-20.0, 20.0, 1.5)]);
        let config = QueryConfig { max_attempts: 10, ..QueryConfig::default() };
        let err = query_roadmap_with_rng(&graph, &world, &config, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, MotionError::SearchExhausted { attempts: 10 }));
    }

    #[test]
    fn test_query_respects_min_distance() {
        let world = walled_world();
        let mut graph = Graph::from_nodes(vec![Point3D::new(20.0, 0.0, 1.5), Point3D::new(30.0, 0.0, 1.5)]);
        graph.add_edge(0, 1);
        let config = QueryConfig { min_path_distance: 50.0, max_attempts: 20, ..QueryConfig::default() };
        assert!(query_roadmap_with_rng(&graph, &world, &config, &mut StdRng::seed_from_u64(5)).is_err());

        let config = QueryConfig { min_path_distance: 5.0, ..config };
        let route = query_roadmap_with_rng(&graph, &world, &config, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(route.path.len(), 2);
        assert!(!route.smoothed);
    }

    #[test]
    fn test_query_smoothed_route_is_valid() {
        let world = walled_world();
        let graph = build_roadmap_with_rng(&world, &small_config(), &mut StdRng::seed_from_u64(21)).unwrap();
        let config = QueryConfig { min_path_distance: 20.0, ..QueryConfig::default() };
        let route = query_roadmap_with_rng(&graph, &world, &config, &mut StdRng::seed_from_u64(4)).unwrap();
        assert!(route.attempts >= 1 && route.attempts <= config.max_attempts);
        assert!(world.all_valid(&route.path.points));
        assert!(route.path.total_length() >= 20.0 * 0.5);
    }

    /// Corner route (0,0) -> (10,0) -> (10,-20) with a box tucked inside the
    /// corner: the raw route clears it, the smoothed curve cuts through it.
    fn corner_case() -> (World, Graph) {
        let world = World::new(
            vec![Obstacle::new(Point3D::new(10.5, -20.0, -1.0), Point3D::new(30.0, -0.5, 1.0))],
            Bounds::unbounded(),
        );
        let mut graph = Graph::from_nodes(vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(10.0, 0.0, 0.0),
            Point3D::new(10.0, -20.0, 0.0),
        ]);
        graph.add_edge(0, 1);
        graph.add_edge(1, 2);
        (world, graph)
    }

    #[test]
    fn test_colliding_smoothed_route_is_discarded() {
        let (world, graph) = corner_case();
        let raw = vec![graph.nodes()[0], graph.nodes()[1], graph.nodes()[2]];
        assert!(world.all_valid(&raw));
        assert!(!world.all_valid(&calculate_smooth_path(&raw, DEFAULT_RESOLUTION_PER_METER)));

        // only the 30 m corner route is long enough, and its smoothed form
        // collides, so no attempt may fall back to the raw route
        let config = QueryConfig { min_path_distance: 25.0, max_attempts: 50, ..QueryConfig::default() };
        let err = query_roadmap_with_rng(&graph, &world, &config, &mut StdRng::seed_from_u64(9)).unwrap_err();
        assert!(matches!(err, MotionError::SearchExhausted { attempts: 50 }));

        let config = QueryConfig { enable_smoothing: false, ..config };
        let route = query_roadmap_with_rng(&graph, &world, &config, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(route.path.len(), 3);
        assert!(!route.smoothed);
    }
}
