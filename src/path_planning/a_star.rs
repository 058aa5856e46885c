//! A* shortest path over a roadmap graph
//!
//! Edge cost and heuristic are both Euclidean distance. Edges are straight
//! segments, so the heuristic never overestimates and is consistent.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::trace;
use ordered_float::OrderedFloat;

use crate::common::Point3D;
use crate::path_planning::roadmap::Graph;

/// Priority queue item, ordered for a min-heap on `f_score`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueueItem {
    f_score: OrderedFloat<f64>,
    index: usize,
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other.f_score.cmp(&self.f_score)
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Node indices from `start` to `goal` inclusive, empty when unreachable or
/// when either index is out of range.
pub fn a_star_indices(graph: &Graph, start: usize, goal: usize) -> Vec<usize> {
    let n = graph.num_nodes();
    if start >= n || goal >= n {
        return Vec::new();
    }

    let nodes = graph.nodes();
    let heuristic = |i: usize| nodes[i].distance(&nodes[goal]);

    let mut g_score = vec![f64::INFINITY; n];
    let mut came_from: Vec<Option<usize>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut open_set = BinaryHeap::new();

    g_score[start] = 0.0;
    open_set.push(QueueItem { f_score: OrderedFloat(heuristic(start)), index: start });

    let mut expanded = 0usize;
    while let Some(QueueItem { index: current, .. }) = open_set.pop() {
        if current == goal {
            trace!("A* reached goal after expanding {} nodes", expanded);
            return reconstruct_path(&came_from, current);
        }
        if closed[current] {
            continue;
        }
        closed[current] = true;
        expanded += 1;

        for &neighbor in graph.neighbors(current) {
            if closed[neighbor] {
                continue;
            }
            let tentative = g_score[current] + nodes[current].distance(&nodes[neighbor]);
            if tentative < g_score[neighbor] {
                g_score[neighbor] = tentative;
                came_from[neighbor] = Some(current);
                open_set.push(QueueItem {
                    f_score: OrderedFloat(tentative + heuristic(neighbor)),
                    index: neighbor,
                });
            }
        }
    }

    Vec::new()
}

/// Node positions from `start` to `goal`, empty when no path exists
pub fn a_star_search(graph: &Graph, start: usize, goal: usize) -> Vec<Point3D> {
    a_star_indices(graph, start, goal)
        .into_iter()
        .map(|i| graph.nodes()[i])
        .collect()
}

fn reconstruct_path(came_from: &[Option<usize>], goal: usize) -> Vec<usize> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(parent) = came_from[current] {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}
