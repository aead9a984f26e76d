//! Auto-layout: one-shot left-to-right leveling of the workflow graph.
//!
//! Nodes are assigned to columns ("levels") by a breadth-first walk from the
//! roots (in-degree 0), stacked vertically within each column, and every
//! column is centred against the tallest one. The result is a plan; the
//! caller writes it back to the store in one batch.

use crate::error::LayoutError;
use crate::geometry::snap_point;
use crate::id::NodeId;
use crate::model::{NodeType, Point};
use crate::store::WorkflowStore;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Spacing constants for auto-layout, in logical canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub start_x: f32,
    pub start_y: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub horizontal_gap: f32,
    pub vertical_gap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_x: 40.0,
            start_y: 40.0,
            node_width: 200.0,
            node_height: 80.0,
            horizontal_gap: 80.0,
            vertical_gap: 40.0,
        }
    }
}

pub type Level = SmallVec<[NodeId; 4]>;

/// Output of [`compute_layout`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    /// Node ids per column, left to right.
    pub levels: Vec<Level>,
    /// Final grid-snapped top-left position for every node, in store order.
    pub positions: Vec<(NodeId, Point)>,
}

impl LayoutPlan {
    pub fn position_of(&self, id: NodeId) -> Option<Point> {
        self.positions
            .iter()
            .find(|(n, _)| *n == id)
            .map(|(_, p)| *p)
    }

    pub fn level_of(&self, id: NodeId) -> Option<usize> {
        self.levels.iter().position(|level| level.contains(&id))
    }
}

/// Compute a leveled layout for every node in the store.
///
/// Roots are the nodes with no incoming connection. If there are none (the
/// graph is one big cycle) the `start` node seeds the walk, or failing that
/// the first node in store order. Nodes the walk never reaches are appended
/// to the last level rather than dropped.
pub fn compute_layout(
    store: &WorkflowStore,
    config: &LayoutConfig,
    grid: f32,
) -> Result<LayoutPlan, LayoutError> {
    if store.is_empty() {
        return Err(LayoutError::EmptyGraph);
    }

    let mut graph: DiGraph<NodeId, ()> =
        DiGraph::with_capacity(store.node_count(), store.connection_count());
    let mut index: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(store.node_count());
    for node in store.nodes() {
        index.insert(node.id, graph.add_node(node.id));
    }
    for conn in store.connections() {
        if let (Some(&a), Some(&b)) = (index.get(&conn.from), index.get(&conn.to)) {
            graph.add_edge(a, b, ());
        }
    }

    let mut roots: Level = graph
        .node_indices()
        .filter(|&n| {
            graph
                .neighbors_directed(n, Direction::Incoming)
                .next()
                .is_none()
        })
        .map(|n| graph[n])
        .collect();
    if roots.is_empty() {
        let seed = store
            .nodes()
            .find(|n| n.node_type == NodeType::Start)
            .or_else(|| store.nodes().next())
            .map(|n| n.id)
            .ok_or(LayoutError::EmptyGraph)?;
        log::debug!("no root nodes (cyclic graph); seeding layout from {seed}");
        roots.push(seed);
    }

    let mut visited: HashSet<NodeId> = roots.iter().copied().collect();
    let mut levels: Vec<Level> = vec![roots];
    loop {
        let mut next = Level::new();
        for id in levels.last().into_iter().flatten() {
            // petgraph lists neighbours newest edge first; restore connection order.
            let mut successors: SmallVec<[NodeIndex; 4]> = graph
                .neighbors_directed(index[id], Direction::Outgoing)
                .collect();
            successors.reverse();
            for succ in successors {
                let succ_id = graph[succ];
                if visited.insert(succ_id) {
                    next.push(succ_id);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        levels.push(next);
    }

    let unreached: Level = store
        .nodes()
        .map(|n| n.id)
        .filter(|id| !visited.contains(id))
        .collect();
    if !unreached.is_empty() {
        log::debug!(
            "{} node(s) unreachable from roots; appending to last level",
            unreached.len()
        );
        if let Some(last) = levels.last_mut() {
            last.extend(unreached);
        }
    }

    let positions = position_levels(store, &levels, config, grid);
    Ok(LayoutPlan { levels, positions })
}

fn position_levels(
    store: &WorkflowStore,
    levels: &[Level],
    config: &LayoutConfig,
    grid: f32,
) -> Vec<(NodeId, Point)> {
    let column_height = |count: usize| -> f32 {
        if count == 0 {
            0.0
        } else {
            count as f32 * config.node_height + (count - 1) as f32 * config.vertical_gap
        }
    };
    let tallest = levels
        .iter()
        .map(|l| column_height(l.len()))
        .fold(0.0_f32, f32::max);

    let mut placed: HashMap<NodeId, Point> = HashMap::with_capacity(store.node_count());
    for (column, level) in levels.iter().enumerate() {
        let x = config.start_x + column as f32 * (config.node_width + config.horizontal_gap);
        let top = config.start_y + (tallest - column_height(level.len())) / 2.0;
        for (row, id) in level.iter().enumerate() {
            let y = top + row as f32 * (config.node_height + config.vertical_gap);
            placed.insert(*id, snap_point(Point::new(x, y), grid));
        }
    }

    store
        .nodes()
        .filter_map(|n| placed.get(&n.id).map(|p| (n.id, *p)))
        .collect()
}
