//! Hit testing: canvas point → port, node, or connection.
//!
//! Nodes are checked top-most first (reverse store order, since the last
//! node painted is on top), and within a node the port glyphs win over the
//! body they overlap. Connections sit underneath every node.

use kurbo::{CubicBez, ParamCurveNearest};
use wfd_core::config::DesignerConfig;
use wfd_core::geometry::{
    HeightCache, NodeMetrics, PathSpec, connection_path, input_anchor, output_anchor,
};
use wfd_core::id::{ConnectionId, NodeId};
use wfd_core::model::{Node, Point};
use wfd_core::store::WorkflowStore;

/// Distances closer than this count as a tie.
const TIE_EPSILON: f32 = 1e-3;

/// Accuracy passed to kurbo's nearest-point solver.
const CURVE_ACCURACY: f64 = 1e-3;

/// What lies under a canvas point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    OutputPort(NodeId),
    InputPort(NodeId),
    NodeBody(NodeId),
    Connection(ConnectionId),
}

impl HitTarget {
    /// The node this hit belongs to, if it is not a connection.
    pub fn node(&self) -> Option<NodeId> {
        match *self {
            HitTarget::OutputPort(id) | HitTarget::InputPort(id) | HitTarget::NodeBody(id) => {
                Some(id)
            }
            HitTarget::Connection(_) => None,
        }
    }
}

/// Find the top-most thing under `point` (canvas space).
/// Returns `None` for empty canvas.
pub fn hit_test(
    store: &WorkflowStore,
    heights: &HeightCache,
    config: &DesignerConfig,
    point: Point,
) -> Option<HitTarget> {
    if !point.is_finite() {
        return None;
    }
    let metrics = &config.metrics;
    let port_radius = metrics.port_diameter / 2.0 + config.port_hit_slop;

    for node in store.nodes().rev() {
        if node.node_type.has_output()
            && output_anchor(node, heights, metrics).distance(point) <= port_radius
        {
            return Some(HitTarget::OutputPort(node.id));
        }
        if node.node_type.has_input()
            && input_anchor(node, heights, metrics).distance(point) <= port_radius
        {
            return Some(HitTarget::InputPort(node.id));
        }
        if body_contains(node, heights, metrics, point) {
            return Some(HitTarget::NodeBody(node.id));
        }
    }

    hit_test_connection(store, heights, metrics, point, config.connection_hit_tolerance)
        .map(HitTarget::Connection)
}

/// The connection whose curve passes within `tolerance` of `point`.
/// The closest wins; later connections win exact ties since they paint on top.
pub fn hit_test_connection(
    store: &WorkflowStore,
    heights: &HeightCache,
    metrics: &NodeMetrics,
    point: Point,
    tolerance: f32,
) -> Option<ConnectionId> {
    let target = kurbo::Point::new(point.x as f64, point.y as f64);
    let limit = (tolerance as f64) * (tolerance as f64);

    let mut best: Option<(ConnectionId, f64)> = None;
    for conn in store.connections() {
        let Some(path) = connection_path(store, conn, heights, metrics) else {
            continue;
        };
        let nearest = to_cubic(&path).nearest(target, CURVE_ACCURACY);
        if nearest.distance_sq <= limit
            && best.is_none_or(|(_, d)| nearest.distance_sq <= d)
        {
            best = Some((conn.id, nearest.distance_sq));
        }
    }
    best.map(|(id, _)| id)
}

/// Input port to lock a dragged connection onto.
///
/// Returns the node whose input anchor is nearest to `point` and within
/// `radius`, skipping `exclude` (the connection's source) and nodes without
/// an input port. Equidistant candidates resolve to the first in store order.
/// Pure: safe to call on every pointer move.
pub fn find_snap_target(
    store: &WorkflowStore,
    heights: &HeightCache,
    metrics: &NodeMetrics,
    point: Point,
    exclude: NodeId,
    radius: f32,
) -> Option<NodeId> {
    if !point.is_finite() || !radius.is_finite() || radius < 0.0 {
        return None;
    }
    let mut best: Option<(NodeId, f32)> = None;
    for node in store.nodes() {
        if node.id == exclude || !node.node_type.has_input() {
            continue;
        }
        let distance = input_anchor(node, heights, metrics).distance(point);
        if !distance.is_finite() || distance > radius {
            continue;
        }
        match best {
            Some((_, d)) if distance >= d - TIE_EPSILON => {}
            _ => best = Some((node.id, distance)),
        }
    }
    best.map(|(id, _)| id)
}

fn body_contains(node: &Node, heights: &HeightCache, metrics: &NodeMetrics, point: Point) -> bool {
    let Point { x, y } = node.position;
    let w = metrics.outer_width();
    let h = heights.rendered_height(node.id, metrics);
    point.x >= x && point.x <= x + w && point.y >= y && point.y <= y + h
}

pub(crate) fn to_cubic(path: &PathSpec) -> CubicBez {
    let p = |pt: Point| kurbo::Point::new(pt.x as f64, pt.y as f64);
    CubicBez::new(p(path.start), p(path.c1), p(path.c2), p(path.end))
}
