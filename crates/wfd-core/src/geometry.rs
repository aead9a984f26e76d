//! Port anchors and connection curves.
//!
//! Pure functions over node positions plus a height cache fed by the
//! rendering surface. The presentation constants in [`NodeMetrics`] are the
//! same ones the renderer draws with, so the computed anchors land on the
//! centre of the drawn port glyphs.

use crate::id::NodeId;
use crate::model::{Connection, Node, Point};
use crate::store::{StoreEvent, WorkflowStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Horizontal control-point offset never drops below this.
pub const MIN_CURVE_OFFSET: f32 = 40.0;
/// ...and never exceeds this.
pub const MAX_CURVE_OFFSET: f32 = 160.0;
/// Fraction of the horizontal span used as control-point offset.
pub const CURVE_TENSION: f32 = 0.5;

// ─── Presentation constants ──────────────────────────────────────────────

/// Node box and port dimensions shared by geometry, hit testing and painting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeMetrics {
    pub border_width: f32,
    pub content_width: f32,
    /// How far a port glyph sticks out past the node border.
    pub port_outer_offset: f32,
    pub port_diameter: f32,
    /// Height assumed until the surface reports a measurement.
    pub default_height: f32,
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self {
            border_width: 2.0,
            content_width: 180.0,
            port_outer_offset: 8.0,
            port_diameter: 12.0,
            default_height: 64.0,
        }
    }
}

impl NodeMetrics {
    /// Full rendered width including both borders.
    pub fn outer_width(&self) -> f32 {
        self.content_width + self.border_width * 2.0
    }
}

// ─── Height cache ────────────────────────────────────────────────────────

/// Rendered node heights, keyed by node id.
///
/// Entries are dropped whenever the node they describe is added, moved,
/// edited or removed, and the whole cache is cleared after a layout pass
/// or a graph replacement.
#[derive(Debug, Clone, Default)]
pub struct HeightCache {
    heights: HashMap<NodeId, f32>,
}

impl HeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a measurement from the surface. Bogus values are ignored.
    pub fn report(&mut self, id: NodeId, height: f32) {
        if height.is_finite() && height > 0.0 {
            self.heights.insert(id, height);
        }
    }

    pub fn get(&self, id: NodeId) -> Option<f32> {
        self.heights.get(&id).copied()
    }

    pub fn invalidate(&mut self, id: NodeId) {
        self.heights.remove(&id);
    }

    pub fn clear(&mut self) {
        self.heights.clear();
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Apply the invalidation rule for one store event.
    pub fn apply_event(&mut self, event: &StoreEvent) {
        match event {
            StoreEvent::NodeAdded(id)
            | StoreEvent::NodeMoved(id)
            | StoreEvent::NodeUpdated(id)
            | StoreEvent::NodeRemoved { id, .. } => self.invalidate(*id),
            StoreEvent::PositionsApplied(_) | StoreEvent::Replaced => self.clear(),
            StoreEvent::ConnectionAdded(_) | StoreEvent::ConnectionRemoved(_) => {}
        }
    }

    /// Cached height, or the metrics' default estimate.
    pub fn rendered_height(&self, id: NodeId, metrics: &NodeMetrics) -> f32 {
        self.get(id).unwrap_or(metrics.default_height)
    }
}

// ─── Anchors ─────────────────────────────────────────────────────────────

/// Centre of the node's output port glyph on its right edge.
pub fn output_anchor(node: &Node, heights: &HeightCache, metrics: &NodeMetrics) -> Point {
    let x = node.position.x + metrics.border_width + metrics.content_width
        + metrics.port_outer_offset
        - metrics.port_diameter / 2.0;
    let y = node.position.y + heights.rendered_height(node.id, metrics) / 2.0;
    Point::new(x, y)
}

/// Centre of the node's input port glyph on its left edge.
pub fn input_anchor(node: &Node, heights: &HeightCache, metrics: &NodeMetrics) -> Point {
    let x = node.position.x + metrics.border_width - metrics.port_outer_offset
        + metrics.port_diameter / 2.0;
    let y = node.position.y + heights.rendered_height(node.id, metrics) / 2.0;
    Point::new(x, y)
}

// ─── Curves ──────────────────────────────────────────────────────────────

/// A cubic bezier from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSpec {
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

impl PathSpec {
    /// SVG path data: `M x y C c1x c1y, c2x c2y, x y`.
    pub fn to_svg_path(&self) -> String {
        let mut d = String::with_capacity(64);
        let _ = write!(
            d,
            "M {} {} C {} {}, {} {}, {} {}",
            fmt_coord(self.start.x),
            fmt_coord(self.start.y),
            fmt_coord(self.c1.x),
            fmt_coord(self.c1.y),
            fmt_coord(self.c2.x),
            fmt_coord(self.c2.y),
            fmt_coord(self.end.x),
            fmt_coord(self.end.y),
        );
        d
    }

    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.c1.is_finite() && self.c2.is_finite() && self.end.is_finite()
    }
}

/// Smooth left-to-right curve between two anchors.
///
/// Control points sit horizontally off each endpoint by a distance that
/// grows with the horizontal span, clamped to
/// [`MIN_CURVE_OFFSET`, `MAX_CURVE_OFFSET`].
pub fn bezier_path(p1: Point, p2: Point) -> PathSpec {
    let span = (p2.x - p1.x).abs();
    let offset = if span.is_finite() {
        (span * CURVE_TENSION).clamp(MIN_CURVE_OFFSET, MAX_CURVE_OFFSET)
    } else {
        MAX_CURVE_OFFSET
    };
    PathSpec {
        start: p1,
        c1: Point::new(p1.x + offset, p1.y),
        c2: Point::new(p2.x - offset, p2.y),
        end: p2,
    }
}

/// Curve for a stored connection, or `None` when an endpoint no longer
/// exists or a position is not finite.
pub fn connection_path(
    store: &WorkflowStore,
    conn: &Connection,
    heights: &HeightCache,
    metrics: &NodeMetrics,
) -> Option<PathSpec> {
    let from = store.get(conn.from)?;
    let to = store.get(conn.to)?;
    let path = bezier_path(
        output_anchor(from, heights, metrics),
        input_anchor(to, heights, metrics),
    );
    path.is_finite().then_some(path)
}

// ─── Grid ────────────────────────────────────────────────────────────────

/// Round `value` to the nearest multiple of `increment`.
///
/// A non-positive or non-finite increment disables snapping.
pub fn snap_to_grid(value: f32, increment: f32) -> f32 {
    if !increment.is_finite() || increment <= 0.0 || !value.is_finite() {
        return value;
    }
    (value / increment).round() * increment
}

pub fn snap_point(p: Point, increment: f32) -> Point {
    Point::new(snap_to_grid(p.x, increment), snap_to_grid(p.y, increment))
}

/// Integers print without a trailing `.0`, everything else with two decimals.
fn fmt_coord(v: f32) -> String {
    if v.fract() == 0.0 && v.abs() < 1e9 {
        format!("{}", v as i64)
    } else {
        format!("{v:.2}")
    }
}
