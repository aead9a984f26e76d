//! Core data model for workflow graphs.
//!
//! A workflow is a directed graph: nodes are typed, positioned steps and
//! connections run from one node's single output port to another node's
//! single input port. Positions are logical canvas units, independent of
//! the pan/zoom transform.

use crate::id::{ConnectionId, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Free-form per-node properties. Schema depends on the node type and is
/// owned by the property editor, not the store.
pub type Properties = serde_json::Map<String, serde_json::Value>;

// ─── Points ──────────────────────────────────────────────────────────────

/// A point in logical canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The kinds of step a workflow can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Entry point. Has an output port only.
    Start,
    /// Terminal step. Has an input port only.
    End,
    /// Branches on a predicate.
    Condition,
    /// Calls an external HTTP endpoint.
    ApiCall,
    /// Runs a user script.
    Script,
    /// Waits for a fixed duration.
    Delay,
    /// Sends a message to a channel.
    Notification,
}

impl NodeType {
    pub const ALL: [NodeType; 7] = [
        NodeType::Start,
        NodeType::End,
        NodeType::Condition,
        NodeType::ApiCall,
        NodeType::Script,
        NodeType::Delay,
        NodeType::Notification,
    ];

    /// Wire name (`"api_call"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::End => "end",
            NodeType::Condition => "condition",
            NodeType::ApiCall => "api_call",
            NodeType::Script => "script",
            NodeType::Delay => "delay",
            NodeType::Notification => "notification",
        }
    }

    /// Name given to a node dropped from the palette.
    pub fn display_name(self) -> &'static str {
        match self {
            NodeType::Start => "Start",
            NodeType::End => "End",
            NodeType::Condition => "Condition",
            NodeType::ApiCall => "API Call",
            NodeType::Script => "Script",
            NodeType::Delay => "Delay",
            NodeType::Notification => "Notification",
        }
    }

    pub fn has_input(self) -> bool {
        self != NodeType::Start
    }

    pub fn has_output(self) -> bool {
        self != NodeType::End
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

// ─── Nodes & connections ─────────────────────────────────────────────────

/// A typed, positioned step in the workflow graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub name: String,
    pub description: String,
    /// Top-left corner in logical canvas units.
    pub position: Point,
    pub properties: Properties,
}

impl Node {
    pub fn new(id: NodeId, node_type: NodeType, position: Point) -> Self {
        Self {
            id,
            node_type,
            name: node_type.display_name().to_string(),
            description: String::new(),
            position,
            properties: Properties::new(),
        }
    }
}

/// A directed edge from `from`'s output port to `to`'s input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: NodeId,
    pub to: NodeId,
}

// ─── Canvas transform ────────────────────────────────────────────────────

/// Smallest zoom factor the canvas accepts.
pub const MIN_SCALE: f32 = 0.25;
/// Largest zoom factor the canvas accepts.
pub const MAX_SCALE: f32 = 4.0;

/// Pan/zoom applied uniformly at render time.
///
/// `screen = canvas * scale + offset`. Node positions are always stored in
/// canvas space so they stay put across zoom changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasTransform {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
        }
    }
}

impl CanvasTransform {
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        let scale = self.effective_scale();
        Point::new(
            (screen.x - self.offset_x) / scale,
            (screen.y - self.offset_y) / scale,
        )
    }

    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        let scale = self.effective_scale();
        Point::new(
            canvas.x * scale + self.offset_x,
            canvas.y * scale + self.offset_y,
        )
    }

    /// Shift the canvas by a screen-space delta.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        if dx.is_finite() && dy.is_finite() {
            self.offset_x += dx;
            self.offset_y += dy;
        }
    }

    /// Multiply the zoom by `factor`, keeping the canvas point under
    /// `anchor` (screen space) fixed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 || !anchor.is_finite() {
            return;
        }
        let before = self.screen_to_canvas(anchor);
        self.scale = (self.effective_scale() * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.offset_x = anchor.x - before.x * self.scale;
        self.offset_y = anchor.y - before.y * self.scale;
    }

    /// Scale actually applied when mapping between spaces: clamped to
    /// `MIN_SCALE..=MAX_SCALE`, and 1.0 for zero/NaN from a hand-edited
    /// transform. Renderers must use this rather than `scale`.
    pub fn effective_scale(&self) -> f32 {
        if self.scale.is_finite() && self.scale > 0.0 {
            self.scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        }
    }
}
