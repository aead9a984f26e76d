//! Drag controller: the pointer-gesture state machine.
//!
//! Exactly one gesture is active at a time. Every gesture starts from
//! [`DragState::Idle`] on pointer-down and returns there on pointer-up or
//! an explicit cancel. The controller never touches the store itself; like
//! the rest of the editor it translates input into [`DesignerMutation`]s
//! that the engine applies.
//!
//! | Pointer-down on | Gesture | Pointer-move | Pointer-up |
//! |-----------------|---------|--------------|------------|
//! | empty canvas | `PanningCanvas` | offset += cumulative delta | idle |
//! | node body | `DraggingNode` | grid-snapped `move_node` | idle |
//! | output port | `DrawingConnection` | preview + snap lookup | connect if snapped |
//! | connection | none (select only) | | |

use wfd_core::config::DesignerConfig;
use wfd_core::geometry::{
    HeightCache, PathSpec, bezier_path, input_anchor, output_anchor, snap_point,
};
use wfd_core::id::{ConnectionId, NodeId};
use wfd_core::model::{CanvasTransform, Point};
use wfd_core::store::WorkflowStore;
use wfd_render::hit::{HitTarget, find_snap_target, hit_test};

/// What the user has selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Connection(ConnectionId),
}

/// The active gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    PanningCanvas {
        /// Screen position of the pointer-down.
        origin: Point,
        /// Transform offset at pointer-down.
        start_offset: Point,
    },
    DraggingNode {
        id: NodeId,
        /// Canvas-space distance from the node's top-left to the pointer.
        grab: Point,
    },
    DrawingConnection {
        source: NodeId,
        /// Canvas-space pointer position (the preview's free end).
        cursor: Point,
        /// Input port the preview is locked onto.
        snap: Option<NodeId>,
    },
}

impl DragState {
    pub fn name(&self) -> &'static str {
        match self {
            DragState::Idle => "idle",
            DragState::PanningCanvas { .. } => "panning",
            DragState::DraggingNode { .. } => "dragging-node",
            DragState::DrawingConnection { .. } => "drawing-connection",
        }
    }
}

/// A change requested by a gesture, applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DesignerMutation {
    /// Set the canvas pan offset (screen units).
    SetOffset { x: f32, y: f32 },
    /// Final, grid-snapped node position.
    MoveNode { id: NodeId, position: Point },
    AddConnection { from: NodeId, to: NodeId },
    Select(Selection),
}

/// Read-only view of the designer a gesture step needs.
#[derive(Debug, Clone, Copy)]
pub struct GestureContext<'a> {
    pub store: &'a WorkflowStore,
    pub heights: &'a HeightCache,
    pub config: &'a DesignerConfig,
    pub transform: &'a CanvasTransform,
}

impl GestureContext<'_> {
    fn to_canvas(&self, screen: Point) -> Point {
        self.transform.screen_to_canvas(screen)
    }
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    /// Start a gesture based on what lies under the pointer.
    pub fn pointer_down(&mut self, ctx: &GestureContext<'_>, screen: Point) -> Vec<DesignerMutation> {
        if !self.is_idle() {
            // A lost pointer-up; gestures never nest.
            log::warn!("pointer-down while {}; resetting to idle", self.state.name());
            self.cancel();
        }
        if !screen.is_finite() {
            return vec![];
        }
        let canvas = ctx.to_canvas(screen);
        match hit_test(ctx.store, ctx.heights, ctx.config, canvas) {
            Some(HitTarget::OutputPort(source)) => {
                log::debug!("start connection from {source}");
                self.state = DragState::DrawingConnection {
                    source,
                    cursor: canvas,
                    snap: None,
                };
                vec![DesignerMutation::Select(Selection::Node(source))]
            }
            Some(HitTarget::NodeBody(id) | HitTarget::InputPort(id)) => {
                let Some(node) = ctx.store.get(id) else {
                    return vec![];
                };
                let grab = Point::new(canvas.x - node.position.x, canvas.y - node.position.y);
                log::debug!("start dragging {id}");
                self.state = DragState::DraggingNode { id, grab };
                vec![DesignerMutation::Select(Selection::Node(id))]
            }
            Some(HitTarget::Connection(id)) => {
                vec![DesignerMutation::Select(Selection::Connection(id))]
            }
            None => {
                self.state = DragState::PanningCanvas {
                    origin: screen,
                    start_offset: Point::new(ctx.transform.offset_x, ctx.transform.offset_y),
                };
                vec![DesignerMutation::Select(Selection::None)]
            }
        }
    }

    pub fn pointer_move(&mut self, ctx: &GestureContext<'_>, screen: Point) -> Vec<DesignerMutation> {
        if !screen.is_finite() {
            return vec![];
        }
        match &mut self.state {
            DragState::Idle => vec![],
            DragState::PanningCanvas {
                origin,
                start_offset,
            } => vec![DesignerMutation::SetOffset {
                x: start_offset.x + (screen.x - origin.x),
                y: start_offset.y + (screen.y - origin.y),
            }],
            DragState::DraggingNode { id, grab } => {
                let Some(node) = ctx.store.get(*id) else {
                    return vec![];
                };
                let canvas = ctx.to_canvas(screen);
                let position = snap_point(
                    Point::new(canvas.x - grab.x, canvas.y - grab.y),
                    ctx.config.grid_size,
                );
                if position == node.position {
                    return vec![];
                }
                vec![DesignerMutation::MoveNode { id: *id, position }]
            }
            DragState::DrawingConnection {
                source,
                cursor,
                snap,
            } => {
                *cursor = ctx.to_canvas(screen);
                *snap = find_snap_target(
                    ctx.store,
                    ctx.heights,
                    &ctx.config.metrics,
                    *cursor,
                    *source,
                    ctx.config.snap_radius,
                );
                log::trace!("connection preview at {cursor:?}, snap {snap:?}");
                vec![]
            }
        }
    }

    /// Finish the gesture. Releasing a connection over empty space is
    /// silently abandoned.
    pub fn pointer_up(&mut self, ctx: &GestureContext<'_>, screen: Point) -> Vec<DesignerMutation> {
        let mut out = self.pointer_move(ctx, screen);
        let finished = std::mem::take(&mut self.state);
        if let DragState::DrawingConnection {
            source,
            snap: Some(target),
            ..
        } = finished
        {
            out.push(DesignerMutation::AddConnection {
                from: source,
                to: target,
            });
        } else if let DragState::DrawingConnection { source, .. } = finished {
            log::debug!("connection from {source} released over nothing");
        }
        out
    }

    /// Force-reset to idle. A connection in progress is discarded; moves
    /// already written by a node drag stay where they are.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            log::debug!("cancelled {}", self.state.name());
        }
        self.state = DragState::Idle;
    }

    /// Curve from the source's output port to the snapped input port, or to
    /// the pointer when nothing is in range.
    pub fn preview_path(&self, ctx: &GestureContext<'_>) -> Option<PathSpec> {
        let DragState::DrawingConnection {
            source,
            cursor,
            snap,
        } = self.state
        else {
            return None;
        };
        let metrics = &ctx.config.metrics;
        let from = output_anchor(ctx.store.get(source)?, ctx.heights, metrics);
        let to = snap
            .and_then(|id| ctx.store.get(id))
            .map(|node| input_anchor(node, ctx.heights, metrics))
            .unwrap_or(cursor);
        Some(bezier_path(from, to)).filter(PathSpec::is_finite)
    }

    pub fn snap_target(&self) -> Option<NodeId> {
        match self.state {
            DragState::DrawingConnection { snap, .. } => snap,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfd_core::geometry::NodeMetrics;
    use wfd_core::model::{NodeType, Properties};

    struct Fixture {
        store: WorkflowStore,
        heights: HeightCache,
        config: DesignerConfig,
        transform: CanvasTransform,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: WorkflowStore::new(),
                heights: HeightCache::new(),
                config: DesignerConfig::default(),
                transform: CanvasTransform::default(),
            }
        }

        fn ctx(&self) -> GestureContext<'_> {
            GestureContext {
                store: &self.store,
                heights: &self.heights,
                config: &self.config,
                transform: &self.transform,
            }
        }

        fn add(&mut self, t: NodeType, x: f32, y: f32) -> NodeId {
            self.store
                .add_node(t, Point::new(x, y), Properties::new())
                .unwrap()
                .id
        }
    }

    #[test]
    fn empty_canvas_pans_by_cumulative_delta() {
        let mut fx = Fixture::new();
        fx.transform.offset_x = 10.0;
        let mut drag = DragController::new();

        let out = drag.pointer_down(&fx.ctx(), Point::new(500.0, 500.0));
        assert_eq!(out, vec![DesignerMutation::Select(Selection::None)]);
        assert_eq!(drag.state().name(), "panning");

        drag.pointer_move(&fx.ctx(), Point::new(510.0, 505.0));
        let out = drag.pointer_move(&fx.ctx(), Point::new(530.0, 490.0));
        assert_eq!(out, vec![DesignerMutation::SetOffset { x: 40.0, y: -10.0 }]);

        drag.pointer_up(&fx.ctx(), Point::new(530.0, 490.0));
        assert!(drag.is_idle());
    }

    #[test]
    fn node_drag_snaps_to_grid() {
        let mut fx = Fixture::new();
        let a = fx.add(NodeType::Script, 40.0, 40.0);
        let mut drag = DragController::new();

        // Grab 10 units inside the top-left corner.
        let out = drag.pointer_down(&fx.ctx(), Point::new(50.0, 50.0));
        assert_eq!(out, vec![DesignerMutation::Select(Selection::Node(a))]);

        let out = drag.pointer_move(&fx.ctx(), Point::new(133.0, 87.0));
        assert_eq!(
            out,
            vec![DesignerMutation::MoveNode {
                id: a,
                position: Point::new(120.0, 80.0)
            }]
        );
    }

    #[test]
    fn node_drag_accounts_for_zoom() {
        let mut fx = Fixture::new();
        let a = fx.add(NodeType::Script, 40.0, 40.0);
        fx.transform.scale = 2.0;
        fx.transform.offset_x = 100.0;
        let mut drag = DragController::new();

        // Canvas (50, 50) is screen (200, 100).
        drag.pointer_down(&fx.ctx(), Point::new(200.0, 100.0));
        // Screen +80 at 2x is canvas +40.
        let out = drag.pointer_move(&fx.ctx(), Point::new(280.0, 100.0));
        assert_eq!(
            out,
            vec![DesignerMutation::MoveNode {
                id: a,
                position: Point::new(80.0, 40.0)
            }]
        );
    }

    #[test]
    fn connection_snaps_and_commits_on_release() {
        let mut fx = Fixture::new();
        let s = fx.add(NodeType::Start, 0.0, 0.0);
        let e = fx.add(NodeType::End, 300.0, 0.0);
        let metrics = NodeMetrics::default();
        let out_port = output_anchor(fx.store.get(s).unwrap(), &fx.heights, &metrics);
        let in_port = input_anchor(fx.store.get(e).unwrap(), &fx.heights, &metrics);
        let mut drag = DragController::new();

        drag.pointer_down(&fx.ctx(), out_port);
        assert_eq!(drag.state().name(), "drawing-connection");

        let near = Point::new(in_port.x - 12.0, in_port.y + 9.0);
        drag.pointer_move(&fx.ctx(), near);
        assert_eq!(drag.snap_target(), Some(e));
        let preview = drag.preview_path(&fx.ctx()).unwrap();
        assert_eq!(preview.end, in_port);

        let out = drag.pointer_up(&fx.ctx(), near);
        assert_eq!(out, vec![DesignerMutation::AddConnection { from: s, to: e }]);
        assert!(drag.is_idle());
        assert!(drag.preview_path(&fx.ctx()).is_none());
    }

    #[test]
    fn connection_released_far_away_is_abandoned() {
        let mut fx = Fixture::new();
        let s = fx.add(NodeType::Start, 0.0, 0.0);
        fx.add(NodeType::End, 300.0, 0.0);
        let out_port = output_anchor(
            fx.store.get(s).unwrap(),
            &fx.heights,
            &NodeMetrics::default(),
        );
        let mut drag = DragController::new();

        drag.pointer_down(&fx.ctx(), out_port);
        let far = Point::new(out_port.x + 500.0, out_port.y + 500.0);
        drag.pointer_move(&fx.ctx(), far);
        assert_eq!(drag.preview_path(&fx.ctx()).unwrap().end, far);

        assert!(drag.pointer_up(&fx.ctx(), far).is_empty());
        assert!(drag.is_idle());
    }

    #[test]
    fn cancel_discards_connection_preview() {
        let mut fx = Fixture::new();
        let s = fx.add(NodeType::Start, 0.0, 0.0);
        let out_port = output_anchor(
            fx.store.get(s).unwrap(),
            &fx.heights,
            &NodeMetrics::default(),
        );
        let mut drag = DragController::new();
        drag.pointer_down(&fx.ctx(), out_port);
        drag.cancel();
        assert!(drag.is_idle());
        assert!(drag.pointer_up(&fx.ctx(), out_port).is_empty());
    }

    #[test]
    fn clicking_a_connection_selects_it_without_a_gesture() {
        let mut fx = Fixture::new();
        let s = fx.add(NodeType::Start, 0.0, 0.0);
        let e = fx.add(NodeType::End, 400.0, 0.0);
        let conn = fx.store.add_connection(s, e).unwrap();
        let mut drag = DragController::new();

        // Start output (184, 32) to end input (400, 32): a straight line.
        let out = drag.pointer_down(&fx.ctx(), Point::new(290.0, 33.0));
        assert_eq!(out, vec![DesignerMutation::Select(Selection::Connection(conn.id))]);
        assert!(drag.is_idle());
    }

    #[test]
    fn drag_of_deleted_node_is_a_no_op() {
        let mut fx = Fixture::new();
        let a = fx.add(NodeType::Delay, 0.0, 0.0);
        let mut drag = DragController::new();
        drag.pointer_down(&fx.ctx(), Point::new(20.0, 20.0));
        fx.store.remove_node(a);
        assert!(drag.pointer_move(&fx.ctx(), Point::new(200.0, 200.0)).is_empty());
        drag.pointer_up(&fx.ctx(), Point::new(200.0, 200.0));
        assert!(drag.is_idle());
    }
}
