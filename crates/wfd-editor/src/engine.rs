//! Designer engine: the one object a rendering surface talks to.
//!
//! Owns the store, the height cache, the pan/zoom transform, the selection,
//! the drag controller and the undo history, and keeps them consistent:
//!
//! - **Input** goes through [`DesignerEngine::handle_event`], the dispatch
//!   boundary. On targets that unwind, a panic inside a handler is caught
//!   there, the gesture is reset to idle, and the caller gets
//!   [`DesignerError::Internal`] instead of a dead session.
//! - **Store events** are drained after every operation and fed to the
//!   height cache, so every mutation site invalidates exactly the heights
//!   it made stale.
//! - **Persistence** is a two-phase handshake: `begin_*` freezes the store
//!   while the host's request is in flight, `finish_*` thaws it.

use crate::commands::{CommandStack, Snapshot};
use crate::drag::{DesignerMutation, DragController, DragState, GestureContext, Selection};
use crate::error::DesignerError;
use crate::input::InputEvent;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use wfd_core::config::DesignerConfig;
use wfd_core::document::WorkflowDocument;
use wfd_core::geometry::{HeightCache, PathSpec, connection_path, snap_point};
use wfd_core::id::{ConnectionId, NodeId};
use wfd_core::layout::compute_layout;
use wfd_core::model::{CanvasTransform, NodeType, Point, Properties};
use wfd_core::store::{NodeUpdate, StoreEvent, SubscriptionId, WorkflowStore};
use wfd_render::paint::FrameView;

/// Which persistence request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingIo {
    Save,
    Load,
}

/// What the surface should do after an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub redraw: bool,
    /// The shortcut a key event resolved to, if any.
    pub action: Option<ShortcutAction>,
}

impl EventOutcome {
    const NONE: EventOutcome = EventOutcome {
        redraw: false,
        action: None,
    };
    const REDRAW: EventOutcome = EventOutcome {
        redraw: true,
        action: None,
    };
}

#[derive(Debug)]
pub struct DesignerEngine {
    name: String,
    store: WorkflowStore,
    heights: HeightCache,
    transform: CanvasTransform,
    config: DesignerConfig,
    selection: Selection,
    drag: DragController,
    history: CommandStack,
    /// Surface size in screen pixels; keyboard zoom anchors on its centre.
    viewport: Point,
    pending: Option<PendingIo>,
}

impl Default for DesignerEngine {
    fn default() -> Self {
        Self::new(DesignerConfig::default())
    }
}

impl DesignerEngine {
    pub fn new(config: DesignerConfig) -> Self {
        Self {
            name: String::new(),
            store: WorkflowStore::new(),
            heights: HeightCache::new(),
            transform: CanvasTransform::default(),
            config,
            selection: Selection::None,
            drag: DragController::new(),
            history: CommandStack::new(config.undo_depth),
            viewport: Point::ORIGIN,
            pending: None,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn store(&self) -> &WorkflowStore {
        &self.store
    }

    pub fn heights(&self) -> &HeightCache {
        &self.heights
    }

    pub fn transform(&self) -> &CanvasTransform {
        &self.transform
    }

    pub fn config(&self) -> &DesignerConfig {
        &self.config
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn pending_io(&self) -> Option<PendingIo> {
        self.pending
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Observe every applied store mutation.
    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        self.store.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    // ─── Dispatch boundary ───────────────────────────────────────────────

    /// Handle one input event.
    ///
    /// A panic in a handler becomes [`DesignerError::Internal`] and the
    /// active gesture is reset. This needs an unwinding panic strategy:
    /// on `wasm32-unknown-unknown` panics abort and nothing is caught.
    pub fn handle_event(&mut self, event: &InputEvent) -> Result<EventOutcome, DesignerError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(event))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("panic while handling {}: {message}", event.name());
                self.recover();
                Err(DesignerError::Internal {
                    event: event.name(),
                    message,
                })
            }
        }
    }

    fn dispatch(&mut self, event: &InputEvent) -> Result<EventOutcome, DesignerError> {
        match event {
            InputEvent::PointerDown { x, y, .. } => self.pointer_down(Point::new(*x, *y)),
            InputEvent::PointerMove { x, y, .. } => Ok(self.pointer_move(Point::new(*x, *y))),
            InputEvent::PointerUp { x, y, .. } => self.pointer_up(Point::new(*x, *y)),
            InputEvent::PointerLeave => {
                let was_active = !self.drag.is_idle();
                self.cancel_gesture();
                Ok(EventOutcome {
                    redraw: was_active,
                    action: None,
                })
            }
            InputEvent::Wheel { x, y, delta_y } => {
                if !delta_y.is_finite() || *delta_y == 0.0 {
                    return Ok(EventOutcome::NONE);
                }
                let factor = if *delta_y < 0.0 {
                    self.config.zoom_step
                } else {
                    1.0 / self.config.zoom_step
                };
                self.transform.zoom_at(Point::new(*x, *y), factor);
                Ok(EventOutcome::REDRAW)
            }
            InputEvent::Key { key, modifiers } => match ShortcutMap::resolve(key, modifiers) {
                Some(action) => {
                    self.perform(action)?;
                    Ok(EventOutcome {
                        redraw: true,
                        action: Some(action),
                    })
                }
                None => Ok(EventOutcome::NONE),
            },
        }
    }

    /// Reset after a caught panic.
    fn recover(&mut self) {
        self.drag.cancel();
        if let Err(err) = self.history.end_batch(&self.store) {
            log::warn!("dropping gesture undo step after panic: {err}");
        }
        self.validate_selection();
        self.sync_heights();
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    fn pointer_down(&mut self, screen: Point) -> Result<EventOutcome, DesignerError> {
        if self.store.is_frozen() {
            log::warn!("ignoring pointer-down while {:?} is pending", self.pending);
            return Ok(EventOutcome::NONE);
        }
        if !self.drag.is_idle() {
            self.cancel_gesture();
        }
        let ctx = GestureContext {
            store: &self.store,
            heights: &self.heights,
            config: &self.config,
            transform: &self.transform,
        };
        let mutations = self.drag.pointer_down(&ctx, screen);

        let description = match self.drag.state() {
            DragState::DraggingNode { .. } => Some("move node"),
            DragState::DrawingConnection { .. } => Some("connect nodes"),
            DragState::Idle | DragState::PanningCanvas { .. } => None,
        };
        if let Some(description) = description
            && let Err(err) = self.history.begin_batch(&self.store, description)
        {
            self.drag.cancel();
            return Err(err);
        }

        self.apply(mutations);
        Ok(EventOutcome::REDRAW)
    }

    fn pointer_move(&mut self, screen: Point) -> EventOutcome {
        if self.drag.is_idle() {
            return EventOutcome::NONE;
        }
        let ctx = GestureContext {
            store: &self.store,
            heights: &self.heights,
            config: &self.config,
            transform: &self.transform,
        };
        let mutations = self.drag.pointer_move(&ctx, screen);
        self.apply(mutations);
        EventOutcome::REDRAW
    }

    fn pointer_up(&mut self, screen: Point) -> Result<EventOutcome, DesignerError> {
        if self.drag.is_idle() {
            return Ok(EventOutcome::NONE);
        }
        let ctx = GestureContext {
            store: &self.store,
            heights: &self.heights,
            config: &self.config,
            transform: &self.transform,
        };
        let mutations = self.drag.pointer_up(&ctx, screen);
        self.apply(mutations);
        self.history.end_batch(&self.store)?;
        Ok(EventOutcome::REDRAW)
    }

    /// Force the gesture back to idle. A connection in progress is dropped;
    /// a node drag keeps every move it already committed, and those moves
    /// still form one undo step.
    pub fn cancel_gesture(&mut self) {
        self.drag.cancel();
        if let Err(err) = self.history.end_batch(&self.store) {
            log::warn!("could not record cancelled gesture: {err}");
        }
    }

    fn apply(&mut self, mutations: Vec<DesignerMutation>) {
        for mutation in mutations {
            match mutation {
                DesignerMutation::SetOffset { x, y } => {
                    self.transform.offset_x = x;
                    self.transform.offset_y = y;
                }
                DesignerMutation::MoveNode { id, position } => {
                    self.store.move_node(id, position);
                }
                DesignerMutation::AddConnection { from, to } => {
                    if self.store.add_connection(from, to).is_none() {
                        log::debug!("connection {from} -> {to} rejected by store");
                    }
                }
                DesignerMutation::Select(selection) => self.selection = selection,
            }
        }
        self.sync_heights();
    }

    // ─── Discrete actions ────────────────────────────────────────────────

    /// Run a shortcut or toolbar action.
    pub fn perform(&mut self, action: ShortcutAction) -> Result<(), DesignerError> {
        log::debug!("action {}", action.as_str());
        match action {
            ShortcutAction::Undo => self.undo().map(drop),
            ShortcutAction::Redo => self.redo().map(drop),
            ShortcutAction::Delete => self.delete_selected().map(drop),
            ShortcutAction::Cancel => {
                self.cancel_gesture();
                self.selection = Selection::None;
                Ok(())
            }
            ShortcutAction::AutoLayout => self.auto_layout().map(drop),
            ShortcutAction::ZoomIn => {
                self.zoom_by(self.config.zoom_step);
                Ok(())
            }
            ShortcutAction::ZoomOut => {
                self.zoom_by(1.0 / self.config.zoom_step);
                Ok(())
            }
            ShortcutAction::ZoomReset => {
                self.zoom_by(1.0 / self.transform.effective_scale());
                Ok(())
            }
        }
    }

    /// Palette drop: create a node of `node_type` with its top-left at the
    /// drop point, snapped to the grid. The new node is selected.
    pub fn create_node(&mut self, node_type: NodeType, screen: Point) -> Result<NodeId, DesignerError> {
        self.ensure_writable()?;
        let position = snap_point(self.transform.screen_to_canvas(screen), self.config.grid_size);
        let position = if position.is_finite() {
            position
        } else {
            Point::ORIGIN
        };
        let node = self
            .record("add node", |s| {
                s.store.add_node(node_type, position, Properties::new())
            })?
            .ok_or(DesignerError::StoreFrozen)?;
        self.selection = Selection::Node(node.id);
        Ok(node.id)
    }

    /// Connect two nodes outside of a pointer gesture.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<Option<ConnectionId>, DesignerError> {
        self.ensure_writable()?;
        let conn = self.record("connect nodes", |s| s.store.add_connection(from, to))?;
        Ok(conn.map(|c| c.id))
    }

    /// Property editor commit.
    pub fn update_node(&mut self, id: NodeId, update: NodeUpdate) -> Result<bool, DesignerError> {
        self.ensure_writable()?;
        self.record("edit node", |s| s.store.update_node(id, update))
    }

    /// Delete the selected node (with its connections) or connection.
    /// Returns `false` when nothing was selected or it was already gone.
    pub fn delete_selected(&mut self) -> Result<bool, DesignerError> {
        self.ensure_writable()?;
        let removed = match self.selection {
            Selection::None => return Ok(false),
            Selection::Node(id) => {
                self.record("delete node", |s| s.store.remove_node(id).is_some())?
            }
            Selection::Connection(id) => {
                self.record("delete connection", |s| s.store.remove_connection(id))?
            }
        };
        self.selection = Selection::None;
        Ok(removed)
    }

    /// Lay the whole graph out left to right in one undoable batch write.
    /// Returns the number of nodes placed.
    pub fn auto_layout(&mut self) -> Result<usize, DesignerError> {
        self.ensure_writable()?;
        let plan = compute_layout(&self.store, &self.config.layout, self.config.grid_size)?;
        let moved = self.record("auto layout", |s| s.store.apply_positions(&plan.positions))?;
        log::debug!("auto layout placed {moved} node(s) in {} level(s)", plan.levels.len());
        Ok(moved)
    }

    /// Returns the description of the undone step.
    pub fn undo(&mut self) -> Result<Option<String>, DesignerError> {
        self.ensure_writable()?;
        self.cancel_gesture();
        let undone = self.history.undo(&mut self.store);
        self.after_history_change();
        undone
    }

    pub fn redo(&mut self) -> Result<Option<String>, DesignerError> {
        self.ensure_writable()?;
        self.cancel_gesture();
        let redone = self.history.redo(&mut self.store);
        self.after_history_change();
        redone
    }

    fn after_history_change(&mut self) {
        self.validate_selection();
        self.sync_heights();
    }

    /// Run `f` as one undo step.
    fn record<T>(
        &mut self,
        description: &str,
        f: impl FnOnce(&mut Self) -> T,
    ) -> Result<T, DesignerError> {
        self.cancel_gesture();
        let before = Snapshot::capture(&self.store)?;
        let out = f(self);
        self.sync_heights();
        let after = Snapshot::capture(&self.store)?;
        self.history.push(before, after, description.to_string());
        Ok(out)
    }

    fn ensure_writable(&self) -> Result<(), DesignerError> {
        if self.store.is_frozen() {
            log::warn!("rejecting edit while {:?} is pending", self.pending);
            return Err(DesignerError::StoreFrozen);
        }
        Ok(())
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        if width.is_finite() && height.is_finite() {
            self.viewport = Point::new(width.max(0.0), height.max(0.0));
        }
    }

    /// Zoom around the centre of the viewport.
    pub fn zoom_by(&mut self, factor: f32) {
        let centre = Point::new(self.viewport.x / 2.0, self.viewport.y / 2.0);
        self.transform.zoom_at(centre, factor);
    }

    /// Rendering surface measurement. Unknown ids are ignored.
    pub fn report_height(&mut self, id: NodeId, height: f32) -> bool {
        if !self.store.contains(id) {
            return false;
        }
        self.heights.report(id, height);
        true
    }

    /// Curve for the connection being drawn, if any.
    pub fn preview_path(&self) -> Option<PathSpec> {
        self.drag.preview_path(&GestureContext {
            store: &self.store,
            heights: &self.heights,
            config: &self.config,
            transform: &self.transform,
        })
    }

    pub fn snap_target(&self) -> Option<NodeId> {
        self.drag.snap_target()
    }

    /// Every drawable connection curve, in store order.
    pub fn connection_paths(&self) -> Vec<(ConnectionId, PathSpec)> {
        self.store
            .connections()
            .filter_map(|conn| {
                connection_path(&self.store, conn, &self.heights, &self.config.metrics)
                    .map(|path| (conn.id, path))
            })
            .collect()
    }

    /// Snapshot of everything the Vello painter needs.
    pub fn frame_view(&self) -> FrameView<'_> {
        let (selected_node, selected_connection) = match self.selection {
            Selection::None => (None, None),
            Selection::Node(id) => (Some(id), None),
            Selection::Connection(id) => (None, Some(id)),
        };
        FrameView {
            store: &self.store,
            heights: &self.heights,
            metrics: &self.config.metrics,
            transform: self.transform,
            selected_node,
            selected_connection,
            preview: self.preview_path(),
            snap_target: self.snap_target(),
        }
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Freeze the store and hand back the document to persist.
    pub fn begin_save(&mut self) -> Result<WorkflowDocument, DesignerError> {
        self.begin_io(PendingIo::Save)?;
        Ok(WorkflowDocument::from_store(&self.name, &self.store))
    }

    /// The host's save request completed (successfully or not).
    pub fn finish_save(&mut self) {
        self.end_io(PendingIo::Save);
    }

    /// Freeze the store until [`finish_load`](Self::finish_load).
    pub fn begin_load(&mut self) -> Result<(), DesignerError> {
        self.begin_io(PendingIo::Load)
    }

    /// Apply the host's load response and thaw.
    ///
    /// The document replaces the whole graph or nothing: on error the
    /// previous workflow, selection and history are untouched.
    pub fn finish_load(&mut self, json: &str) -> Result<(), DesignerError> {
        if self.pending == Some(PendingIo::Save) {
            return Err(DesignerError::StoreFrozen);
        }
        let parsed = WorkflowDocument::from_json(json)
            .and_then(|doc| doc.validate().map(|(nodes, conns)| (doc.name, nodes, conns)));
        self.end_io(PendingIo::Load);

        let (name, nodes, connections) = parsed.inspect_err(|err| {
            log::warn!("rejected workflow document: {err}");
        })?;
        self.drag.cancel();
        self.store.replace_with(nodes, connections);
        self.name = name;
        self.history.clear();
        self.selection = Selection::None;
        self.sync_heights();
        log::debug!(
            "loaded workflow {:?}: {} node(s), {} connection(s)",
            self.name,
            self.store.node_count(),
            self.store.connection_count()
        );
        Ok(())
    }

    /// `begin_load` + `finish_load` for a synchronously available document.
    pub fn load_document(&mut self, json: &str) -> Result<(), DesignerError> {
        self.begin_load()?;
        self.finish_load(json)
    }

    /// `begin_save` + `finish_save`, returning the serialized document.
    pub fn save_document(&mut self) -> Result<String, DesignerError> {
        let doc = self.begin_save()?;
        let json = doc.to_json();
        self.finish_save();
        Ok(json?)
    }

    fn begin_io(&mut self, io: PendingIo) -> Result<(), DesignerError> {
        if let Some(pending) = self.pending {
            log::warn!("{io:?} requested while {pending:?} is pending");
            return Err(DesignerError::StoreFrozen);
        }
        self.cancel_gesture();
        self.store.freeze();
        self.pending = Some(io);
        Ok(())
    }

    fn end_io(&mut self, io: PendingIo) {
        if self.pending == Some(io) {
            self.store.thaw();
            self.pending = None;
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────

    /// Feed pending store events to the height cache.
    fn sync_heights(&mut self) {
        for event in self.store.take_events() {
            self.heights.apply_event(&event);
        }
    }

    fn validate_selection(&mut self) {
        let stale = match self.selection {
            Selection::None => false,
            Selection::Node(id) => !self.store.contains(id),
            Selection::Connection(id) => self.store.connection(id).is_none(),
        };
        if stale {
            self.selection = Selection::None;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;

    fn engine_with_chain() -> (DesignerEngine, NodeId, NodeId) {
        let mut engine = DesignerEngine::default();
        let s = engine.create_node(NodeType::Start, Point::new(0.0, 0.0)).unwrap();
        let e = engine.create_node(NodeType::End, Point::new(300.0, 0.0)).unwrap();
        (engine, s, e)
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload = panic::catch_unwind(|| panic!("{} {}", "formatted", 1)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 1");
    }

    #[test]
    fn panicking_subscriber_is_contained_at_the_dispatch_boundary() {
        use std::cell::Cell;
        use std::rc::Rc;

        let (mut engine, s, _) = engine_with_chain();
        let armed = Rc::new(Cell::new(true));
        let trigger = Rc::clone(&armed);
        engine.subscribe(move |event| {
            if matches!(event, StoreEvent::NodeMoved(_)) && trigger.replace(false) {
                panic!("boom");
            }
        });

        engine.handle_event(&InputEvent::pointer_down(20.0, 20.0)).unwrap();
        let err = engine
            .handle_event(&InputEvent::pointer_move(120.0, 20.0))
            .unwrap_err();
        assert!(matches!(
            err,
            DesignerError::Internal { event: "pointer-move", ref message } if message == "boom"
        ));
        assert!(!err.is_user_facing());
        assert!(matches!(engine.drag_state(), DragState::Idle));
        assert!(engine.can_undo());

        // The move landed before the subscriber ran and is one undo step.
        assert_eq!(engine.store().get(s).unwrap().position, Point::new(100.0, 0.0));
        assert_eq!(engine.undo().unwrap(), Some("move node".to_string()));
        assert_eq!(engine.store().get(s).unwrap().position, Point::ORIGIN);

        // The session keeps going.
        engine.handle_event(&InputEvent::pointer_down(20.0, 20.0)).unwrap();
        engine.handle_event(&InputEvent::pointer_move(60.0, 20.0)).unwrap();
        engine.handle_event(&InputEvent::pointer_up(60.0, 20.0)).unwrap();
        assert_eq!(engine.store().get(s).unwrap().position, Point::new(40.0, 0.0));
    }

    #[test]
    fn palette_drop_snaps_and_selects() {
        let mut engine = DesignerEngine::default();
        let id = engine
            .create_node(NodeType::Condition, Point::new(123.0, 77.0))
            .unwrap();
        let node = engine.store().get(id).unwrap();
        assert_eq!(node.position, Point::new(120.0, 80.0));
        assert_eq!(node.name, "Condition");
        assert_eq!(engine.selection(), Selection::Node(id));
    }

    #[test]
    fn delete_selected_node_cascades() {
        let (mut engine, s, e) = engine_with_chain();
        engine.connect(s, e).unwrap();
        engine.handle_event(&InputEvent::pointer_down(20.0, 20.0)).unwrap();
        engine.handle_event(&InputEvent::pointer_up(20.0, 20.0)).unwrap();
        assert_eq!(engine.selection(), Selection::Node(s));

        engine
            .handle_event(&InputEvent::key("Delete", Modifiers::NONE))
            .unwrap();
        assert!(!engine.store().contains(s));
        assert_eq!(engine.store().connection_count(), 0);
        assert_eq!(engine.selection(), Selection::None);
    }

    #[test]
    fn frozen_store_rejects_edits_but_allows_zoom() {
        let (mut engine, _, _) = engine_with_chain();
        engine.begin_save().unwrap();
        assert!(matches!(
            engine.create_node(NodeType::Delay, Point::ORIGIN),
            Err(DesignerError::StoreFrozen)
        ));
        assert!(matches!(engine.auto_layout(), Err(DesignerError::StoreFrozen)));
        assert!(matches!(engine.begin_load(), Err(DesignerError::StoreFrozen)));

        let outcome = engine
            .handle_event(&InputEvent::Wheel {
                x: 0.0,
                y: 0.0,
                delta_y: -1.0,
            })
            .unwrap();
        assert!(outcome.redraw);
        assert!(engine.transform().scale > 1.0);

        engine.finish_save();
        assert!(engine.create_node(NodeType::Delay, Point::ORIGIN).is_ok());
    }

    #[test]
    fn height_reports_are_dropped_when_a_node_moves() {
        let (mut engine, s, _) = engine_with_chain();
        assert!(engine.report_height(s, 120.0));
        assert_eq!(engine.heights().get(s), Some(120.0));

        engine.handle_event(&InputEvent::pointer_down(20.0, 20.0)).unwrap();
        engine.handle_event(&InputEvent::pointer_move(80.0, 20.0)).unwrap();
        assert_eq!(engine.heights().get(s), None);
        assert!(!engine.report_height(NodeId::intern("no_such_node"), 50.0));
    }

    #[test]
    fn escape_cancels_and_clears_selection() {
        let (mut engine, s, _) = engine_with_chain();
        engine.handle_event(&InputEvent::pointer_down(20.0, 20.0)).unwrap();
        assert_eq!(engine.selection(), Selection::Node(s));
        let outcome = engine
            .handle_event(&InputEvent::key("Escape", Modifiers::NONE))
            .unwrap();
        assert_eq!(outcome.action, Some(ShortcutAction::Cancel));
        assert!(matches!(engine.drag_state(), DragState::Idle));
        assert_eq!(engine.selection(), Selection::None);
    }

    #[test]
    fn keyboard_zoom_resets_to_one() {
        let mut engine = DesignerEngine::default();
        engine.set_viewport_size(800.0, 600.0);
        engine.perform(ShortcutAction::ZoomIn).unwrap();
        engine.perform(ShortcutAction::ZoomIn).unwrap();
        assert!(engine.transform().scale > 1.2);
        engine.perform(ShortcutAction::ZoomReset).unwrap();
        assert!((engine.transform().scale - 1.0).abs() < 1e-5);
    }
}
