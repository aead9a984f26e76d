//! WASM bridge for the workflow designer: exposes the Rust engine to the
//! designer page.
//!
//! Compiled via `wasm-pack build --target web`. Every call returns either a
//! plain bool ("redraw needed") or a small JSON string; errors come back in
//! the JSON, never as thrown exceptions. Panic recovery at the engine's
//! dispatch boundary only applies to native builds: on
//! `wasm32-unknown-unknown` a panic aborts the module, and the panic hook
//! installed here only logs it to the console.

mod render2d;

use serde::Serialize;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wfd_core::config::DesignerConfig;
use wfd_core::document::{NodeRecord, WorkflowDocument};
use wfd_core::id::{ConnectionId, NodeId};
use wfd_core::model::{NodeType, Point, Properties};
use wfd_core::store::NodeUpdate;
use wfd_editor::drag::Selection;
use wfd_editor::engine::EventOutcome;
use wfd_editor::input::{InputEvent, Modifiers};
use wfd_editor::shortcuts::ShortcutAction;
use wfd_editor::{DesignerEngine, DesignerError};
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing canvas controller.
///
/// Wraps a [`DesignerEngine`]. All interaction from the page goes through
/// this struct.
#[wasm_bindgen]
pub struct WorkflowCanvas {
    engine: DesignerEngine,
    width: f64,
    height: f64,
    /// Dark mode flag: `false` = light (default), `true` = dark.
    dark_mode: bool,
    /// Set by the store subscription whenever the graph changes.
    dirty: Rc<Cell<bool>>,
    last_error: Option<String>,
}

#[wasm_bindgen]
impl WorkflowCanvas {
    /// Create a canvas controller. `config_json` may be empty; an invalid
    /// config is logged and the defaults are used.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, config_json: &str) -> Self {
        init_console();

        let config = DesignerConfig::from_json(config_json).unwrap_or_else(|err| {
            log::warn!("ignoring designer config: {err}");
            DesignerConfig::default()
        });
        let mut engine = DesignerEngine::new(config);
        engine.set_viewport_size(width as f32, height as f32);

        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        engine.subscribe(move |_| flag.set(true));

        Self {
            engine,
            width,
            height,
            dark_mode: false,
            dirty,
            last_error: None,
        }
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Measure node heights, then draw the frame.
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d) {
        let metrics = self.engine.config().metrics;
        for (id, height) in render2d::measure_heights(ctx, self.engine.store(), &metrics) {
            if self.engine.heights().get(id) != Some(height) {
                self.engine.report_height(id, height);
            }
        }
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        render2d::render_frame(
            ctx,
            &self.engine.frame_view(),
            self.width,
            self.height,
            self.engine.config().grid_size,
            &theme,
        );
        self.dirty.set(false);
    }

    /// Set the canvas theme.
    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.engine.set_viewport_size(width as f32, height as f32);
    }

    /// Whether the graph changed since the last `render` or `take_dirty`.
    pub fn take_dirty(&mut self) -> bool {
        self.dirty.replace(false)
    }

    /// Report a height measured by an HTML overlay instead of `render`.
    pub fn report_height(&mut self, node_id: &str, height: f32) -> bool {
        height.is_finite() && self.engine.report_height(NodeId::intern(node_id), height)
    }

    // ─── Pointer & wheel ─────────────────────────────────────────────────

    /// Handle pointer down. Returns true if a redraw is needed.
    pub fn handle_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.event(InputEvent::PointerDown { x, y, modifiers })
    }

    pub fn handle_pointer_move(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.event(InputEvent::PointerMove { x, y, modifiers })
    }

    pub fn handle_pointer_up(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        self.event(InputEvent::PointerUp { x, y, modifiers })
    }

    /// The pointer left the canvas: abort the active gesture.
    pub fn handle_pointer_leave(&mut self) -> bool {
        self.event(InputEvent::PointerLeave)
    }

    pub fn handle_wheel(&mut self, x: f32, y: f32, delta_y: f32) -> bool {
        self.event(InputEvent::Wheel { x, y, delta_y })
    }

    /// Message of the last failed pointer/wheel event, or `""`.
    pub fn last_error(&self) -> String {
        self.last_error.clone().unwrap_or_default()
    }

    // ─── Keyboard & toolbar ──────────────────────────────────────────────

    /// Handle a keyboard event. Returns JSON:
    /// `{"changed":bool,"action":"<name>"}` plus `"error"` on failure.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let modifiers = Modifiers {
            shift,
            ctrl,
            alt,
            meta,
        };
        let event = InputEvent::Key {
            key: key.to_string(),
            modifiers,
        };
        match self.engine.handle_event(&event) {
            Ok(EventOutcome { redraw, action }) => json!({
                "changed": redraw,
                "action": action.map_or("none", ShortcutAction::as_str),
            })
            .to_string(),
            Err(err) => error_json(&err),
        }
    }

    /// Run a toolbar action by name (`"undo"`, `"auto_layout"`, ...).
    pub fn dispatch_action(&mut self, name: &str) -> String {
        let Some(action) = ShortcutAction::from_name(name) else {
            return json!({ "ok": false, "error": format!("unknown action `{name}`") }).to_string();
        };
        match self.engine.perform(action) {
            Ok(()) => json!({ "ok": true, "action": action.as_str() }).to_string(),
            Err(err) => error_json(&err),
        }
    }

    /// `{"ok":true,"step":"<description>"|null}`; `step` is null when the
    /// history was empty.
    pub fn undo(&mut self) -> String {
        let undone = self.engine.undo();
        history_json(undone)
    }

    pub fn redo(&mut self) -> String {
        let redone = self.engine.redo();
        history_json(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.engine.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.engine.can_redo()
    }

    /// Lay out the whole workflow. Returns `{"ok":true,"moved":n}` or the
    /// error to show the user (an empty workflow is reported, not ignored).
    pub fn auto_layout(&mut self) -> String {
        match self.engine.auto_layout() {
            Ok(moved) => json!({ "ok": true, "moved": moved }).to_string(),
            Err(err) => error_json(&err),
        }
    }

    // ─── Graph edits ─────────────────────────────────────────────────────

    /// Palette drop at screen coordinates. Returns `{"ok":true,"id":...}`.
    pub fn create_node(&mut self, node_type: &str, x: f32, y: f32) -> String {
        let Ok(node_type) = node_type.parse::<NodeType>() else {
            return json!({ "ok": false, "error": format!("unknown node type `{node_type}`") })
                .to_string();
        };
        match self.engine.create_node(node_type, Point::new(x, y)) {
            Ok(id) => json!({ "ok": true, "id": id.as_str() }).to_string(),
            Err(err) => error_json(&err),
        }
    }

    /// Connect two nodes by id. Returns the new connection id, or `""`
    /// when the connection was rejected.
    pub fn connect(&mut self, from: &str, to: &str) -> String {
        match self.engine.connect(NodeId::intern(from), NodeId::intern(to)) {
            Ok(Some(id)) => id.as_str().to_string(),
            Ok(None) => String::new(),
            Err(err) => {
                log::warn!("connect {from} -> {to}: {err}");
                String::new()
            }
        }
    }

    /// Property editor commit. `patch_json` holds any of `name`,
    /// `description` and `properties`.
    pub fn update_node(&mut self, node_id: &str, patch_json: &str) -> String {
        let patch: NodePatch = match serde_json::from_str(patch_json) {
            Ok(patch) => patch,
            Err(err) => return json!({ "ok": false, "error": err.to_string() }).to_string(),
        };
        let update = NodeUpdate {
            name: patch.name,
            description: patch.description,
            properties: patch.properties,
        };
        match self.engine.update_node(NodeId::intern(node_id), update) {
            Ok(changed) => json!({ "ok": true, "changed": changed }).to_string(),
            Err(err) => error_json(&err),
        }
    }

    /// Delete the selected node (with its connections) or connection.
    /// Returns `{"ok":true,"deleted":bool}` or the error.
    pub fn delete_selected(&mut self) -> String {
        match self.engine.delete_selected() {
            Ok(deleted) => json!({ "ok": true, "deleted": deleted }).to_string(),
            Err(err) => error_json(&err),
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// `{"kind":"none"}`, `{"kind":"node","id":...}` or
    /// `{"kind":"connection","id":...}`.
    pub fn get_selection(&self) -> String {
        match self.engine.selection() {
            Selection::None => json!({ "kind": "none" }),
            Selection::Node(id) => json!({ "kind": "node", "id": id.as_str() }),
            Selection::Connection(id) => json!({ "kind": "connection", "id": id.as_str() }),
        }
        .to_string()
    }

    /// A node in document form, or `"null"` when it does not exist.
    pub fn get_node(&self, node_id: &str) -> String {
        self.engine
            .store()
            .get(NodeId::intern(node_id))
            .and_then(|node| serde_json::to_string(&NodeRecord::from(node)).ok())
            .unwrap_or_else(|| "null".to_string())
    }

    /// Curves for every connection: `[{"id":...,"d":"M ... C ..."}]`.
    pub fn connection_paths(&self) -> String {
        let paths: Vec<PathJson> = self
            .engine
            .connection_paths()
            .into_iter()
            .map(|(id, path): (ConnectionId, _)| PathJson {
                id: id.as_str().to_string(),
                d: path.to_svg_path(),
            })
            .collect();
        serde_json::to_string(&paths).unwrap_or_else(|_| "[]".to_string())
    }

    /// SVG data of the connection being drawn, or `""`.
    pub fn preview_path(&self) -> String {
        self.engine
            .preview_path()
            .map(|p| p.to_svg_path())
            .unwrap_or_default()
    }

    /// Name of the active gesture (`"idle"`, `"panning"`, `"dragging-node"`,
    /// `"drawing-connection"`).
    pub fn drag_state(&self) -> String {
        self.engine.drag_state().name().to_string()
    }

    // ─── Persistence handshake ───────────────────────────────────────────

    /// Freeze the store and return the document to persist:
    /// `{"ok":true,"document":{...}}`. Call `finish_save` when the request
    /// completes either way.
    pub fn begin_save(&mut self) -> String {
        match self.engine.begin_save() {
            Ok(doc) => json!({ "ok": true, "document": doc }).to_string(),
            Err(err) => error_json(&err),
        }
    }

    pub fn finish_save(&mut self) {
        self.engine.finish_save();
    }

    /// Freeze the store while the page fetches a document. Returns
    /// `{"ok":true}` or the error (another request is still pending).
    pub fn begin_load(&mut self) -> String {
        match self.engine.begin_load() {
            Ok(()) => json!({ "ok": true }).to_string(),
            Err(err) => error_json(&err),
        }
    }

    /// Apply the fetched document. On error the previous workflow stays.
    pub fn finish_load(&mut self, json: &str) -> String {
        match self.engine.finish_load(json) {
            Ok(()) => self.loaded_json(),
            Err(err) => error_json(&err),
        }
    }

    /// Load a document that is already in hand.
    pub fn load_workflow(&mut self, json: &str) -> String {
        match self.engine.load_document(json) {
            Ok(()) => self.loaded_json(),
            Err(err) => error_json(&err),
        }
    }

    /// Serialize the current workflow, or `""` when a request is pending.
    pub fn save_workflow(&mut self) -> String {
        self.engine.save_document().unwrap_or_else(|err| {
            log::warn!("save_workflow: {err}");
            String::new()
        })
    }

    pub fn set_name(&mut self, name: &str) {
        self.engine.set_name(name);
    }
}

// ─── Private helpers ─────────────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct NodePatch {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Serialize)]
struct PathJson {
    id: String,
    d: String,
}

impl WorkflowCanvas {
    fn event(&mut self, event: InputEvent) -> bool {
        match self.engine.handle_event(&event) {
            Ok(outcome) => {
                self.last_error = None;
                outcome.redraw
            }
            Err(err) => {
                log::error!("{} failed: {err}", event.name());
                self.last_error = Some(err.to_string());
                true
            }
        }
    }

    fn loaded_json(&self) -> String {
        let store = self.engine.store();
        json!({
            "ok": true,
            "name": self.engine.name(),
            "nodes": store.node_count(),
            "connections": store.connection_count(),
        })
        .to_string()
    }
}

fn history_json(step: Result<Option<String>, DesignerError>) -> String {
    match step {
        Ok(step) => json!({ "ok": true, "step": step }).to_string(),
        Err(err) => error_json(&err),
    }
}

fn error_json(err: &DesignerError) -> String {
    json!({
        "ok": false,
        "error": err.to_string(),
        "userFacing": err.is_user_facing(),
    })
    .to_string()
}

// ─── Console logging & panic hook ────────────────────────────────────────

fn init_console() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = console_log::init_with_level(log::Level::Info);
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("workflow designer panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// Validate a workflow document. Returns `{"ok":true,"nodes":n,...}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_workflow(json: &str) -> String {
    let checked = WorkflowDocument::from_json(json).and_then(|doc| doc.validate());
    match checked {
        Ok((nodes, connections)) => {
            json!({ "ok": true, "nodes": nodes.len(), "connections": connections.len() })
                .to_string()
        }
        Err(err) => json!({ "ok": false, "error": err.to_string() }).to_string(),
    }
}

/// Palette entries: `[{"type":"start","name":"Start","input":false,"output":true}, ...]`.
#[wasm_bindgen]
pub fn node_types() -> String {
    let types: Vec<_> = NodeType::ALL
        .iter()
        .map(|t| {
            json!({
                "type": t.as_str(),
                "name": t.display_name(),
                "input": t.has_input(),
                "output": t.has_output(),
            })
        })
        .collect();
    serde_json::Value::Array(types).to_string()
}
