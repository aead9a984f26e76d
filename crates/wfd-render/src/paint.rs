//! Workflow frame → Vello drawing commands.
//!
//! Paints connections first, then the in-progress connection preview, then
//! nodes in store order so later nodes sit on top (matching hit testing).
//! Everything is drawn in canvas space under one pan/zoom `Affine`.

use crate::hit::to_cubic;
use kurbo::{Affine, BezPath, Circle, Rect, RoundedRect, Stroke};
use peniko::{Color, Fill};
use vello::Scene;
use wfd_core::geometry::{
    HeightCache, NodeMetrics, PathSpec, connection_path, input_anchor, output_anchor,
};
use wfd_core::id::{ConnectionId, NodeId};
use wfd_core::model::{CanvasTransform, Node, NodeType};
use wfd_core::store::WorkflowStore;

const CORNER_RADIUS: f64 = 6.0;
const HEADER_HEIGHT: f64 = 6.0;
const CONNECTION_WIDTH: f64 = 2.0;
const SELECTED_WIDTH: f64 = 3.0;

/// Colors for one theme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub node_fill: Color,
    pub node_border: Color,
    pub selected: Color,
    pub connection: Color,
    pub preview: Color,
    pub port: Color,
    pub snap: Color,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            node_fill: Color::from_rgb8(0xFF, 0xFF, 0xFF),
            node_border: Color::from_rgb8(0xD1, 0xD1, 0xD6),
            selected: Color::from_rgb8(0x00, 0x7A, 0xFF),
            connection: Color::from_rgb8(0x8E, 0x8E, 0x93),
            preview: Color::from_rgba8(0x00, 0x7A, 0xFF, 0x99),
            port: Color::from_rgb8(0x63, 0x63, 0x66),
            snap: Color::from_rgb8(0x34, 0xC7, 0x59),
        }
    }

    pub fn dark() -> Self {
        Self {
            node_fill: Color::from_rgb8(0x2C, 0x2C, 0x2E),
            node_border: Color::from_rgb8(0x48, 0x48, 0x4A),
            selected: Color::from_rgb8(0x0A, 0x84, 0xFF),
            connection: Color::from_rgb8(0x98, 0x98, 0x9D),
            preview: Color::from_rgba8(0x0A, 0x84, 0xFF, 0x99),
            port: Color::from_rgb8(0xAE, 0xAE, 0xB2),
            snap: Color::from_rgb8(0x30, 0xD1, 0x58),
        }
    }
}

/// Accent color of a node's header band.
pub fn accent(node_type: NodeType) -> Color {
    match node_type {
        NodeType::Start => Color::from_rgb8(0x34, 0xC7, 0x59),
        NodeType::End => Color::from_rgb8(0xFF, 0x3B, 0x30),
        NodeType::Condition => Color::from_rgb8(0xFF, 0x95, 0x00),
        NodeType::ApiCall => Color::from_rgb8(0x00, 0x7A, 0xFF),
        NodeType::Script => Color::from_rgb8(0xAF, 0x52, 0xDE),
        NodeType::Delay => Color::from_rgb8(0x5A, 0xC8, 0xFA),
        NodeType::Notification => Color::from_rgb8(0xFF, 0x2D, 0x55),
    }
}

/// Everything needed to paint one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub store: &'a WorkflowStore,
    pub heights: &'a HeightCache,
    pub metrics: &'a NodeMetrics,
    pub transform: CanvasTransform,
    pub selected_node: Option<NodeId>,
    pub selected_connection: Option<ConnectionId>,
    /// Preview curve of a connection being drawn.
    pub preview: Option<PathSpec>,
    /// Input port the preview is currently locked onto.
    pub snap_target: Option<NodeId>,
}

/// Counts of what was painted, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintStats {
    pub nodes: usize,
    pub connections: usize,
    pub ports: usize,
    pub preview: bool,
}

/// Pan/zoom as a kurbo affine: `screen = canvas * scale + offset`.
pub fn view_affine(transform: &CanvasTransform) -> Affine {
    Affine::translate((transform.offset_x as f64, transform.offset_y as f64))
        * Affine::scale(transform.effective_scale() as f64)
}

/// Paint a whole frame into `scene`.
///
/// Call once per frame with a freshly-cleared `Scene`.
pub fn paint_frame(scene: &mut Scene, view: &FrameView<'_>, palette: &Palette) -> PaintStats {
    let affine = view_affine(&view.transform);
    let mut stats = PaintStats::default();

    for conn in view.store.connections() {
        let Some(path) = connection_path(view.store, conn, view.heights, view.metrics) else {
            continue;
        };
        let selected = view.selected_connection == Some(conn.id);
        let (color, width) = if selected {
            (palette.selected, SELECTED_WIDTH)
        } else {
            (palette.connection, CONNECTION_WIDTH)
        };
        stroke_curve(scene, affine, &path, color, width);
        stats.connections += 1;
    }

    if let Some(path) = view.preview.filter(PathSpec::is_finite) {
        stroke_curve(scene, affine, &path, palette.preview, CONNECTION_WIDTH);
        stats.preview = true;
    }

    for node in view.store.nodes() {
        if !node.position.is_finite() {
            log::trace!("skipping {} with non-finite position", node.id);
            continue;
        }
        stats.ports += paint_node(scene, affine, view, node, palette);
        stats.nodes += 1;
    }

    log::trace!("painted frame: {stats:?}");
    stats
}

// ─── Node painters ───────────────────────────────────────────────────────

fn paint_node(
    scene: &mut Scene,
    affine: Affine,
    view: &FrameView<'_>,
    node: &Node,
    palette: &Palette,
) -> usize {
    let metrics = view.metrics;
    let x = node.position.x as f64;
    let y = node.position.y as f64;
    let w = metrics.outer_width() as f64;
    let h = view.heights.rendered_height(node.id, metrics) as f64;

    let body: RoundedRect = Rect::new(x, y, x + w, y + h).to_rounded_rect(CORNER_RADIUS);
    scene.fill(Fill::NonZero, affine, palette.node_fill, None, &body);

    let header = Rect::new(x, y, x + w, y + HEADER_HEIGHT.min(h));
    scene.fill(Fill::NonZero, affine, accent(node.node_type), None, &header);

    let selected = view.selected_node == Some(node.id);
    let (border, width) = if selected {
        (palette.selected, SELECTED_WIDTH)
    } else {
        (palette.node_border, metrics.border_width as f64)
    };
    scene.stroke(&Stroke::new(width), affine, border, None, &body);

    // Text shaping needs a font context the native surface does not own yet.
    log::trace!("label {:?} for {} not shaped", node.name, node.id);

    let radius = (metrics.port_diameter / 2.0) as f64;
    let mut ports = 0;
    if node.node_type.has_input() {
        let anchor = input_anchor(node, view.heights, metrics);
        let color = if view.snap_target == Some(node.id) {
            palette.snap
        } else {
            palette.port
        };
        let dot = Circle::new((anchor.x as f64, anchor.y as f64), radius);
        scene.fill(Fill::NonZero, affine, color, None, &dot);
        ports += 1;
    }
    if node.node_type.has_output() {
        let anchor = output_anchor(node, view.heights, metrics);
        let dot = Circle::new((anchor.x as f64, anchor.y as f64), radius);
        scene.fill(Fill::NonZero, affine, palette.port, None, &dot);
        ports += 1;
    }
    ports
}

fn stroke_curve(scene: &mut Scene, affine: Affine, path: &PathSpec, color: Color, width: f64) {
    let mut bez = BezPath::new();
    let cubic = to_cubic(path);
    bez.move_to(cubic.p0);
    bez.curve_to(cubic.p1, cubic.p2, cubic.p3);
    scene.stroke(&Stroke::new(width), affine, color, None, &bez);
}
