//! Canvas2D renderer for the designer page.
//!
//! Draws a [`FrameView`] to an HTML `<canvas>` via
//! `CanvasRenderingContext2d`. Node heights depend on how the description
//! wraps, so [`measure_heights`] runs first and its results are reported
//! back to the engine before anything is painted.

use wfd_core::geometry::{HeightCache, NodeMetrics, PathSpec, input_anchor, output_anchor};
use wfd_core::id::NodeId;
use wfd_core::model::{Node, NodeType};
use wfd_core::store::WorkflowStore;
use wfd_render::paint::FrameView;
use web_sys::CanvasRenderingContext2d;

const HEADER_HEIGHT: f64 = 26.0;
const NAME_LINE: f64 = 20.0;
const DESCRIPTION_LINE: f64 = 16.0;
const PADDING: f64 = 10.0;
const CORNER_RADIUS: f64 = 8.0;
const NAME_FONT: &str = "600 14px Inter, system-ui, sans-serif";
const BODY_FONT: &str = "12px Inter, system-ui, sans-serif";

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub node_fill: &'static str,
    pub node_border: &'static str,
    pub text: &'static str,
    pub muted_text: &'static str,
    pub connection: &'static str,
    pub preview: &'static str,
    pub selected: &'static str,
    pub port: &'static str,
    pub snap: &'static str,
}

impl CanvasTheme {
    /// Light theme, warm white canvas.
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            grid: "rgba(0, 0, 0, 0.08)",
            node_fill: "#FFFFFF",
            node_border: "#D2D2D7",
            text: "#1D1D1F",
            muted_text: "#86868B",
            connection: "#8E8E93",
            preview: "#4FC3F7",
            selected: "#4FC3F7",
            port: "#636366",
            snap: "#34C759",
        }
    }

    /// Dark theme.
    pub fn dark() -> Self {
        Self {
            bg: "#1C1C1E",
            grid: "rgba(255, 255, 255, 0.06)",
            node_fill: "#2C2C2E",
            node_border: "#3A3A3C",
            text: "#F5F5F7",
            muted_text: "#98989D",
            connection: "#8E8E93",
            preview: "#4FC3F7",
            selected: "#4FC3F7",
            port: "#AEAEB2",
            snap: "#30D158",
        }
    }
}

/// Header strip color per node type.
pub fn accent_css(node_type: NodeType) -> &'static str {
    match node_type {
        NodeType::Start => "#34C759",
        NodeType::End => "#FF3B30",
        NodeType::ApiCall => "#007AFF",
        NodeType::Condition => "#FF9500",
        NodeType::Notification => "#AF52DE",
        NodeType::Delay => "#5AC8FA",
        NodeType::Script => "#5856D6",
    }
}

/// Title shown on a node: its name, or the type's display name when blank.
pub fn node_title(node: &Node) -> &str {
    if node.name.trim().is_empty() {
        node.node_type.display_name()
    } else {
        &node.name
    }
}

// ─── Measurement ─────────────────────────────────────────────────────────

/// Greedy word wrap. `measure` returns the rendered width of a string.
pub fn wrap_lines(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if !current.is_empty() && measure(&candidate) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Outer height of a node whose description wraps to `description_lines`.
pub fn node_height(description_lines: usize, metrics: &NodeMetrics) -> f32 {
    let content = HEADER_HEIGHT
        + NAME_LINE
        + description_lines as f64 * DESCRIPTION_LINE
        + PADDING
        + metrics.border_width as f64 * 2.0;
    (content as f32).max(metrics.default_height)
}

fn description_lines(ctx: &CanvasRenderingContext2d, node: &Node, metrics: &NodeMetrics) -> Vec<String> {
    ctx.set_font(BODY_FONT);
    let max_width = metrics.content_width as f64 - PADDING * 2.0;
    wrap_lines(&node.description, max_width, |s| {
        ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0)
    })
}

/// Measure every node's rendered height with the context's fonts.
pub fn measure_heights(
    ctx: &CanvasRenderingContext2d,
    store: &WorkflowStore,
    metrics: &NodeMetrics,
) -> Vec<(NodeId, f32)> {
    ctx.save();
    let heights = store
        .nodes()
        .map(|node| {
            let lines = description_lines(ctx, node, metrics).len();
            (node.id, node_height(lines, metrics))
        })
        .collect();
    ctx.restore();
    heights
}

// ─── Frame ───────────────────────────────────────────────────────────────

/// Render one frame.
pub fn render_frame(
    ctx: &CanvasRenderingContext2d,
    view: &FrameView<'_>,
    canvas_width: f64,
    canvas_height: f64,
    grid_size: f32,
    theme: &CanvasTheme,
) {
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, canvas_width, canvas_height);
    draw_grid(ctx, view, canvas_width, canvas_height, grid_size, theme);

    let t = view.transform;
    let scale = t.effective_scale() as f64;
    ctx.save();
    let _ = ctx.set_transform(
        scale,
        0.0,
        0.0,
        scale,
        t.offset_x as f64,
        t.offset_y as f64,
    );

    for conn in view.store.connections() {
        let Some(path) =
            wfd_core::geometry::connection_path(view.store, conn, view.heights, view.metrics)
        else {
            continue;
        };
        let color = if view.selected_connection == Some(conn.id) {
            theme.selected
        } else {
            theme.connection
        };
        draw_curve(ctx, &path, color, 2.0, false);
        draw_arrowhead(ctx, &path, color);
    }

    if let Some(path) = view.preview {
        draw_curve(ctx, &path, theme.preview, 2.0, true);
    }

    for node in view.store.nodes() {
        let selected = view.selected_node == Some(node.id);
        let snapped = view.snap_target == Some(node.id);
        draw_node(ctx, node, view.heights, view.metrics, selected, snapped, theme);
    }

    ctx.restore();
}

fn draw_grid(
    ctx: &CanvasRenderingContext2d,
    view: &FrameView<'_>,
    width: f64,
    height: f64,
    grid_size: f32,
    theme: &CanvasTheme,
) {
    let spacing = (grid_size * view.transform.effective_scale()) as f64;
    // Dots closer than this turn into noise.
    if spacing < 6.0 {
        return;
    }
    ctx.set_fill_style_str(theme.grid);
    let start_x = (view.transform.offset_x as f64).rem_euclid(spacing);
    let start_y = (view.transform.offset_y as f64).rem_euclid(spacing);
    let mut x = start_x;
    while x < width {
        let mut y = start_y;
        while y < height {
            ctx.fill_rect(x, y, 1.5, 1.5);
            y += spacing;
        }
        x += spacing;
    }
}

fn draw_node(
    ctx: &CanvasRenderingContext2d,
    node: &Node,
    heights: &HeightCache,
    metrics: &NodeMetrics,
    selected: bool,
    snapped: bool,
    theme: &CanvasTheme,
) {
    let x = node.position.x as f64;
    let y = node.position.y as f64;
    let w = metrics.outer_width() as f64;
    let h = heights.rendered_height(node.id, metrics) as f64;

    ctx.save();
    rounded_rect_path(ctx, x, y, w, h, CORNER_RADIUS);
    ctx.set_fill_style_str(theme.node_fill);
    ctx.fill();
    ctx.set_stroke_style_str(if selected { theme.selected } else { theme.node_border });
    ctx.set_line_width(metrics.border_width as f64);
    ctx.stroke();

    // Header strip, clipped to the rounded outline.
    ctx.save();
    rounded_rect_path(ctx, x, y, w, h, CORNER_RADIUS);
    ctx.clip();
    ctx.set_fill_style_str(accent_css(node.node_type));
    ctx.fill_rect(x, y, w, HEADER_HEIGHT - PADDING);
    ctx.restore();

    ctx.set_text_baseline("top");
    ctx.set_text_align("left");
    ctx.set_font(BODY_FONT);
    ctx.set_fill_style_str(theme.muted_text);
    let _ = ctx.fill_text(node.node_type.display_name(), x + PADDING, y + HEADER_HEIGHT - 6.0);

    ctx.set_font(NAME_FONT);
    ctx.set_fill_style_str(theme.text);
    let _ = ctx.fill_text(node_title(node), x + PADDING, y + HEADER_HEIGHT + 8.0);

    let lines = description_lines(ctx, node, metrics);
    ctx.set_fill_style_str(theme.muted_text);
    let mut line_y = y + HEADER_HEIGHT + NAME_LINE + 8.0;
    for line in &lines {
        let _ = ctx.fill_text(line, x + PADDING, line_y);
        line_y += DESCRIPTION_LINE;
    }

    let radius = metrics.port_diameter as f64 / 2.0;
    if node.node_type.has_input() {
        let p = input_anchor(node, heights, metrics);
        let color = if snapped { theme.snap } else { theme.port };
        draw_port(ctx, p.x as f64, p.y as f64, if snapped { radius + 2.0 } else { radius }, color);
    }
    if node.node_type.has_output() {
        let p = output_anchor(node, heights, metrics);
        draw_port(ctx, p.x as f64, p.y as f64, radius, theme.port);
    }
    ctx.restore();
}

fn draw_port(ctx: &CanvasRenderingContext2d, x: f64, y: f64, radius: f64, color: &str) {
    ctx.begin_path();
    let _ = ctx.arc(x, y, radius, 0.0, std::f64::consts::TAU);
    ctx.set_fill_style_str(color);
    ctx.fill();
}

fn draw_curve(ctx: &CanvasRenderingContext2d, path: &PathSpec, color: &str, width: f64, dashed: bool) {
    ctx.save();
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width);
    if dashed {
        let _ = ctx.set_line_dash(&js_sys::Array::of2(
            &wasm_bindgen::JsValue::from_f64(6.0),
            &wasm_bindgen::JsValue::from_f64(4.0),
        ));
    }
    ctx.begin_path();
    ctx.move_to(path.start.x as f64, path.start.y as f64);
    ctx.bezier_curve_to(
        path.c1.x as f64,
        path.c1.y as f64,
        path.c2.x as f64,
        path.c2.y as f64,
        path.end.x as f64,
        path.end.y as f64,
    );
    ctx.stroke();
    ctx.restore();
}

/// Arrowhead at the curve's end, pointing along its final tangent.
fn draw_arrowhead(ctx: &CanvasRenderingContext2d, path: &PathSpec, color: &str) {
    let (tx, ty) = (path.end.x - path.c2.x, path.end.y - path.c2.y);
    let angle = if tx == 0.0 && ty == 0.0 {
        0.0
    } else {
        (ty as f64).atan2(tx as f64)
    };
    let size = 9.0;
    let x2 = path.end.x as f64;
    let y2 = path.end.y as f64;

    ctx.save();
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    ctx.move_to(x2, y2);
    ctx.line_to(x2 - size * (angle - 0.4).cos(), y2 - size * (angle - 0.4).sin());
    ctx.line_to(x2 - size * (angle + 0.4).cos(), y2 - size * (angle + 0.4).sin());
    ctx.close_path();
    ctx.fill();
    ctx.restore();
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}
