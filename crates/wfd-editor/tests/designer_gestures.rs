//! Integration tests: pointer gestures driven through the designer engine.

use wfd_core::geometry::{input_anchor, output_anchor};
use wfd_core::id::NodeId;
use wfd_core::model::{NodeType, Point};
use wfd_editor::{DesignerEngine, DragState, InputEvent, Selection};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn start_and_end() -> (DesignerEngine, NodeId, NodeId) {
    init_logging();
    let mut engine = DesignerEngine::default();
    let start = engine.create_node(NodeType::Start, Point::new(0.0, 0.0)).unwrap();
    let end = engine.create_node(NodeType::End, Point::new(300.0, 0.0)).unwrap();
    (engine, start, end)
}

fn output_port(engine: &DesignerEngine, id: NodeId) -> Point {
    let node = engine.store().get(id).unwrap();
    output_anchor(node, engine.heights(), &engine.config().metrics)
}

fn input_port(engine: &DesignerEngine, id: NodeId) -> Point {
    let node = engine.store().get(id).unwrap();
    input_anchor(node, engine.heights(), &engine.config().metrics)
}

fn gesture(engine: &mut DesignerEngine, from: Point, path: &[Point]) {
    engine
        .handle_event(&InputEvent::pointer_down(from.x, from.y))
        .unwrap();
    for p in path {
        engine.handle_event(&InputEvent::pointer_move(p.x, p.y)).unwrap();
    }
    let last = path.last().copied().unwrap_or(from);
    engine.handle_event(&InputEvent::pointer_up(last.x, last.y)).unwrap();
}

// ─── Connection drawing ──────────────────────────────────────────────────

#[test]
fn dragging_onto_an_input_port_connects() {
    let (mut engine, start, end) = start_and_end();
    let from = output_port(&engine, start);
    let target = input_port(&engine, end);
    let near = Point::new(target.x - 10.0, target.y + 10.0);

    gesture(&mut engine, from, &[Point::new(150.0, 80.0), near]);

    let conns: Vec<_> = engine.store().connections().copied().collect();
    assert_eq!(conns.len(), 1);
    assert_eq!((conns[0].from, conns[0].to), (start, end));
    assert!(matches!(engine.drag_state(), DragState::Idle));
    assert!(engine.preview_path().is_none());
}

#[test]
fn releasing_far_from_any_port_connects_nothing() {
    let (mut engine, start, _) = start_and_end();
    let from = output_port(&engine, start);
    let far = Point::new(from.x + 400.0, from.y + 300.0);

    gesture(&mut engine, from, &[far]);
    assert_eq!(engine.store().connection_count(), 0);
    assert_eq!(engine.store().node_count(), 2);
}

#[test]
fn drawing_the_same_connection_twice_keeps_one() {
    let (mut engine, start, end) = start_and_end();
    let from = output_port(&engine, start);
    let target = input_port(&engine, end);

    gesture(&mut engine, from, &[target]);
    gesture(&mut engine, from, &[target]);
    assert_eq!(engine.store().connection_count(), 1);
}

#[test]
fn preview_locks_onto_snap_target() {
    let (mut engine, start, end) = start_and_end();
    let from = output_port(&engine, start);
    let target = input_port(&engine, end);

    engine
        .handle_event(&InputEvent::pointer_down(from.x, from.y))
        .unwrap();
    engine
        .handle_event(&InputEvent::pointer_move(target.x + 5.0, target.y - 20.0))
        .unwrap();
    assert_eq!(engine.snap_target(), Some(end));
    assert_eq!(engine.preview_path().unwrap().end, target);
    assert!(engine.preview_path().unwrap().to_svg_path().starts_with("M "));

    // Leaving the surface discards the preview without connecting.
    engine.handle_event(&InputEvent::PointerLeave).unwrap();
    assert!(engine.preview_path().is_none());
    assert_eq!(engine.store().connection_count(), 0);
}

// ─── Node dragging ───────────────────────────────────────────────────────

#[test]
fn node_drag_lands_on_the_grid() {
    init_logging();
    let mut engine = DesignerEngine::default();
    let a = engine
        .create_node(NodeType::Script, Point::new(40.0, 40.0))
        .unwrap();

    // Grab (10, 10) inside the node and drop it so its corner is at (123, 77).
    gesture(
        &mut engine,
        Point::new(50.0, 50.0),
        &[Point::new(90.0, 61.0), Point::new(133.0, 87.0)],
    );
    assert_eq!(engine.store().get(a).unwrap().position, Point::new(120.0, 80.0));
    assert_eq!(engine.selection(), Selection::Node(a));
}

#[test]
fn cancelled_drag_keeps_committed_moves() {
    init_logging();
    let mut engine = DesignerEngine::default();
    let a = engine
        .create_node(NodeType::Delay, Point::new(0.0, 0.0))
        .unwrap();

    engine.handle_event(&InputEvent::pointer_down(20.0, 20.0)).unwrap();
    engine.handle_event(&InputEvent::pointer_move(220.0, 120.0)).unwrap();
    engine.handle_event(&InputEvent::PointerLeave).unwrap();

    assert_eq!(engine.store().get(a).unwrap().position, Point::new(200.0, 100.0));
    assert!(matches!(engine.drag_state(), DragState::Idle));

    // The partial drag is still a single undoable step.
    assert_eq!(engine.undo().unwrap().as_deref(), Some("move node"));
    assert_eq!(engine.store().get(a).unwrap().position, Point::ORIGIN);
}

// ─── Panning and selection ───────────────────────────────────────────────

#[test]
fn panning_moves_the_view_not_the_nodes() {
    let (mut engine, start, _) = start_and_end();
    let before = engine.store().get(start).unwrap().position;

    gesture(
        &mut engine,
        Point::new(600.0, 400.0),
        &[Point::new(620.0, 410.0), Point::new(650.0, 380.0)],
    );
    assert_eq!(engine.transform().offset_x, 50.0);
    assert_eq!(engine.transform().offset_y, -20.0);
    assert_eq!(engine.store().get(start).unwrap().position, before);
    assert_eq!(engine.selection(), Selection::None);
    assert!(!engine.can_redo());
}

#[test]
fn clicking_a_connection_selects_it_for_deletion() {
    let (mut engine, start, end) = start_and_end();
    let conn = engine.connect(start, end).unwrap().unwrap();
    let a = output_port(&engine, start);
    let b = input_port(&engine, end);
    let mid = Point::new((a.x + b.x) / 2.0, a.y);

    gesture(&mut engine, mid, &[]);
    assert_eq!(engine.selection(), Selection::Connection(conn));

    assert!(engine.delete_selected().unwrap());
    assert_eq!(engine.store().connection_count(), 0);
    assert_eq!(engine.store().node_count(), 2);
}
