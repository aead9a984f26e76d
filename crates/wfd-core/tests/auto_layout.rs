//! Integration tests: document → auto-layout plan → batch write.

use pretty_assertions::assert_eq;
use wfd_core::config::DesignerConfig;
use wfd_core::document::WorkflowDocument;
use wfd_core::geometry::HeightCache;
use wfd_core::id::NodeId;
use wfd_core::layout::compute_layout;
use wfd_core::model::Point;
use wfd_core::store::{StoreEvent, WorkflowStore};

fn onboarding() -> WorkflowStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut store = WorkflowStore::new();
    WorkflowDocument::from_json(include_str!("fixtures/onboarding.json"))
        .unwrap()
        .load_into(&mut store)
        .unwrap();
    store.take_events();
    store
}

fn pos(store: &WorkflowStore, id: &str) -> Point {
    store.get(NodeId::intern(id)).unwrap().position
}

#[test]
fn onboarding_levels() {
    let store = onboarding();
    let config = DesignerConfig::default();
    let plan = compute_layout(&store, &config.layout, config.grid_size).unwrap();

    let levels: Vec<Vec<&str>> = plan
        .levels
        .iter()
        .map(|l| l.iter().map(|id| id.as_str()).collect())
        .collect();
    assert_eq!(
        levels,
        vec![
            vec!["start_1"],
            vec!["api_call_2"],
            vec!["condition_3"],
            vec!["notification_4", "delay_5"],
            vec!["end_6"],
        ]
    );
}

#[test]
fn applying_the_plan_is_one_batch_and_clears_heights() {
    let mut store = onboarding();
    let config = DesignerConfig::default();
    let mut heights = HeightCache::new();
    for node in store.nodes() {
        heights.report(node.id, 90.0);
    }

    let plan = compute_layout(&store, &config.layout, config.grid_size).unwrap();
    assert_eq!(store.apply_positions(&plan.positions), 6);

    let events = store.take_events();
    assert_eq!(events, vec![StoreEvent::PositionsApplied(6)]);
    for event in &events {
        heights.apply_event(event);
    }
    assert!(heights.is_empty());

    assert_eq!(pos(&store, "start_1"), Point::new(40.0, 100.0));
    assert_eq!(pos(&store, "api_call_2"), Point::new(320.0, 100.0));
    assert_eq!(pos(&store, "notification_4"), Point::new(880.0, 40.0));
    assert_eq!(pos(&store, "delay_5"), Point::new(880.0, 160.0));
    assert_eq!(pos(&store, "end_6"), Point::new(1160.0, 100.0));
}

#[test]
fn every_position_is_on_the_grid() {
    let store = onboarding();
    let mut config = DesignerConfig::default();
    config.layout.start_x = 33.0;
    config.layout.vertical_gap = 37.0;
    let plan = compute_layout(&store, &config.layout, config.grid_size).unwrap();
    for (_, p) in &plan.positions {
        assert_eq!(p.x % 20.0, 0.0, "x {} off grid", p.x);
        assert_eq!(p.y % 20.0, 0.0, "y {} off grid", p.y);
    }
}

#[test]
fn layout_is_idempotent() {
    let mut store = onboarding();
    let config = DesignerConfig::default();
    let first = compute_layout(&store, &config.layout, config.grid_size).unwrap();
    store.apply_positions(&first.positions);
    let second = compute_layout(&store, &config.layout, config.grid_size).unwrap();
    assert_eq!(first, second);
}
