//! The node/connection store: single source of truth for the graph.
//!
//! Backed by a `StableDiGraph` whose nodes are workflow nodes and whose edges
//! are connections, so removing a node drops every incident connection in
//! the same call. Insertion order is tracked separately and is what the rest
//! of the designer means by "store order".
//!
//! Every operation is synchronous. Operations on stale ids, and operations
//! that would break an invariant (self-loop, duplicate connection), are
//! no-ops that report `None`/`false` rather than errors.

use crate::id::{ConnectionId, NodeId};
use crate::model::{Connection, Node, NodeType, Point, Properties};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// Oldest journal entries are discarded past this length.
const JOURNAL_LIMIT: usize = 4096;

/// A change that has been fully applied to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    NodeAdded(NodeId),
    NodeMoved(NodeId),
    /// Name, description or properties changed.
    NodeUpdated(NodeId),
    NodeRemoved {
        id: NodeId,
        /// Connections removed together with the node.
        cascaded: SmallVec<[ConnectionId; 4]>,
    },
    ConnectionAdded(ConnectionId),
    ConnectionRemoved(ConnectionId),
    /// A batch of positions was written at once (auto-layout).
    PositionsApplied(usize),
    /// The whole graph was swapped out (document load, undo/redo).
    Replaced,
}

/// Handle returned by [`WorkflowStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&StoreEvent)>;

/// Partial edit of a node's descriptive fields.
#[derive(Debug, Clone, Default)]
pub struct NodeUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Option<Properties>,
}

pub struct WorkflowStore {
    graph: StableDiGraph<Node, Connection>,
    node_index: HashMap<NodeId, NodeIndex>,
    edge_index: HashMap<ConnectionId, EdgeIndex>,
    node_order: Vec<NodeId>,
    connection_order: Vec<ConnectionId>,
    frozen: bool,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    journal: Vec<StoreEvent>,
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WorkflowStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowStore")
            .field("nodes", &self.node_order)
            .field("connections", &self.connection_order)
            .field("frozen", &self.frozen)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl WorkflowStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
            node_order: Vec::new(),
            connection_order: Vec::new(),
            frozen: false,
            subscribers: Vec::new(),
            next_subscription: 0,
            journal: Vec::new(),
        }
    }

    // ─── Node mutations ──────────────────────────────────────────────────

    /// Create a node with a fresh id and the type's default name.
    ///
    /// Returns `None` only while the store is frozen.
    pub fn add_node(
        &mut self,
        node_type: NodeType,
        position: Point,
        properties: Properties,
    ) -> Option<Node> {
        if self.guard_frozen("add_node") {
            return None;
        }
        let id = self.fresh_node_id(node_type);
        let mut node = Node::new(id, node_type, position);
        node.properties = properties;
        self.insert_node(node.clone());
        log::debug!("added {node_type} node {id} at ({}, {})", position.x, position.y);
        self.emit(StoreEvent::NodeAdded(id));
        Some(node)
    }

    /// Set a node's absolute position. Missing ids are ignored.
    pub fn move_node(&mut self, id: NodeId, position: Point) -> bool {
        if self.guard_frozen("move_node") {
            return false;
        }
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        node.position = position;
        log::trace!("moved {id} to ({}, {})", position.x, position.y);
        self.emit(StoreEvent::NodeMoved(id));
        true
    }

    /// Apply a property-editor edit. Missing ids are ignored.
    pub fn update_node(&mut self, id: NodeId, update: NodeUpdate) -> bool {
        if self.guard_frozen("update_node") {
            return false;
        }
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        if let Some(name) = update.name {
            node.name = name;
        }
        if let Some(description) = update.description {
            node.description = description;
        }
        if let Some(properties) = update.properties {
            node.properties = properties;
        }
        self.emit(StoreEvent::NodeUpdated(id));
        true
    }

    /// Remove a node together with every connection that touches it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        if self.guard_frozen("remove_node") {
            return None;
        }
        let idx = self.node_index.get(&id).copied()?;

        let cascaded: SmallVec<[ConnectionId; 4]> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().id)
            .collect();

        let removed = self.graph.remove_node(idx)?;
        self.node_index.remove(&id);
        self.node_order.retain(|n| *n != id);
        for conn in &cascaded {
            self.edge_index.remove(conn);
        }
        self.connection_order.retain(|c| !cascaded.contains(c));

        log::debug!("removed node {id} and {} connection(s)", cascaded.len());
        self.emit(StoreEvent::NodeRemoved { id, cascaded });
        Some(removed)
    }

    /// Write many positions at once and emit a single event.
    /// Missing ids are skipped. Returns how many nodes moved.
    pub fn apply_positions(&mut self, positions: &[(NodeId, Point)]) -> usize {
        if self.guard_frozen("apply_positions") {
            return 0;
        }
        let mut moved = 0;
        for &(id, position) in positions {
            if let Some(node) = self.get_mut(id) {
                node.position = position;
                moved += 1;
            }
        }
        log::debug!("applied {moved} position(s) in one batch");
        self.emit(StoreEvent::PositionsApplied(moved));
        moved
    }

    // ─── Connection mutations ────────────────────────────────────────────

    /// Connect `from`'s output to `to`'s input.
    ///
    /// Returns `None` for self-loops, duplicates of an existing
    /// `(from, to)` pair, unknown endpoints, or a frozen store.
    pub fn add_connection(&mut self, from: NodeId, to: NodeId) -> Option<Connection> {
        if self.guard_frozen("add_connection") || from == to {
            return None;
        }
        let a = self.node_index.get(&from).copied()?;
        let b = self.node_index.get(&to).copied()?;
        if self.graph.find_edge(a, b).is_some() {
            log::trace!("ignoring duplicate connection {from} -> {to}");
            return None;
        }
        let conn = Connection {
            id: self.fresh_connection_id(),
            from,
            to,
        };
        self.insert_connection_at(a, b, conn);
        log::debug!("connected {from} -> {to} as {}", conn.id);
        self.emit(StoreEvent::ConnectionAdded(conn.id));
        Some(conn)
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> bool {
        if self.guard_frozen("remove_connection") {
            return false;
        }
        let Some(edge) = self.edge_index.remove(&id) else {
            return false;
        };
        self.graph.remove_edge(edge);
        self.connection_order.retain(|c| *c != id);
        log::debug!("removed connection {id}");
        self.emit(StoreEvent::ConnectionRemoved(id));
        true
    }

    // ─── Whole-graph replacement ─────────────────────────────────────────

    /// Swap the entire graph for `nodes` + `connections`.
    ///
    /// Allowed while frozen: this is how an outstanding load completes.
    /// Callers validate first; here duplicate node ids keep the first
    /// occurrence and connections that break an invariant are dropped.
    pub fn replace_with(&mut self, nodes: Vec<Node>, connections: Vec<Connection>) {
        self.graph.clear();
        self.node_index.clear();
        self.edge_index.clear();
        self.node_order.clear();
        self.connection_order.clear();

        for node in nodes {
            if self.node_index.contains_key(&node.id) {
                log::warn!("dropping duplicate node {} during replace", node.id);
                continue;
            }
            self.insert_node(node);
        }
        for conn in connections {
            let endpoints = (
                self.node_index.get(&conn.from).copied(),
                self.node_index.get(&conn.to).copied(),
            );
            let (Some(a), Some(b)) = endpoints else {
                log::warn!("dropping dangling connection {} during replace", conn.id);
                continue;
            };
            if conn.from == conn.to
                || self.graph.find_edge(a, b).is_some()
                || self.edge_index.contains_key(&conn.id)
            {
                log::warn!("dropping invalid connection {} during replace", conn.id);
                continue;
            }
            self.insert_connection_at(a, b, conn);
        }

        log::debug!(
            "store replaced: {} node(s), {} connection(s)",
            self.node_order.len(),
            self.connection_order.len()
        );
        self.emit(StoreEvent::Replaced);
    }

    // ─── Freeze ──────────────────────────────────────────────────────────

    /// Make the store read-only (a save or load is outstanding).
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn thaw(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.node_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.edge_index.get(&id).map(|e| &self.graph[*e])
    }

    /// The connection from `from` to `to`, if any.
    pub fn find_connection(&self, from: NodeId, to: NodeId) -> Option<&Connection> {
        let a = self.node_index.get(&from).copied()?;
        let b = self.node_index.get(&to).copied()?;
        self.graph.find_edge(a, b).map(|e| &self.graph[e])
    }

    /// Nodes in store (insertion) order.
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> + '_ {
        self.node_order.iter().map(|id| &self.graph[self.node_index[id]])
    }

    /// Connections in store (insertion) order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connection_order
            .iter()
            .map(|id| &self.graph[self.edge_index[id]])
    }

    /// Every connection whose source or target is `id`, in store order.
    pub fn connections_of(&self, id: NodeId) -> Vec<Connection> {
        self.connections()
            .filter(|c| c.from == id || c.to == id)
            .copied()
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connection_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_order.is_empty()
    }

    // ─── Observers ───────────────────────────────────────────────────────

    /// Register a callback invoked synchronously after every applied mutation.
    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Drain the event journal (pull-based alternative to `subscribe`).
    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.journal)
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.node_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    fn insert_node(&mut self, node: Node) {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        self.node_order.push(id);
    }

    fn insert_connection_at(&mut self, a: NodeIndex, b: NodeIndex, conn: Connection) {
        let edge = self.graph.add_edge(a, b, conn);
        self.edge_index.insert(conn.id, edge);
        self.connection_order.push(conn.id);
    }

    fn fresh_node_id(&self, node_type: NodeType) -> NodeId {
        loop {
            let id = NodeId::with_prefix(node_type.as_str());
            if !self.node_index.contains_key(&id) {
                return id;
            }
        }
    }

    fn fresh_connection_id(&self) -> ConnectionId {
        loop {
            let id = ConnectionId::with_prefix("conn");
            if !self.edge_index.contains_key(&id) {
                return id;
            }
        }
    }

    fn guard_frozen(&self, op: &str) -> bool {
        if self.frozen {
            log::warn!("{op} ignored: store is frozen while a save/load is outstanding");
        }
        self.frozen
    }

    fn emit(&mut self, event: StoreEvent) {
        for (_, callback) in &mut self.subscribers {
            callback(&event);
        }
        if self.journal.len() >= JOURNAL_LIMIT {
            self.journal.drain(..JOURNAL_LIMIT / 2);
        }
        self.journal.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn add(store: &mut WorkflowStore, t: NodeType, x: f32, y: f32) -> NodeId {
        store
            .add_node(t, Point::new(x, y), Properties::new())
            .unwrap()
            .id
    }

    #[test]
    fn add_node_assigns_fresh_ids() {
        let mut store = WorkflowStore::new();
        let a = add(&mut store, NodeType::Script, 0.0, 0.0);
        let b = add(&mut store, NodeType::Script, 0.0, 0.0);
        assert_ne!(a, b);
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.get(a).unwrap().name, "Script");
    }

    #[test]
    fn self_loop_is_rejected() {
        let mut store = WorkflowStore::new();
        let a = add(&mut store, NodeType::Script, 0.0, 0.0);
        assert!(store.add_connection(a, a).is_none());
        assert_eq!(store.connection_count(), 0);
    }

    #[test]
    fn duplicate_connection_is_ignored() {
        let mut store = WorkflowStore::new();
        let a = add(&mut store, NodeType::Start, 0.0, 0.0);
        let b = add(&mut store, NodeType::End, 300.0, 0.0);
        assert!(store.add_connection(a, b).is_some());
        assert!(store.add_connection(a, b).is_none());
        assert_eq!(store.connection_count(), 1);
        // The reverse direction is a different ordered pair.
        assert!(store.add_connection(b, a).is_some());
        assert_eq!(store.connection_count(), 2);
    }

    #[test]
    fn remove_node_cascades() {
        let mut store = WorkflowStore::new();
        let a = add(&mut store, NodeType::Start, 0.0, 0.0);
        let b = add(&mut store, NodeType::Script, 200.0, 0.0);
        let c = add(&mut store, NodeType::End, 400.0, 0.0);
        store.add_connection(a, b);
        store.add_connection(b, c);
        store.add_connection(a, c);

        store.remove_node(b).unwrap();
        assert!(store.connections_of(b).is_empty());
        assert_eq!(store.connection_count(), 1);
        assert!(store.find_connection(a, c).is_some());

        let events = store.take_events();
        match events.last() {
            Some(StoreEvent::NodeRemoved { id, cascaded }) => {
                assert_eq!(*id, b);
                assert_eq!(cascaded.len(), 2);
            }
            other => panic!("expected NodeRemoved, got {other:?}"),
        }
    }

    #[test]
    fn stale_ids_are_noops() {
        let mut store = WorkflowStore::new();
        let ghost = NodeId::intern("ghost_node");
        assert!(!store.move_node(ghost, Point::new(1.0, 1.0)));
        assert!(store.remove_node(ghost).is_none());
        assert!(!store.remove_connection(ConnectionId::intern("ghost_conn")));
        assert!(store.take_events().is_empty());
    }

    #[test]
    fn frozen_store_rejects_mutations() {
        let mut store = WorkflowStore::new();
        let a = add(&mut store, NodeType::Start, 0.0, 0.0);
        store.freeze();
        assert!(store.add_node(NodeType::End, Point::ORIGIN, Properties::new()).is_none());
        assert!(!store.move_node(a, Point::new(99.0, 99.0)));
        assert!(store.remove_node(a).is_none());
        assert_eq!(store.get(a).unwrap().position, Point::ORIGIN);
        store.thaw();
        assert!(store.move_node(a, Point::new(99.0, 99.0)));
    }

    #[test]
    fn subscribers_see_each_mutation_once() {
        let mut store = WorkflowStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        let a = add(&mut store, NodeType::Start, 0.0, 0.0);
        store.move_node(a, Point::new(20.0, 40.0));
        assert_eq!(
            *seen.borrow(),
            vec![StoreEvent::NodeAdded(a), StoreEvent::NodeMoved(a)]
        );

        assert!(store.unsubscribe(sub));
        store.move_node(a, Point::new(0.0, 0.0));
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn iteration_follows_insertion_order_after_removal() {
        let mut store = WorkflowStore::new();
        let a = add(&mut store, NodeType::Start, 0.0, 0.0);
        let b = add(&mut store, NodeType::Script, 0.0, 0.0);
        store.remove_node(a);
        let c = add(&mut store, NodeType::End, 0.0, 0.0);
        let order: Vec<NodeId> = store.nodes().map(|n| n.id).collect();
        assert_eq!(order, vec![b, c]);
    }

    #[test]
    fn replace_drops_invalid_connections() {
        let mut store = WorkflowStore::new();
        let a = Node::new(NodeId::intern("r_a"), NodeType::Start, Point::ORIGIN);
        let b = Node::new(NodeId::intern("r_b"), NodeType::End, Point::ORIGIN);
        let conns = vec![
            Connection {
                id: ConnectionId::intern("r_ab"),
                from: a.id,
                to: b.id,
            },
            Connection {
                id: ConnectionId::intern("r_ab_dup"),
                from: a.id,
                to: b.id,
            },
            Connection {
                id: ConnectionId::intern("r_aa"),
                from: a.id,
                to: a.id,
            },
        ];
        store.freeze();
        store.replace_with(vec![a, b], conns);
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.connection_count(), 1);
        assert_eq!(store.take_events(), vec![StoreEvent::Replaced]);
    }
}
