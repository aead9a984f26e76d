//! Serialized workflow document: the only wire format the designer speaks.
//!
//! ```json
//! {
//!   "name": "Onboarding",
//!   "nodes": [{ "id": "start_1", "type": "start", "name": "Start",
//!               "description": "", "x": 40, "y": 40, "properties": {} }],
//!   "connections": [{ "id": "conn_1", "fromNodeId": "start_1", "toNodeId": "end_2" }]
//! }
//! ```
//!
//! Loading is strict about node types and connection endpoints and lenient
//! about everything else: missing `description`/`properties` get defaults,
//! and an empty or `null` payload is a blank workflow.

use crate::error::DocumentError;
use crate::id::{ConnectionId, NodeId};
use crate::model::{Connection, Node, NodeType, Point, Properties};
use crate::store::WorkflowStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

/// A node as it appears on the wire.
///
/// `node_type` stays a string until validation so an unknown type can be
/// reported by name instead of as a generic serde error. `name` is `None`
/// only when the wire omits it (or sends `null`); an empty string is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub id: String,
    pub from_node_id: String,
    pub to_node_id: String,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.as_str().to_string(),
            node_type: node.node_type.as_str().to_string(),
            name: Some(node.name.clone()),
            description: node.description.clone(),
            x: node.position.x,
            y: node.position.y,
            properties: node.properties.clone(),
        }
    }
}

impl From<&Connection> for ConnectionRecord {
    fn from(conn: &Connection) -> Self {
        Self {
            id: conn.id.as_str().to_string(),
            from_node_id: conn.from.as_str().to_string(),
            to_node_id: conn.to.as_str().to_string(),
        }
    }
}

impl WorkflowDocument {
    /// Parse a document returned by the persistence collaborator.
    ///
    /// Blank input and a literal `null` both mean "no workflow yet".
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let trimmed = json.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let doc: Option<WorkflowDocument> = serde_json::from_str(trimmed)?;
        Ok(doc.unwrap_or_default())
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Snapshot the store verbatim.
    pub fn from_store(name: &str, store: &WorkflowStore) -> Self {
        Self {
            name: name.to_string(),
            nodes: store.nodes().map(NodeRecord::from).collect(),
            connections: store.connections().map(ConnectionRecord::from).collect(),
        }
    }

    /// Check the document and convert it into store records.
    ///
    /// Rejects unknown node types, repeated node ids, and connections that
    /// reference a node not in the document. Nothing is partially applied.
    pub fn validate(&self) -> Result<(Vec<Node>, Vec<Connection>), DocumentError> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        let mut nodes = Vec::with_capacity(self.nodes.len());

        for record in &self.nodes {
            let node_type: NodeType =
                record
                    .node_type
                    .parse()
                    .map_err(|()| DocumentError::UnknownNodeType {
                        node_id: record.id.clone(),
                        node_type: record.node_type.clone(),
                    })?;
            if !seen.insert(record.id.as_str()) {
                return Err(DocumentError::DuplicateNodeId(record.id.clone()));
            }
            let name = record
                .name
                .clone()
                .unwrap_or_else(|| node_type.display_name().to_string());
            nodes.push(Node {
                id: NodeId::intern(&record.id),
                node_type,
                name,
                description: record.description.clone(),
                position: Point::new(finite_or_zero(record.x), finite_or_zero(record.y)),
                properties: record.properties.clone(),
            });
        }

        let mut connections = Vec::with_capacity(self.connections.len());
        for record in &self.connections {
            for endpoint in [&record.from_node_id, &record.to_node_id] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(DocumentError::DanglingConnection {
                        connection_id: record.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
            connections.push(Connection {
                id: ConnectionId::intern(&record.id),
                from: NodeId::intern(&record.from_node_id),
                to: NodeId::intern(&record.to_node_id),
            });
        }

        Ok((nodes, connections))
    }

    /// Validate and then replace the store's contents wholesale.
    /// On error the store is untouched.
    pub fn load_into(&self, store: &mut WorkflowStore) -> Result<(), DocumentError> {
        let (nodes, connections) = self.validate()?;
        store.replace_with(nodes, connections);
        Ok(())
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}
