//! Error types surfaced to the user.
//!
//! Stale ids, self-loops and duplicate connections are not errors: the
//! store ignores them and returns `None`/`false`. Only failures a user must
//! be told about (a bad document, laying out an empty graph) live here.

use thiserror::Error;

/// A workflow document that cannot be loaded.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("workflow document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node `{node_id}` has unknown type `{node_type}`")]
    UnknownNodeType { node_id: String, node_type: String },

    #[error("node id `{0}` appears more than once")]
    DuplicateNodeId(String),

    #[error("connection `{connection_id}` references missing node `{node_id}`")]
    DanglingConnection {
        connection_id: String,
        node_id: String,
    },
}

/// Auto-layout refused to run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("nothing to lay out: the workflow has no nodes")]
    EmptyGraph,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_ids() {
        let err = DocumentError::DanglingConnection {
            connection_id: "conn_1".into(),
            node_id: "ghost".into(),
        };
        assert_eq!(
            err.to_string(),
            "connection `conn_1` references missing node `ghost`"
        );
        assert_eq!(
            LayoutError::EmptyGraph.to_string(),
            "nothing to lay out: the workflow has no nodes"
        );
    }
}
