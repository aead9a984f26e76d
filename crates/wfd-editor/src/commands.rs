//! Undo/Redo command stack.
//!
//! Every undoable step stores a MessagePack snapshot of the workflow taken
//! before and after it, so undo/redo replaces the whole graph in a single
//! step (no per-mutation inverse chain).
//!
//! Pointer gestures use **batching**: the snapshot is captured at
//! pointer-down and compared at pointer-up, so a drag of fifty moves is
//! one undo step. A gesture that changed nothing pushes nothing.

use crate::error::DesignerError;
use wfd_core::document::WorkflowDocument;
use wfd_core::store::WorkflowStore;

/// Serialized store contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    pub fn capture(store: &WorkflowStore) -> Result<Self, DesignerError> {
        let doc = WorkflowDocument::from_store("", store);
        Ok(Self(rmp_serde::to_vec_named(&doc)?))
    }

    /// Replace the store's contents with this snapshot.
    pub fn restore(&self, store: &mut WorkflowStore) -> Result<(), DesignerError> {
        let doc: WorkflowDocument = rmp_serde::from_slice(&self.0)?;
        doc.load_into(store)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Command {
    before: Snapshot,
    after: Snapshot,
    pub description: String,
}

/// Manages undo/redo stacks with batch grouping for gestures.
#[derive(Debug)]
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Snapshot and description captured at the start of a batch.
    batch: Option<(Snapshot, String)>,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(128)),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            batch: None,
        }
    }

    /// Start a batch. Mutations until `end_batch()` are applied live but
    /// tracked as one undo step. A second `begin_batch` while one is open
    /// keeps the original snapshot.
    pub fn begin_batch(
        &mut self,
        store: &WorkflowStore,
        description: &str,
    ) -> Result<(), DesignerError> {
        if self.batch.is_none() {
            self.batch = Some((Snapshot::capture(store)?, description.to_string()));
        }
        Ok(())
    }

    /// Close the open batch. Returns whether an undo step was pushed.
    pub fn end_batch(&mut self, store: &WorkflowStore) -> Result<bool, DesignerError> {
        let Some((before, description)) = self.batch.take() else {
            return Ok(false);
        };
        let after = Snapshot::capture(store)?;
        Ok(self.push(before, after, description))
    }

    pub fn is_batching(&self) -> bool {
        self.batch.is_some()
    }

    /// Record a finished step. Identical snapshots are not recorded.
    pub fn push(&mut self, before: Snapshot, after: Snapshot, description: String) -> bool {
        if before == after {
            return false;
        }
        log::debug!("undo step: {description}");
        self.undo_stack.push(Command {
            before,
            after,
            description,
        });
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // New action invalidates redo.
        self.redo_stack.clear();
        true
    }

    /// Undo the last step. Returns its description, or `None` when there
    /// is nothing to undo.
    pub fn undo(&mut self, store: &mut WorkflowStore) -> Result<Option<String>, DesignerError> {
        let Some(cmd) = self.undo_stack.pop() else {
            return Ok(None);
        };
        if let Err(err) = cmd.before.restore(store) {
            self.undo_stack.push(cmd);
            return Err(err);
        }
        let description = cmd.description.clone();
        self.redo_stack.push(cmd);
        Ok(Some(description))
    }

    pub fn redo(&mut self, store: &mut WorkflowStore) -> Result<Option<String>, DesignerError> {
        let Some(cmd) = self.redo_stack.pop() else {
            return Ok(None);
        };
        if let Err(err) = cmd.after.restore(store) {
            self.redo_stack.push(cmd);
            return Err(err);
        }
        let description = cmd.description.clone();
        self.undo_stack.push(cmd);
        Ok(Some(description))
    }

    /// Drop all history (a different document was loaded).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch = None;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }
}
