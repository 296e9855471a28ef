//! A model document with commit-based undo/redo
//!
//! [`UndoableModel`] owns one live scratch [`ModelDocument`] and a
//! [`CommitGraph`] of frozen snapshots. Edits are made to the scratch copy
//! and then either committed, which snapshots it, or rolled back, which
//! restores it from the current head.

mod commit;
mod graph;
mod history;
mod persistence;

pub use commit::{Commit, CommitSummary};
pub use graph::{CommitGraph, HistoryLimits};

use msk_model::{Model, ModelError, State};
use tracing::{error, info};

use crate::state::document::ModelDocument;
use crate::uid::Uid;

pub struct UndoableModel {
    scratch: ModelDocument,
    graph: CommitGraph,
    /// Commit that matches the backing file on disk
    saved_commit: Option<Uid>,
}

impl Default for UndoableModel {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoableModel {
    /// A blank model with default history limits
    pub fn new() -> Self {
        Self::from_document(ModelDocument::default(), HistoryLimits::default())
    }

    /// Wrap a model, finalizing it and committing it as the root
    pub fn from_model(model: Model, limits: HistoryLimits) -> Result<Self, ModelError> {
        let from_disk = model.input_file().is_some();
        let mut undoable = Self::from_document(ModelDocument::from_model(model)?, limits);
        if from_disk {
            undoable.saved_commit = Some(undoable.graph.current_head());
        }
        Ok(undoable)
    }

    /// Start history from an already finalized document
    pub fn from_document(document: ModelDocument, limits: HistoryLimits) -> Self {
        let root = Commit::new(None, "created a new model", &document);
        Self {
            scratch: document,
            graph: CommitGraph::new(root, limits),
            saved_commit: None,
        }
    }

    pub fn document(&self) -> &ModelDocument {
        &self.scratch
    }

    /// The live scratch document. Edits made through it are not part of
    /// history until [`Self::commit`] succeeds.
    pub fn upd_document(&mut self) -> &mut ModelDocument {
        &mut self.scratch
    }

    pub fn model(&self) -> &Model {
        self.scratch.model()
    }

    pub fn upd_model(&mut self) -> &mut Model {
        self.scratch.upd_model()
    }

    pub fn state(&self) -> &State {
        self.scratch.state()
    }

    pub fn update_if_dirty(&mut self) -> Result<(), ModelError> {
        self.scratch.update_if_dirty()
    }

    pub fn graph(&self) -> &CommitGraph {
        &self.graph
    }

    pub fn history_limits(&self) -> HistoryLimits {
        self.graph.limits()
    }

    pub fn set_history_limits(&mut self, limits: HistoryLimits) {
        self.graph.set_limits(limits);
    }

    /// Snapshot the scratch document as a child of the current head.
    ///
    /// The document is finalized first. If that fails the scratch document
    /// is rolled back and the error returned; history is untouched.
    pub fn commit(&mut self, message: impl Into<String>) -> Result<Uid, ModelError> {
        let message = message.into();
        if let Err(e) = self.scratch.update_if_dirty() {
            error!("error detected while trying to commit '{message}': {e}");
            self.rollback();
            return Err(e);
        }

        let commit = Commit::new(Some(self.graph.current_head()), message, &self.scratch);
        info!("commit: {}", commit.message());
        let id = self.graph.push(commit);
        if let Some(saved) = self.saved_commit {
            if !self.graph.contains(saved) {
                self.saved_commit = None;
            }
        }
        Ok(id)
    }

    /// The commit the scratch document derives from
    pub fn latest_commit(&self) -> Option<&Commit> {
        self.graph.head_commit()
    }

    pub fn latest_commit_id(&self) -> Uid {
        self.graph.current_head()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_new_model_has_root_commit_only() {
        let m = UndoableModel::new();
        assert_eq!(m.graph().len(), 1);
        assert!(!m.can_undo());
        assert!(!m.can_redo());
        assert_eq!(m.latest_commit().unwrap().message(), "created a new model");
    }

    #[test]
    fn test_commit_advances_both_heads() {
        let mut m = fixtures::undoable_pendulum();
        m.upd_model().display.show_frames = true;
        let id = m.commit("toggled").unwrap();
        assert_eq!(m.graph().current_head(), id);
        assert_eq!(m.graph().branch_head(), id);
        assert!(!m.document().is_dirty());
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let mut m = fixtures::undoable_pendulum();
        let head = m.latest_commit_id();
        let version = m.document().model_version();
        m.upd_model()
            .find_mut(&"/bodyset/arm".into())
            .unwrap()
            .name = "has/slash".into();

        assert!(m.commit("broken").is_err());
        assert_eq!(m.latest_commit_id(), head);
        assert_eq!(m.document().model_version(), version);
        assert!(m.model().find(&"/bodyset/arm".into()).is_some());
    }

    #[test]
    fn test_snapshot_is_independent_of_scratch() {
        let mut m = fixtures::undoable_pendulum();
        let snapshot = m.latest_commit().unwrap().shared_snapshot();
        m.upd_model().name = "changed".into();
        assert_ne!(snapshot.model().name, "changed");
    }
}
