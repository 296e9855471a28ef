//! Undo/redo, rollback and checkout

use std::sync::Arc;

use tracing::{debug, warn};

use super::{CommitSummary, UndoableModel};
use crate::state::document::ModelDocument;
use crate::uid::Uid;

impl UndoableModel {
    pub fn can_undo(&self) -> bool {
        self.graph.can_undo()
    }

    /// Restore the parent of the current head, keeping session state
    pub fn do_undo(&mut self) -> bool {
        match self.graph.undo_target() {
            Some(target) => self.restore_keeping_session(target),
            None => false,
        }
    }

    pub fn can_redo(&self) -> bool {
        self.graph.can_redo()
    }

    /// Restore the next commit toward the branch head, keeping session state
    pub fn do_redo(&mut self) -> bool {
        match self.graph.redo_target() {
            Some(target) => self.restore_keeping_session(target),
            None => false,
        }
    }

    /// Move to any retained commit, keeping session state.
    ///
    /// Returns false if `id` is not in the history.
    pub fn try_checkout(&mut self, id: Uid) -> bool {
        if !self.graph.contains(id) {
            warn!("cannot check out {id}: not in history");
            return false;
        }
        self.restore_keeping_session(id)
    }

    /// Discard uncommitted edits by restoring the current head.
    ///
    /// Selection and hover are dropped because they may refer to whatever
    /// the failed edit created. Isolation, scale factor and backing file
    /// metadata are kept.
    pub fn rollback(&mut self) {
        let Some(head) = self.graph.head_commit() else {
            warn!("rollback requested but the current head is missing");
            return;
        };
        let mut restored = head.snapshot().clone();
        restored.carry_session_state_from(&self.scratch);
        restored.selection_mut().clear();
        self.scratch = restored;
        debug!("rolled back to {}", head.id());
    }

    /// Put back the document captured before a failed edit, keeping any
    /// uncommitted live edits it carried. Without one this is a plain
    /// [`Self::rollback`].
    pub(crate) fn restore_pre_edit(&mut self, before: Option<ModelDocument>) {
        match before {
            Some(doc) => {
                debug!("restored the document from before the failed edit");
                self.scratch = doc;
            }
            None => self.rollback(),
        }
    }

    fn restore_keeping_session(&mut self, id: Uid) -> bool {
        let Some(commit) = self.graph.get(id) else {
            return false;
        };
        let mut restored = commit.snapshot().clone();
        restored.carry_session_state_from(&self.scratch);
        debug!("checked out '{}'", commit.message());
        self.scratch = restored;
        self.graph.set_current_head(id)
    }

    /// Retained history from the current head back to the oldest commit
    pub fn commits(&self) -> Vec<CommitSummary> {
        self.graph.history().into_iter().map(|c| c.summary()).collect()
    }

    /// Commits that [`Self::do_redo`] would step through, newest first
    pub fn redo_commits(&self) -> Vec<CommitSummary> {
        self.graph.redo_stack().into_iter().map(|c| c.summary()).collect()
    }

    /// A shared, immutable copy of a commit's document for readers that
    /// must not touch the live history
    pub fn commit_snapshot(&self, id: Uid) -> Option<Arc<ModelDocument>> {
        self.graph.get(id).map(|c| c.shared_snapshot())
    }
}
