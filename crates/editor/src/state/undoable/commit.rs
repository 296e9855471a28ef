//! Immutable snapshots of a document

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::document::ModelDocument;
use crate::uid::Uid;

/// A frozen copy of a document plus a message and a link to its parent
#[derive(Debug, Clone)]
pub struct Commit {
    id: Uid,
    parent: Option<Uid>,
    timestamp: DateTime<Utc>,
    message: String,
    snapshot: Arc<ModelDocument>,
}

impl Commit {
    /// Snapshot `document`. The caller guarantees it is finalized.
    pub fn new(parent: Option<Uid>, message: impl Into<String>, document: &ModelDocument) -> Self {
        Self {
            id: Uid::new(),
            parent,
            timestamp: Utc::now(),
            message: message.into(),
            snapshot: Arc::new(document.clone()),
        }
    }

    pub fn id(&self) -> Uid {
        self.id
    }

    /// `None` for a root commit
    pub fn parent(&self) -> Option<Uid> {
        self.parent
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn snapshot(&self) -> &ModelDocument {
        &self.snapshot
    }

    /// A shared handle to the snapshot that outlives the history
    pub fn shared_snapshot(&self) -> Arc<ModelDocument> {
        Arc::clone(&self.snapshot)
    }

    pub fn summary(&self) -> CommitSummary {
        CommitSummary {
            id: self.id,
            parent: self.parent,
            timestamp: self.timestamp,
            message: self.message.clone(),
        }
    }
}

/// Serializable description of a commit, without its snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub id: Uid,
    pub parent: Option<Uid>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commits_get_distinct_ids() {
        let doc = ModelDocument::default();
        let root = Commit::new(None, "root", &doc);
        let child = Commit::new(Some(root.id()), "child", &doc);

        assert_ne!(root.id(), child.id());
        assert_eq!(root.parent(), None);
        assert_eq!(child.parent(), Some(root.id()));
        assert_eq!(child.message(), "child");
    }

    #[test]
    fn test_snapshot_is_detached_from_source() {
        let mut doc = ModelDocument::default();
        let commit = Commit::new(None, "root", &doc);
        doc.upd_model().display.show_frames = true;

        assert!(!commit.snapshot().model().display.show_frames);
        assert!(Arc::ptr_eq(&commit.shared_snapshot(), &commit.shared_snapshot()));
    }

    #[test]
    fn test_summary_serde_roundtrip() {
        let doc = ModelDocument::default();
        let root = Commit::new(None, "root", &doc);
        let summary = Commit::new(Some(root.id()), "renamed arm", &doc).summary();

        let json = serde_json::to_string(&summary).unwrap();
        let back: CommitSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
        assert_eq!(back.parent, Some(root.id()));
    }
}
