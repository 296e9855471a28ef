//! Commit storage, head tracking and history garbage collection

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::commit::Commit;
use crate::uid::Uid;

/// How much history is retained on either side of the current head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLimits {
    pub max_undo: usize,
    pub max_redo: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            max_undo: 32,
            max_redo: 32,
        }
    }
}

/// Commits keyed by id, linked to their parents.
///
/// `current_head` is the commit the live document derives from.
/// `branch_head` is the newest commit reachable by redo; it is always
/// `current_head` or one of its descendants.
#[derive(Debug)]
pub struct CommitGraph {
    commits: HashMap<Uid, Commit>,
    current_head: Uid,
    branch_head: Uid,
    limits: HistoryLimits,
}

impl CommitGraph {
    /// A graph holding a single root commit
    pub fn new(root: Commit, limits: HistoryLimits) -> Self {
        let id = root.id();
        let mut commits = HashMap::new();
        commits.insert(id, root);
        Self {
            commits,
            current_head: id,
            branch_head: id,
            limits,
        }
    }

    pub fn current_head(&self) -> Uid {
        self.current_head
    }

    pub fn branch_head(&self) -> Uid {
        self.branch_head
    }

    pub fn limits(&self) -> HistoryLimits {
        self.limits
    }

    /// Change the limits and prune anything now outside them
    pub fn set_limits(&mut self, limits: HistoryLimits) {
        self.limits = limits;
        self.collect_garbage();
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn contains(&self, id: Uid) -> bool {
        self.commits.contains_key(&id)
    }

    pub fn get(&self, id: Uid) -> Option<&Commit> {
        self.commits.get(&id)
    }

    pub fn head_commit(&self) -> Option<&Commit> {
        self.commits.get(&self.current_head)
    }

    fn parent_of(&self, id: Uid) -> Option<Uid> {
        self.commits.get(&id).and_then(Commit::parent)
    }

    /// Number of parent hops from `from` back to `to`, `None` if `to` is
    /// not an ancestor of (or equal to) `from`
    pub fn distance(&self, from: Uid, to: Uid) -> Option<usize> {
        let mut current = from;
        let mut hops = 0;
        loop {
            if current == to {
                return Some(hops);
            }
            current = self.parent_of(current)?;
            hops += 1;
        }
    }

    /// The commit `n` parent hops behind `id`, if the chain is that long.
    /// The returned id may already have been pruned from the store.
    pub fn nth_ancestor(&self, id: Uid, n: usize) -> Option<Uid> {
        let mut current = id;
        for _ in 0..n {
            current = self.parent_of(current)?;
        }
        Some(current)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_target().is_some()
    }

    /// Parent of the current head, if it is still stored
    pub fn undo_target(&self) -> Option<Uid> {
        self.parent_of(self.current_head).filter(|p| self.contains(*p))
    }

    pub fn can_redo(&self) -> bool {
        self.redo_target().is_some()
    }

    /// The commit one step from the current head toward the branch head
    pub fn redo_target(&self) -> Option<Uid> {
        let distance = self.distance(self.branch_head, self.current_head)?;
        if distance == 0 {
            return None;
        }
        self.nth_ancestor(self.branch_head, distance - 1)
            .filter(|id| self.contains(*id))
    }

    /// Move the current head to any stored commit.
    ///
    /// A target off the current branch becomes the new branch head.
    pub fn set_current_head(&mut self, id: Uid) -> bool {
        if !self.contains(id) {
            return false;
        }
        if self.distance(self.branch_head, id).is_none() {
            self.branch_head = id;
        }
        self.current_head = id;
        true
    }

    /// Append a commit on top of the current head and make it both heads
    pub fn push(&mut self, commit: Commit) -> Uid {
        let id = commit.id();
        self.commits.insert(id, commit);
        self.current_head = id;
        self.branch_head = id;
        self.collect_garbage();
        id
    }

    /// Commits from the current head back to the oldest retained one
    pub fn history(&self) -> Vec<&Commit> {
        let mut out = Vec::new();
        let mut current = Some(self.current_head);
        while let Some(commit) = current.and_then(|id| self.commits.get(&id)) {
            out.push(commit);
            current = commit.parent();
        }
        out
    }

    /// Commits between the current head (exclusive) and the branch head
    /// (inclusive), newest first
    pub fn redo_stack(&self) -> Vec<&Commit> {
        let mut out = Vec::new();
        let mut current = Some(self.branch_head);
        while let Some(id) = current.filter(|id| *id != self.current_head) {
            let Some(commit) = self.commits.get(&id) else { break };
            out.push(commit);
            current = commit.parent();
        }
        out
    }

    pub fn collect_garbage(&mut self) {
        let before = self.commits.len();
        self.collect_beyond_max_undo();
        self.collect_beyond_max_redo();
        self.collect_unreachable();
        let pruned = before - self.commits.len();
        if pruned > 0 {
            debug!(pruned, retained = self.commits.len(), "history pruned");
        }
    }

    /// Remove everything from the `(max_undo + 1)`-th ancestor of the
    /// current head down to the root
    fn collect_beyond_max_undo(&mut self) {
        let mut next = self.nth_ancestor(self.current_head, self.limits.max_undo.saturating_add(1));
        while let Some(id) = next {
            next = self.commits.remove(&id).and_then(|c| c.parent());
        }
    }

    /// Drop the redo commits furthest from the current head until at most
    /// `max_redo` remain, pulling the branch head back
    fn collect_beyond_max_redo(&mut self) {
        let Some(distance) = self.distance(self.branch_head, self.current_head) else {
            return;
        };
        if distance <= self.limits.max_redo {
            return;
        }
        let deletions = distance - self.limits.max_redo;
        let Some(new_branch_head) = self.nth_ancestor(self.branch_head, deletions) else {
            return;
        };
        let mut next = Some(self.branch_head);
        while let Some(id) = next.filter(|id| *id != new_branch_head) {
            next = self.commits.remove(&id).and_then(|c| c.parent());
        }
        self.branch_head = new_branch_head;
    }

    /// Keep only the branch head and its ancestors
    fn collect_unreachable(&mut self) {
        let mut reachable = HashSet::new();
        let mut current = Some(self.branch_head);
        while let Some(id) = current.filter(|id| self.commits.contains_key(id)) {
            reachable.insert(id);
            current = self.parent_of(id);
        }
        self.commits.retain(|id, _| reachable.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::document::ModelDocument;

    fn graph_with(limits: HistoryLimits) -> (CommitGraph, ModelDocument) {
        let doc = ModelDocument::default();
        (CommitGraph::new(Commit::new(None, "root", &doc), limits), doc)
    }

    fn push(graph: &mut CommitGraph, doc: &ModelDocument, msg: &str) -> Uid {
        let commit = Commit::new(Some(graph.current_head()), msg, doc);
        graph.push(commit)
    }

    #[test]
    fn test_distance_and_ancestors() {
        let (mut g, doc) = graph_with(HistoryLimits::default());
        let root = g.current_head();
        let a = push(&mut g, &doc, "a");
        let b = push(&mut g, &doc, "b");
        assert_eq!(g.distance(b, root), Some(2));
        assert_eq!(g.distance(root, b), None);
        assert_eq!(g.nth_ancestor(b, 1), Some(a));
        assert_eq!(g.nth_ancestor(b, 3), None);
    }

    #[test]
    fn test_unbounded_limits_keep_everything() {
        let limits = HistoryLimits {
            max_undo: usize::MAX,
            max_redo: usize::MAX,
        };
        let (mut g, doc) = graph_with(limits);
        for i in 0..5 {
            push(&mut g, &doc, &format!("c{i}"));
        }
        assert_eq!(g.len(), 6);
        assert_eq!(g.history().len(), 6);
    }

    #[test]
    fn test_max_undo_prunes_old_commits() {
        let limits = HistoryLimits {
            max_undo: 3,
            max_redo: 3,
        };
        let (mut g, doc) = graph_with(limits);
        for i in 0..10 {
            push(&mut g, &doc, &format!("c{i}"));
        }
        // current head plus `max_undo` ancestors
        assert_eq!(g.len(), 4);
        assert_eq!(g.history().len(), 4);
    }

    #[test]
    fn test_commit_after_undo_discards_old_branch() {
        let (mut g, doc) = graph_with(HistoryLimits::default());
        let a = push(&mut g, &doc, "a");
        let b = push(&mut g, &doc, "b");
        assert!(g.set_current_head(a));
        assert_eq!(g.redo_target(), Some(b));

        let c = push(&mut g, &doc, "c");
        assert!(!g.contains(b));
        assert_eq!(g.branch_head(), c);
        assert!(!g.can_redo());
    }

    #[test]
    fn test_max_redo_pulls_branch_head_back() {
        let (mut g, doc) = graph_with(HistoryLimits::default());
        let root = g.current_head();
        let ids: Vec<Uid> = (0..6).map(|i| push(&mut g, &doc, &format!("c{i}"))).collect();
        g.set_current_head(root);

        g.set_limits(HistoryLimits {
            max_undo: 32,
            max_redo: 2,
        });
        assert_eq!(g.branch_head(), ids[1]);
        assert_eq!(g.redo_stack().len(), 2);
        assert!(!g.contains(ids[5]));
        assert_eq!(g.redo_target(), Some(ids[0]));
    }

    #[test]
    fn test_checkout_off_branch_moves_branch_head() {
        let (mut g, doc) = graph_with(HistoryLimits::default());
        let a = push(&mut g, &doc, "a");
        assert!(g.set_current_head(a));
        assert!(!g.set_current_head(Uid::new()));
        assert_eq!(g.current_head(), a);
    }

    #[test]
    fn test_redo_walks_toward_branch_head_one_step_at_a_time() {
        let (mut g, doc) = graph_with(HistoryLimits::default());
        let root = g.current_head();
        let a = push(&mut g, &doc, "a");
        let b = push(&mut g, &doc, "b");
        g.set_current_head(root);
        assert_eq!(g.redo_target(), Some(a));
        g.set_current_head(a);
        assert_eq!(g.redo_target(), Some(b));
        g.set_current_head(b);
        assert_eq!(g.redo_target(), None);
    }
}
