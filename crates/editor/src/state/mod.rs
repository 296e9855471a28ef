pub mod document;
pub mod selection;
pub mod settings;
pub mod undoable;

pub use document::{BackingFile, ModelDocument};
pub use selection::SelectionState;
pub use settings::{AutosaveSettings, EditorSettings};
pub use undoable::{Commit, CommitGraph, CommitSummary, HistoryLimits, UndoableModel};
