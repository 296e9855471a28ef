// Library crate: the undoable document, the action library and the command
// protocol. The stdin/stdout driver lives in the binary.

pub mod actions;
pub mod command;
pub mod fixtures;
pub mod property_edit;
pub mod state;
pub mod uid;

pub use actions::{ActionError, ActionResult, BodyDetails, FilePrompt, FixedPath};
pub use command::{execute_command, execute_json, execute_json_batch, CommandResponse, EditorCommand};
pub use property_edit::{ChangeError, PropertyChange, PropertyEdit};
pub use state::{
    BackingFile, Commit, CommitGraph, CommitSummary, EditorSettings, HistoryLimits, ModelDocument,
    SelectionState, UndoableModel,
};
pub use uid::Uid;
