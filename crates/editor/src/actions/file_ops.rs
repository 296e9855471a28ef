//! New, open, save and reload

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use msk_model::{io, Model};
use tracing::info;

use super::{ActionError, ActionResult};
use crate::state::UndoableModel;

pub const MODEL_FILE_EXTENSION: &str = "json";

/// Asks the user for a file. Returning `None` means the user cancelled.
pub trait FilePrompt {
    fn prompt_open_path(&mut self, extension: &str) -> Option<PathBuf>;
    fn prompt_save_path(&mut self, extension: &str) -> Option<PathBuf>;
}

/// A prompt that always answers with the same path, or always cancels
#[derive(Debug, Clone, Default)]
pub struct FixedPath(pub Option<PathBuf>);

impl FilePrompt for FixedPath {
    fn prompt_open_path(&mut self, _extension: &str) -> Option<PathBuf> {
        self.0.clone()
    }

    fn prompt_save_path(&mut self, _extension: &str) -> Option<PathBuf> {
        self.0.clone()
    }
}

fn file_error(verb: &str, path: &Path, e: impl std::fmt::Display) -> ActionError {
    ActionError::File(format!("cannot {verb} {}: {e}", path.display()))
}

fn modified_time(path: &Path) -> ActionResult<DateTime<Utc>> {
    io::last_write_time(path)
        .map(DateTime::<Utc>::from)
        .map_err(|e| file_error("read the modification time of", path, e))
}

impl UndoableModel {
    /// Swap in a whole new model and commit it. On failure the previous
    /// model, selection and backing file are kept.
    fn replace_model(&mut self, model: Model, message: String, keep_selection: bool) -> ActionResult {
        let previous_file = self.document().backing_file().clone();
        let previous_selection = self.document().selection().clone();

        let doc = self.upd_document();
        doc.set_model(model);
        if !keep_selection {
            doc.selection_mut().clear();
            doc.set_isolated(None);
        }

        if let Err(source) = self.commit(message.clone()) {
            let doc = self.upd_document();
            doc.set_backing_file_path(previous_file.path);
            doc.set_backing_file_version(previous_file.version);
            *doc.selection_mut() = previous_selection;
            return Err(ActionError::Validation {
                context: message,
                source,
            });
        }

        let doc = self.upd_document();
        let stale = |p: Option<&msk_model::ComponentPath>| p.is_some_and(|p| !doc.model().contains(p));
        let (selected, hovered, isolated) = (stale(doc.selected()), stale(doc.hovered()), stale(doc.isolated()));
        if selected {
            doc.set_selected(None);
        }
        if hovered {
            doc.set_hovered(None);
        }
        if isolated {
            doc.set_isolated(None);
        }
        Ok(())
    }

    /// Replace the document with a blank model that has no backing file
    pub fn new_model(&mut self) -> ActionResult {
        let previous = self.document().backing_file().clone();
        self.upd_document().set_backing_file_path(None);
        self.upd_document().set_backing_file_version(None);
        let result = self.replace_model(Model::default(), "created a new model".to_string(), false);
        if result.is_err() {
            self.upd_document().set_backing_file_path(previous.path);
            self.upd_document().set_backing_file_version(previous.version);
        }
        result
    }

    /// Load `path` into this document as a new commit and make it the
    /// backing file
    pub fn load_model_file(&mut self, path: &Path) -> ActionResult {
        let model = io::load_model(path).map_err(|e| file_error("load", path, e))?;
        let modified = modified_time(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.replace_model(model, format!("loaded {name}"), false)?;
        self.set_up_to_date_with_filesystem(modified);
        info!("loaded {}", path.display());
        Ok(())
    }

    /// Prompt for a model file and load it. `Ok(false)` if the user cancelled.
    pub fn open_model(&mut self, prompt: &mut dyn FilePrompt) -> ActionResult<bool> {
        let Some(path) = prompt.prompt_open_path(MODEL_FILE_EXTENSION) else {
            return Ok(false);
        };
        self.load_model_file(&path)?;
        Ok(true)
    }

    /// Save to the backing file, prompting for one if there is none.
    /// `Ok(false)` if the user cancelled.
    pub fn save_model(&mut self, prompt: &mut dyn FilePrompt) -> ActionResult<bool> {
        match self.document().backing_file_path().map(Path::to_path_buf) {
            Some(path) => self.save_to(&path).map(|()| true),
            None => self.save_model_as(prompt),
        }
    }

    /// Prompt for a path and save there, making it the backing file
    pub fn save_model_as(&mut self, prompt: &mut dyn FilePrompt) -> ActionResult<bool> {
        let Some(mut path) = prompt.prompt_save_path(MODEL_FILE_EXTENSION) else {
            return Ok(false);
        };
        if path.extension().is_none() {
            path.set_extension(MODEL_FILE_EXTENSION);
        }
        self.save_to(&path)?;
        Ok(true)
    }

    fn save_to(&mut self, path: &Path) -> ActionResult {
        self.write_backing_file(path)
            .map_err(|e| file_error("save", path, e))?;
        info!("saved {}", path.display());
        Ok(())
    }

    /// Reload the backing file if it changed on disk since it was last
    /// loaded or saved. `Ok(false)` if there was nothing to do.
    pub fn update_from_backing_file(&mut self) -> ActionResult<bool> {
        let Some(path) = self.document().backing_file_path().map(Path::to_path_buf) else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }
        let modified = modified_time(&path)?;
        if Some(modified) <= self.document().backing_file_version() {
            return Ok(false);
        }
        info!("{} changed on disk, reloading", path.display());
        self.reload_from(&path, modified)?;
        Ok(true)
    }

    /// Unconditionally reload the backing file
    pub fn reload_from_disk(&mut self) -> ActionResult {
        let Some(path) = self.document().backing_file_path().map(Path::to_path_buf) else {
            return Err(ActionError::precondition("the model has no backing file to reload"));
        };
        let modified = modified_time(&path)?;
        self.reload_from(&path, modified)
    }

    fn reload_from(&mut self, path: &Path, modified: DateTime<Utc>) -> ActionResult {
        let model = io::load_model(path).map_err(|e| file_error("reload", path, e))?;
        self.replace_model(model, "reloaded model".to_string(), true)?;
        self.set_up_to_date_with_filesystem(modified);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_new_model_forgets_backing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = fixtures::undoable_pendulum();
        m.save_model(&mut FixedPath(Some(dir.path().join("pendulum.json")))).unwrap();

        m.new_model().unwrap();
        assert!(m.document().backing_file_path().is_none());
        assert!(!m.model().contains(&"/bodyset/arm".into()));
        assert_eq!(m.latest_commit().unwrap().message(), "created a new model");
        assert!(m.can_undo());
    }

    #[test]
    fn test_cancelled_prompts_do_nothing() {
        let mut m = fixtures::undoable_pendulum();
        let head = m.latest_commit_id();
        assert!(!m.open_model(&mut FixedPath(None)).unwrap());
        assert!(!m.save_model(&mut FixedPath(None)).unwrap());
        assert_eq!(m.latest_commit_id(), head);
    }

    #[test]
    fn test_save_as_adds_extension_and_marks_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = fixtures::undoable_pendulum();
        assert!(!m.is_up_to_date_with_filesystem());
        m.save_model_as(&mut FixedPath(Some(dir.path().join("arm")))).unwrap();
        assert_eq!(m.document().backing_file_path(), Some(dir.path().join("arm.json").as_path()));
        assert!(m.is_up_to_date_with_filesystem());

        m.toggle_frames().unwrap();
        assert!(!m.is_up_to_date_with_filesystem());
    }

    #[test]
    fn test_loading_a_missing_file_leaves_document_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = fixtures::undoable_pendulum();
        let head = m.latest_commit_id();
        let err = m.load_model_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ActionError::File(_)));
        assert_eq!(m.latest_commit_id(), head);
        assert!(m.model().contains(&"/bodyset/arm".into()));
    }

    #[test]
    fn test_update_from_backing_file_is_noop_without_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = fixtures::undoable_pendulum();
        assert!(!m.update_from_backing_file().unwrap());
        m.save_model(&mut FixedPath(Some(dir.path().join("p.json")))).unwrap();
        assert!(!m.update_from_backing_file().unwrap());
    }

    #[test]
    fn test_reload_without_backing_file_is_rejected() {
        let mut m = fixtures::undoable_pendulum();
        assert!(m.reload_from_disk().unwrap_err().is_precondition());
    }
}
