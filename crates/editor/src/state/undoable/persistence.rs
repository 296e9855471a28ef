//! Backing-file tracking and autosave

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use msk_model::{io, Model, ModelError};
use tracing::{info, warn};

use super::UndoableModel;

impl UndoableModel {
    /// True if the current head is the commit last loaded from or saved to disk
    pub fn is_up_to_date_with_filesystem(&self) -> bool {
        self.saved_commit == Some(self.graph.current_head())
    }

    /// Record that the current head now matches the backing file, last
    /// written at `version`
    pub fn set_up_to_date_with_filesystem(&mut self, version: DateTime<Utc>) {
        self.saved_commit = Some(self.graph.current_head());
        self.scratch.set_backing_file_version(Some(version));
    }

    /// Write the scratch model to `path` and make it the backing file
    pub(crate) fn write_backing_file(&mut self, path: &Path) -> Result<(), ModelError> {
        io::save_model(self.scratch.model(), path)?;
        let written = io::last_write_time(path).map(DateTime::<Utc>::from)?;
        self.scratch.set_backing_file_path(Some(path.to_path_buf()));
        self.set_up_to_date_with_filesystem(written);
        Ok(())
    }

    fn autosave_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "msk", "msk-editor")
            .map(|dirs| dirs.data_dir().join("autosave.json"))
    }

    /// Save the scratch model to the autosave file
    pub fn autosave(&self) {
        if let Some(path) = Self::autosave_path() {
            self.autosave_to(&path);
        }
    }

    pub fn autosave_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("cannot create autosave directory {}: {e}", parent.display());
                return;
            }
        }
        match io::save_model(self.scratch.model(), path) {
            Ok(()) => info!("autosaved to {}", path.display()),
            Err(e) => warn!("autosave failed: {e}"),
        }
    }

    /// Model from the autosave file, if one exists and parses
    pub fn load_autosave() -> Option<Model> {
        let path = Self::autosave_path()?;
        Self::load_autosave_from(&path)
    }

    pub fn load_autosave_from(path: &Path) -> Option<Model> {
        let mut model = io::load_model(path).ok()?;
        // an autosave is not the user's file
        model.set_input_file(None);
        Some(model)
    }

    pub fn has_autosave() -> bool {
        Self::autosave_path().map(|p| p.exists()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_autosave_roundtrip_has_no_backing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("autosave.json");
        let m = fixtures::undoable_pendulum();
        m.autosave_to(&path);

        let model = UndoableModel::load_autosave_from(&path).unwrap();
        assert!(model.input_file().is_none());
        assert!(model.contains(&"/bodyset/arm".into()));
    }

    #[test]
    fn test_writing_backing_file_marks_head_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut m = fixtures::undoable_pendulum();
        assert!(!m.is_up_to_date_with_filesystem());

        m.write_backing_file(&path).unwrap();
        assert!(m.is_up_to_date_with_filesystem());
        assert_eq!(m.document().backing_file_path(), Some(path.as_path()));
        assert!(m.document().backing_file_version().is_some());

        m.upd_model().display.show_frames = true;
        m.commit("edit").unwrap();
        assert!(!m.is_up_to_date_with_filesystem());
        assert!(m.do_undo());
        assert!(m.is_up_to_date_with_filesystem());
    }
}
