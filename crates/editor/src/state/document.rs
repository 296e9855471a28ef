//! The editable document: a model, its derived state, and session metadata

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use msk_model::{Component, ComponentPath, Model, ModelError, State};
use tracing::{debug, error};

use super::selection::SelectionState;
use crate::uid::Uid;

/// Where the document lives on disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackingFile {
    pub path: Option<PathBuf>,
    /// Modification time of `path` when it was last loaded or saved
    pub version: Option<DateTime<Utc>>,
}

/// A model paired with the state derived from it.
///
/// `model_version` changes whenever mutable access to the model is handed
/// out. `state_version` records which model version the state was derived
/// from, so the document is dirty exactly when the two differ.
#[derive(Debug, Clone)]
pub struct ModelDocument {
    model: Model,
    state: State,
    model_version: Uid,
    state_version: Uid,
    scale_factor: f32,
    selection: SelectionState,
    backing_file: BackingFile,
}

impl Default for ModelDocument {
    fn default() -> Self {
        let mut doc = Self::dirty(Model::default());
        if let Err(e) = doc.update_if_dirty() {
            error!("a blank model failed to initialize: {e}");
        }
        doc
    }
}

impl ModelDocument {
    fn dirty(model: Model) -> Self {
        let backing_file = BackingFile {
            path: model.input_file().map(Path::to_path_buf),
            version: model
                .input_file()
                .and_then(|p| msk_model::io::last_write_time(p).ok())
                .map(DateTime::<Utc>::from),
        };
        Self {
            model,
            state: State::default(),
            model_version: Uid::new(),
            state_version: Uid::new(),
            scale_factor: 1.0,
            selection: SelectionState::default(),
            backing_file,
        }
    }

    /// Wrap an existing model, finalizing it immediately.
    ///
    /// A model loaded from disk has its input file recorded as the
    /// document's backing file.
    pub fn from_model(model: Model) -> Result<Self, ModelError> {
        let mut doc = Self::dirty(model);
        doc.update_if_dirty()?;
        Ok(doc)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Mutable access to the model. Marks the document dirty.
    pub fn upd_model(&mut self) -> &mut Model {
        self.model_version = Uid::new();
        &mut self.model
    }

    /// The derived state. Only consistent with the model after
    /// [`Self::update_if_dirty`] has succeeded since the last edit.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Mutable access to both halves for edits that keep them consistent
    /// by hand (e.g. dragging a coordinate). The document stays clean.
    pub fn upd_model_and_state(&mut self) -> (&mut Model, &mut State) {
        let version = Uid::new();
        self.model_version = version;
        self.state_version = version;
        (&mut self.model, &mut self.state)
    }

    pub fn is_dirty(&self) -> bool {
        self.model_version != self.state_version
    }

    /// Finalize connections, initialize the model, then re-derive the state.
    ///
    /// Does nothing if the document is clean. On error the document stays
    /// dirty and must be rolled back by the caller.
    pub fn update_if_dirty(&mut self) -> Result<(), ModelError> {
        if !self.is_dirty() {
            return Ok(());
        }
        self.model.finalize_connections()?;
        self.model.initialize_model()?;
        self.state = self.model.initialize_state()?;
        self.state_version = self.model_version;
        debug!(version = %self.model_version, "document re-derived");
        Ok(())
    }

    /// Replace the model wholesale
    pub fn set_model(&mut self, model: Model) {
        if let Some(path) = model.input_file() {
            self.backing_file.path = Some(path.to_path_buf());
        }
        self.model = model;
        self.model_version = Uid::new();
    }

    pub fn model_version(&self) -> Uid {
        self.model_version
    }

    pub fn state_version(&self) -> Uid {
        self.state_version
    }

    /// Restore a previously observed model version, used when an edit is
    /// abandoned before it touched anything
    pub fn set_model_version(&mut self, version: Uid) {
        self.model_version = version;
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    pub fn selected(&self) -> Option<&ComponentPath> {
        self.selection.selected()
    }

    pub fn set_selected(&mut self, path: Option<ComponentPath>) {
        self.selection.select(path);
    }

    pub fn hovered(&self) -> Option<&ComponentPath> {
        self.selection.hovered()
    }

    pub fn set_hovered(&mut self, path: Option<ComponentPath>) {
        self.selection.hover(path);
    }

    pub fn isolated(&self) -> Option<&ComponentPath> {
        self.selection.isolated()
    }

    pub fn set_isolated(&mut self, path: Option<ComponentPath>) {
        self.selection.isolate(path);
    }

    /// The selected component, if the selection still resolves
    pub fn selected_component(&self) -> Option<&Component> {
        self.selected().and_then(|p| self.model.find(p))
    }

    pub fn hovered_component(&self) -> Option<&Component> {
        self.hovered().and_then(|p| self.model.find(p))
    }

    pub fn isolated_component(&self) -> Option<&Component> {
        self.isolated().and_then(|p| self.model.find(p))
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        self.scale_factor = scale_factor;
    }

    pub fn backing_file(&self) -> &BackingFile {
        &self.backing_file
    }

    pub fn backing_file_path(&self) -> Option<&Path> {
        self.backing_file.path.as_deref()
    }

    pub fn set_backing_file_path(&mut self, path: Option<PathBuf>) {
        self.backing_file.path = path;
    }

    pub fn backing_file_version(&self) -> Option<DateTime<Utc>> {
        self.backing_file.version
    }

    pub fn set_backing_file_version(&mut self, version: Option<DateTime<Utc>>) {
        self.backing_file.version = version;
    }

    /// Display name: the backing file's stem, else the model name
    pub fn recommended_title(&self) -> String {
        self.backing_file_path()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.model.name.clone())
    }

    /// Copy everything that belongs to the editing session rather than to
    /// history: selection, hover, isolation, scale factor and backing file.
    pub(crate) fn carry_session_state_from(&mut self, live: &ModelDocument) {
        self.selection = live.selection.clone();
        self.scale_factor = live.scale_factor;
        self.backing_file = live.backing_file.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_default_document_is_clean() {
        let doc = ModelDocument::default();
        assert!(!doc.is_dirty());
        assert!(doc.model().is_initialized());
    }

    #[test]
    fn test_upd_model_marks_dirty_and_update_cleans() {
        let mut doc = ModelDocument::from_model(fixtures::pendulum_model()).unwrap();
        let before = doc.model_version();
        doc.upd_model();
        assert!(doc.is_dirty());
        assert_ne!(doc.model_version(), before);

        doc.update_if_dirty().unwrap();
        assert!(!doc.is_dirty());
        assert_eq!(doc.state_version(), doc.model_version());
    }

    #[test]
    fn test_restoring_version_restores_cleanliness() {
        let mut doc = ModelDocument::from_model(fixtures::pendulum_model()).unwrap();
        let before = doc.model_version();
        doc.upd_model();
        doc.set_model_version(before);
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_live_edit_keeps_document_clean() {
        let mut doc = ModelDocument::from_model(fixtures::pendulum_model()).unwrap();
        let before = doc.model_version();
        let (_, state) = doc.upd_model_and_state();
        state
            .coordinate_mut(&fixtures::shoulder_coordinate())
            .unwrap()
            .value = 0.3;
        assert!(!doc.is_dirty());
        assert_ne!(doc.model_version(), before);
    }

    #[test]
    fn test_failed_update_leaves_document_dirty() {
        let mut doc = ModelDocument::from_model(fixtures::pendulum_model()).unwrap();
        doc.upd_model()
            .find_mut(&"/bodyset/arm".into())
            .unwrap()
            .name
            .clear();
        assert!(doc.update_if_dirty().is_err());
        assert!(doc.is_dirty());
    }

    #[test]
    fn test_selection_resolves_against_live_model() {
        let mut doc = ModelDocument::from_model(fixtures::pendulum_model()).unwrap();
        doc.set_selected(Some("/bodyset/arm".into()));
        assert_eq!(doc.selected_component().unwrap().name, "arm");
        doc.set_selected(Some("/bodyset/gone".into()));
        assert!(doc.selected_component().is_none());
    }
}
