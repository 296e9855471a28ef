//! The editing action library
//!
//! Every action follows one template, implemented once in
//! [`UndoableModel::apply_edit`]:
//!
//! 1. check preconditions against the current document and build any new
//!    components up front,
//! 2. record the model version,
//! 3. re-resolve targets by path against the mutable model and edit it,
//! 4. finalize connections, initialize the model and re-derive the state,
//! 5. on success update the selection and commit,
//! 6. on failure restore the version (nothing was touched) or put back the
//!    document as it was before the edit.
//!
//! Actions never leave a half-applied edit behind. A failed action leaves the
//! model and the history exactly as they were, including a coordinate pose
//! that was dragged but not yet saved.

mod body_ops;
mod component_ops;
mod coordinate_ops;
mod display_ops;
mod file_ops;
mod joint_ops;
mod transform_ops;

pub use body_ops::BodyDetails;
pub use file_ops::{FilePrompt, FixedPath};

use msk_model::{ComponentKind, ComponentPath, Model, ModelError};
use thiserror::Error;
use tracing::{debug, error};

use crate::state::{ModelDocument, UndoableModel};

/// Why an action did not happen
#[derive(Debug, Error)]
pub enum ActionError {
    /// A check failed before anything was changed
    #[error("{0}")]
    Precondition(String),

    /// The edit produced an invalid model and was rolled back
    #[error("error detected while trying to {context}: {source}")]
    Validation {
        context: String,
        #[source]
        source: ModelError,
    },

    /// A file could not be read or written; the document is unchanged
    #[error("{0}")]
    File(String),
}

impl ActionError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        ActionError::Precondition(msg.into())
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, ActionError::Precondition(_))
    }
}

impl From<ModelError> for ActionError {
    fn from(source: ModelError) -> Self {
        ActionError::Validation {
            context: String::new(),
            source,
        }
    }
}

pub type ActionResult<T = ()> = Result<T, ActionError>;

/// Outcome of a successful edit closure
#[derive(Debug, Clone)]
pub(crate) struct Edit {
    message: String,
    select: Option<ComponentPath>,
    moved: Option<(ComponentPath, ComponentPath)>,
}

impl Edit {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            select: None,
            moved: None,
        }
    }

    /// Select this component once the edit is committed
    pub(crate) fn selecting(mut self, path: ComponentPath) -> Self {
        self.select = Some(path);
        self
    }

    /// A component moved from `old` to `new`; session paths follow it
    pub(crate) fn moving(mut self, old: ComponentPath, new: ComponentPath) -> Self {
        self.moved = Some((old, new));
        self
    }
}

pub(crate) fn not_found(path: &ComponentPath) -> ActionError {
    ActionError::precondition(format!("{path}: cannot find component"))
}

/// Resolve `path` to a component of the wanted kind or fail the precondition
pub(crate) fn expect_kind<'m>(
    model: &'m Model,
    path: &ComponentPath,
    what: &str,
    is_wanted: impl Fn(&ComponentKind) -> bool,
) -> ActionResult<&'m msk_model::Component> {
    let component = model.find(path).ok_or_else(|| not_found(path))?;
    if !is_wanted(&component.kind) {
        return Err(ActionError::precondition(format!(
            "{path}: expected a {what} but found a {}",
            component.class_name()
        )));
    }
    Ok(component)
}

/// First name in `base`, `base_1`, `base_2`, ... not taken by a child of `parent`
pub(crate) fn unique_child_name(model: &Model, parent: &ComponentPath, base: &str) -> String {
    if !model.contains(&parent.join(base)) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{base}_{i}"))
        .find(|candidate| !model.contains(&parent.join(candidate)))
        .unwrap_or_else(|| base.to_string())
}

impl UndoableModel {
    /// Run one edit through the action template.
    ///
    /// `edit` receives the mutable model and must re-resolve its targets by
    /// path. It may only return [`ActionError::Precondition`] before it has
    /// changed anything.
    pub(crate) fn apply_edit<F>(&mut self, context: &str, edit: F) -> ActionResult
    where
        F: FnOnce(&mut Model) -> ActionResult<Edit>,
    {
        let old_version = self.document().model_version();
        let before = self.pre_edit_document();

        let outcome = edit(self.upd_model());
        let edit = match outcome {
            Ok(edit) => edit,
            Err(ActionError::Precondition(msg)) => {
                self.upd_document().set_model_version(old_version);
                debug!("cannot {context}: {msg}");
                return Err(ActionError::Precondition(msg));
            }
            Err(ActionError::Validation { source, .. }) => return Err(self.abandon(context, source, before)),
            Err(other) => {
                error!("error detected while trying to {context}: {other}");
                self.restore_pre_edit(before);
                return Err(other);
            }
        };

        if let Err(source) = self.update_if_dirty() {
            return Err(self.abandon(context, source, before));
        }

        if let Some((old, new)) = &edit.moved {
            self.upd_document().selection_mut().retarget(old, new);
        }
        if let Some(path) = edit.select {
            self.upd_document().set_selected(Some(path));
        }
        self.commit(edit.message).map_err(|source| ActionError::Validation {
            context: context.to_string(),
            source,
        })?;
        Ok(())
    }

    /// A copy of the scratch document to restore if the next edit fails.
    /// `None` when it is dirty, in which case only a rollback is safe.
    pub(crate) fn pre_edit_document(&self) -> Option<ModelDocument> {
        let doc = self.document();
        (!doc.is_dirty()).then(|| doc.clone())
    }

    fn abandon(&mut self, context: &str, source: ModelError, before: Option<ModelDocument>) -> ActionError {
        error!("error detected while trying to {context}: {source}");
        self.restore_pre_edit(before);
        ActionError::Validation {
            context: context.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_precondition_failure_restores_version() {
        let mut m = fixtures::undoable_pendulum();
        let version = m.document().model_version();
        let err = m
            .apply_edit("do nothing", |_| Err(ActionError::precondition("nope")))
            .unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(m.document().model_version(), version);
        assert!(!m.document().is_dirty());
    }

    #[test]
    fn test_validation_failure_rolls_back_with_context() {
        let mut m = fixtures::undoable_pendulum();
        let head = m.latest_commit_id();
        let version = m.document().model_version();
        let err = m
            .apply_edit("break the model", |model| {
                model.remove_component(&"/bodyset/arm".into())?;
                Ok(Edit::new("removed arm"))
            })
            .unwrap_err();
        assert!(err.to_string().starts_with("error detected while trying to break the model"));
        assert_eq!(m.latest_commit_id(), head);
        assert_eq!(m.document().model_version(), version);
        assert!(m.model().contains(&"/bodyset/arm".into()));
    }

    #[test]
    fn test_failure_on_dirty_document_falls_back_to_head() {
        let mut m = fixtures::undoable_pendulum();
        m.upd_model().display.show_frames = true;
        assert!(m.pre_edit_document().is_none());

        m.apply_edit("break the model", |model| {
            model.remove_component(&"/bodyset/arm".into())?;
            Ok(Edit::new("removed arm"))
        })
        .unwrap_err();
        assert!(!m.model().display.show_frames);
        assert!(!m.document().is_dirty());
    }

    #[test]
    fn test_successful_edit_commits_once() {
        let mut m = fixtures::undoable_pendulum();
        let before = m.graph().len();
        m.apply_edit("show frames", |model| {
            model.display.show_frames = true;
            Ok(Edit::new("shown frames").selecting("/ground".into()))
        })
        .unwrap();
        assert_eq!(m.graph().len(), before + 1);
        assert_eq!(m.document().selected().unwrap().as_str(), "/ground");
        assert_eq!(m.latest_commit().unwrap().message(), "shown frames");
    }

    #[test]
    fn test_unique_child_name_skips_taken_names() {
        let model = fixtures::pendulum_model();
        let bodyset = Model::set_path(msk_model::BODYSET);
        assert_eq!(unique_child_name(&model, &bodyset, "leg"), "leg");
        assert_eq!(unique_child_name(&model, &bodyset, "arm"), "arm_1");
    }
}
