//! Coordinate edits
//!
//! Dragging a coordinate uses the live variants. They edit the working state,
//! re-assemble it and write the assembled values back into the model's
//! defaults, so model and state agree without a commit. The `_and_save`
//! variants then commit once.

use msk_model::{ComponentKind, ComponentPath, Model, State};

use super::{expect_kind, not_found, ActionError, ActionResult, Edit};
use crate::state::UndoableModel;

fn is_coordinate(kind: &ComponentKind) -> bool {
    matches!(kind, ComponentKind::Coordinate(_))
}

/// Copy every coordinate's working value and speed into its defaults
fn save_coordinate_defaults(model: &mut Model, state: &State) {
    for (path, working) in state.coordinates() {
        if let Some(c) = model.find_mut(path).and_then(|c| c.as_coordinate_mut()) {
            c.default_value = working.value;
            c.default_speed_value = working.speed;
            c.locked = working.locked;
        }
    }
}

impl UndoableModel {
    fn check_coordinate_value(&self, path: &ComponentPath, value: f64) -> ActionResult {
        let component = expect_kind(self.model(), path, "coordinate", is_coordinate)?;
        let Some(coordinate) = component.as_coordinate() else {
            return Err(not_found(path));
        };
        if !value.is_finite() || !coordinate.is_in_range(value) {
            let (lo, hi) = coordinate.ordered_range();
            return Err(ActionError::precondition(format!(
                "{path}: {value} is outside the coordinate's range [{lo}, {hi}]"
            )));
        }
        Ok(())
    }

    /// Edit the working state in place, re-assemble it and mirror every
    /// coordinate into the model defaults. On failure the document from
    /// before the edit is put back.
    fn live_coordinate_edit(
        &mut self,
        context: &str,
        path: &ComponentPath,
        edit: impl FnOnce(&mut msk_model::CoordinateState),
    ) -> ActionResult {
        if self.state().coordinate(path).is_none() {
            return Err(not_found(path));
        }
        let before = self.pre_edit_document();
        let (model, state) = self.upd_document().upd_model_and_state();
        if let Some(working) = state.coordinate_mut(path) {
            edit(working);
        }
        match model.assemble(state) {
            Ok(()) => {
                save_coordinate_defaults(model, state);
                Ok(())
            }
            Err(source) => {
                tracing::error!("error detected while trying to {context}: {source}");
                self.restore_pre_edit(before);
                Err(ActionError::Validation {
                    context: context.to_string(),
                    source,
                })
            }
        }
    }

    /// Set a coordinate's working value without committing
    pub fn set_coordinate_value(&mut self, path: &ComponentPath, value: f64) -> ActionResult {
        self.check_coordinate_value(path, value)?;
        self.live_coordinate_edit(&format!("set {}", path.component_name()), path, |c| c.value = value)
    }

    /// Set a coordinate's value and commit all working coordinate values as
    /// the model's defaults
    pub fn set_coordinate_value_and_save(&mut self, path: &ComponentPath, value: f64) -> ActionResult {
        self.set_coordinate_value(path, value)?;
        self.save_working_coordinates(format!("set {} to {:.3}", path.component_name(), value))
    }

    /// Set a coordinate's working speed without committing
    pub fn set_coordinate_speed(&mut self, path: &ComponentPath, speed: f64) -> ActionResult {
        expect_kind(self.model(), path, "coordinate", is_coordinate)?;
        if !speed.is_finite() {
            return Err(ActionError::precondition(format!("{path}: speed must be finite")));
        }
        self.live_coordinate_edit(&format!("set {}'s speed", path.component_name()), path, |c| {
            c.speed = speed
        })
    }

    pub fn set_coordinate_speed_and_save(&mut self, path: &ComponentPath, speed: f64) -> ActionResult {
        self.set_coordinate_speed(path, speed)?;
        self.save_working_coordinates(format!("set {}'s speed", path.component_name()))
    }

    /// Lock or unlock a coordinate and commit
    pub fn set_coordinate_locked_and_save(&mut self, path: &ComponentPath, locked: bool) -> ActionResult {
        expect_kind(self.model(), path, "coordinate", is_coordinate)?;
        let verb = if locked { "lock" } else { "unlock" };
        self.live_coordinate_edit(&format!("{verb} {}", path.component_name()), path, |c| c.locked = locked)?;
        self.save_working_coordinates(format!("{verb}ed {}", path.component_name()))
    }

    /// Write all working coordinate values into the model and commit
    fn save_working_coordinates(&mut self, message: String) -> ActionResult {
        let working = self.state().clone();
        self.apply_edit("save coordinate values", |model| {
            save_coordinate_defaults(model, &working);
            Ok(Edit::new(message))
        })
    }

    /// Set every coordinate to zero, or to the range bound nearest zero when
    /// zero is out of range, and commit
    pub fn zero_all_coordinates(&mut self) -> ActionResult {
        self.apply_edit("zero all coordinates", |model| {
            let paths: Vec<ComponentPath> = model.coordinates().into_iter().map(|(p, _)| p).collect();
            for path in paths {
                if let Some(c) = model.find_mut(&path).and_then(|c| c.as_coordinate_mut()) {
                    let (lo, hi) = c.ordered_range();
                    c.default_value = 0.0f64.clamp(lo, hi);
                }
            }
            Ok(Edit::new("zeroed all coordinates"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_out_of_range_value_is_rejected_not_clamped() {
        let mut m = fixtures::undoable_pendulum();
        let version = m.document().model_version();
        let err = m
            .set_coordinate_value(&fixtures::shoulder_coordinate(), 10.0)
            .unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(m.document().model_version(), version);
    }

    #[test]
    fn test_live_edit_does_not_commit() {
        let mut m = fixtures::undoable_pendulum();
        let commits = m.graph().len();
        m.set_coordinate_value(&fixtures::shoulder_coordinate(), 0.5).unwrap();
        assert_eq!(m.graph().len(), commits);
        assert_eq!(m.state().coordinate_value(&fixtures::shoulder_coordinate()), Some(0.5));
        assert!(!m.document().is_dirty());
    }

    #[test]
    fn test_zero_all_clamps_into_range() {
        let mut m = fixtures::undoable_pendulum();
        let coordinate = fixtures::shoulder_coordinate();
        m.upd_model()
            .find_mut(&coordinate)
            .unwrap()
            .as_coordinate_mut()
            .unwrap()
            .range = [0.5, 1.5];
        m.upd_model()
            .find_mut(&coordinate)
            .unwrap()
            .as_coordinate_mut()
            .unwrap()
            .default_value = 1.0;
        m.commit("narrow range").unwrap();

        m.zero_all_coordinates().unwrap();
        assert_eq!(m.state().coordinate_value(&coordinate), Some(0.5));
        assert_eq!(m.latest_commit().unwrap().message(), "zeroed all coordinates");
    }

    #[test]
    fn test_lock_and_save_commits_lock_state() {
        let mut m = fixtures::undoable_pendulum();
        let coordinate = fixtures::shoulder_coordinate();
        m.set_coordinate_locked_and_save(&coordinate, true).unwrap();
        let c = m.model().find(&coordinate).unwrap().as_coordinate().unwrap();
        assert!(c.locked);
        assert_eq!(m.latest_commit().unwrap().message(), "locked shoulder_rz");
    }

    #[test]
    fn test_speed_and_save_records_default_speed() {
        let mut m = fixtures::undoable_pendulum();
        let coordinate = fixtures::shoulder_coordinate();
        m.set_coordinate_speed_and_save(&coordinate, 2.5).unwrap();
        let c = m.model().find(&coordinate).unwrap().as_coordinate().unwrap();
        assert_eq!(c.default_speed_value, 2.5);
    }
}
