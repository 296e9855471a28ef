//! Moving stations and offset frames

use msk_model::{decompose_rigid_transform, rigid_transform, ComponentKind, ComponentPath};

use super::{expect_kind, not_found, ActionError, ActionResult, Edit};
use crate::state::UndoableModel;

fn check_finite(path: &ComponentPath, what: &str, v: [f64; 3]) -> ActionResult {
    if v.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(ActionError::precondition(format!("{path}: {what} must be finite")))
    }
}

impl UndoableModel {
    /// Move a station, marker or path point by `delta`, expressed in its
    /// parent frame, without committing. Used while dragging.
    pub fn translate_station(&mut self, path: &ComponentPath, delta: [f64; 3]) -> ActionResult {
        expect_kind(self.model(), path, "station", ComponentKind::is_station_like)?;
        check_finite(path, "translation", delta)?;

        let before = self.pre_edit_document();
        let station = self
            .upd_model()
            .find_mut(path)
            .and_then(|c| c.as_station_mut())
            .ok_or_else(|| not_found(path))?;
        for (l, d) in station.location.iter_mut().zip(delta) {
            *l += d;
        }
        if let Err(source) = self.update_if_dirty() {
            return Err(self.abandon(&format!("translate {}", path.component_name()), source, before));
        }
        Ok(())
    }

    pub fn translate_station_and_save(&mut self, path: &ComponentPath, delta: [f64; 3]) -> ActionResult {
        self.translate_station(path, delta)?;
        self.commit(format!("translated {}", path.component_name()))
            .map_err(|source| ActionError::Validation {
                context: format!("translate {}", path.component_name()),
                source,
            })?;
        Ok(())
    }

    /// Move a path point within its frame without committing
    pub fn translate_path_point(&mut self, path: &ComponentPath, delta: [f64; 3]) -> ActionResult {
        expect_kind(self.model(), path, "path point", |k| matches!(k, ComponentKind::PathPoint(_)))?;
        self.translate_station(path, delta)
    }

    pub fn translate_path_point_and_save(&mut self, path: &ComponentPath, delta: [f64; 3]) -> ActionResult {
        expect_kind(self.model(), path, "path point", |k| matches!(k, ComponentKind::PathPoint(_)))?;
        self.translate_station_and_save(path, delta)
    }

    /// Translate an offset frame by `translation` and rotate it by the XYZ
    /// Euler angles `rotation`, both in its parent frame, and commit
    pub fn transform_offset_frame(
        &mut self,
        path: &ComponentPath,
        translation: [f64; 3],
        rotation: [f64; 3],
    ) -> ActionResult {
        let frame = expect_kind(self.model(), path, "offset frame", |k| {
            matches!(k, ComponentKind::OffsetFrame(_))
        })?;
        check_finite(path, "translation", translation)?;
        check_finite(path, "rotation", rotation)?;
        let Some(offset) = frame.as_offset_frame() else {
            return Err(not_found(path));
        };
        let moved = rigid_transform(translation, rotation) * rigid_transform(offset.translation, offset.orientation);
        let (new_translation, new_orientation) = decompose_rigid_transform(&moved);

        self.apply_edit(&format!("transform {}", path.component_name()), |model| {
            let frame = model
                .find_mut(path)
                .and_then(|c| c.as_offset_frame_mut())
                .ok_or_else(|| not_found(path))?;
            frame.translation = new_translation;
            frame.orientation = new_orientation;
            Ok(Edit::new(format!("transformed {}", path.component_name())))
        })
    }
}
