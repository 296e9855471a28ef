//! Visibility and session display state
//!
//! Visibility and the frame display hint live in the model and are
//! committed. Selection, hover, isolation and the scale factor are session
//! state on the scratch document and are never committed.

use glam::DVec3;
use msk_model::{ComponentKind, ComponentPath};
use tracing::debug;

use super::{not_found, ActionError, ActionResult, Edit};
use crate::state::UndoableModel;

const MAX_AUTOSCALE_STEPS: usize = 16;

impl UndoableModel {
    pub fn set_component_visibility(&mut self, path: &ComponentPath, visible: bool) -> ActionResult {
        let name = self.model().find(path).ok_or_else(|| not_found(path))?.name.clone();
        self.apply_edit(&format!("change {name}'s visibility"), |model| {
            model.find_mut(path).ok_or_else(|| not_found(path))?.visible = visible;
            Ok(Edit::new(format!("set {name} visibility to {visible}")))
        })
    }

    /// Hide everything except `path`, the containers above it and the
    /// components below it
    pub fn show_only_component(&mut self, path: &ComponentPath) -> ActionResult {
        let name = self.model().find(path).ok_or_else(|| not_found(path))?.name.clone();
        let paths: Vec<ComponentPath> = self.model().walk().into_iter().map(|(p, _)| p).collect();

        self.apply_edit(&format!("show only {name}"), |model| {
            for p in &paths {
                let visible = p.starts_with(path) || path.starts_with(p);
                if let Some(c) = model.find_mut(p) {
                    c.visible = visible;
                }
            }
            Ok(Edit::new(format!("showing only {name}")))
        })
    }

    pub fn toggle_frames(&mut self) -> ActionResult {
        let show = !self.model().display.show_frames;
        self.apply_edit("toggle frames", |model| {
            model.display.show_frames = show;
            Ok(Edit::new(if show { "shown frames" } else { "hidden frames" }))
        })
    }

    pub fn toggle_markers(&mut self) -> ActionResult {
        self.toggle_kind_visibility("markers", |k| matches!(k, ComponentKind::Marker(_)))
    }

    pub fn toggle_contact_geometry(&mut self) -> ActionResult {
        self.toggle_kind_visibility("contact geometry", |k| matches!(k, ComponentKind::ContactGeometry(_)))
    }

    pub fn toggle_forces(&mut self) -> ActionResult {
        self.toggle_kind_visibility("forces", |k| {
            matches!(k, ComponentKind::HuntCrossleyForce(_) | ComponentKind::PathActuator(_))
        })
    }

    /// Hide every component of one kind if any is visible, otherwise show
    /// them all
    fn toggle_kind_visibility(&mut self, what: &str, is_kind: fn(&ComponentKind) -> bool) -> ActionResult {
        let targets: Vec<(ComponentPath, bool)> = self
            .model()
            .walk()
            .into_iter()
            .filter(|(_, c)| is_kind(&c.kind))
            .map(|(p, c)| (p, c.visible))
            .collect();
        if targets.is_empty() {
            return Err(ActionError::precondition(format!("the model has no {what}")));
        }
        let show = !targets.iter().any(|(_, visible)| *visible);

        self.apply_edit(&format!("toggle {what}"), |model| {
            for (p, _) in &targets {
                if let Some(c) = model.find_mut(p) {
                    c.visible = show;
                }
            }
            let verb = if show { "shown" } else { "hidden" };
            Ok(Edit::new(format!("{verb} {what}")))
        })
    }

    pub fn set_selected(&mut self, path: Option<ComponentPath>) -> ActionResult {
        self.check_session_path(path.as_ref())?;
        self.upd_document().set_selected(path);
        Ok(())
    }

    pub fn set_hovered(&mut self, path: Option<ComponentPath>) -> ActionResult {
        self.check_session_path(path.as_ref())?;
        self.upd_document().set_hovered(path);
        Ok(())
    }

    /// Restrict the view to one subtree, or clear the restriction with `None`
    pub fn set_isolated(&mut self, path: Option<ComponentPath>) -> ActionResult {
        self.check_session_path(path.as_ref())?;
        self.upd_document().set_isolated(path);
        Ok(())
    }

    /// Clear selection and hover. Isolation is kept.
    pub fn clear_selection(&mut self) {
        self.upd_document().selection_mut().clear();
    }

    pub fn set_scale_factor(&mut self, scale_factor: f32) -> ActionResult {
        if !(scale_factor.is_finite() && scale_factor > 0.0) {
            return Err(ActionError::precondition(format!(
                "{scale_factor} is not a valid scale factor"
            )));
        }
        self.upd_document().set_scale_factor(scale_factor);
        Ok(())
    }

    /// Pick a scale factor from the longest dimension of the scene: start at
    /// one and divide by ten while the scene is less than a tenth of it
    pub fn autoscale_scale_factor(&mut self) -> f32 {
        let longest = self.scene_longest_dimension();
        let mut scale_factor = 1.0f32;
        if longest > 0.0 {
            for _ in 0..MAX_AUTOSCALE_STEPS {
                if longest >= 0.1 * f64::from(scale_factor) {
                    break;
                }
                scale_factor /= 10.0;
            }
        }
        debug!("autoscaled scale factor to {scale_factor} (scene is {longest:.4} long)");
        self.upd_document().set_scale_factor(scale_factor);
        scale_factor
    }

    fn check_session_path(&self, path: Option<&ComponentPath>) -> ActionResult {
        match path {
            Some(p) if !self.model().contains(p) => Err(not_found(p)),
            _ => Ok(()),
        }
    }

    /// Longest side of the box around every frame origin, station and
    /// piece of geometry
    fn scene_longest_dimension(&self) -> f64 {
        let model = self.model();
        let state = self.state();
        let mut points: Vec<DVec3> = Vec::new();

        for (path, component) in model.walk() {
            match &component.kind {
                k if k.is_frame() => points.extend(state.frame_origin(&path)),
                k if k.is_station_like() => points.extend(model.station_in_ground(state, &path)),
                ComponentKind::Geometry(g) => {
                    if let Some(origin) = state.frame_origin(g.frame.connectee()) {
                        let half = DVec3::splat(0.5 * g.shape.characteristic_size());
                        points.push(origin - half);
                        points.push(origin + half);
                    }
                }
                _ => {}
            }
        }

        let Some(first) = points.first().copied() else {
            return 0.0;
        };
        let (min, max) = points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        (max - min).max_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_visibility_is_committed() {
        let mut m = fixtures::undoable_pendulum();
        m.set_component_visibility(&"/bodyset/arm".into(), false).unwrap();
        assert!(!m.model().find(&"/bodyset/arm".into()).unwrap().visible);
        assert_eq!(m.latest_commit().unwrap().message(), "set arm visibility to false");
    }

    #[test]
    fn test_show_only_keeps_ancestors_and_descendants() {
        let mut m = fixtures::undoable_pendulum();
        m.show_only_component(&"/bodyset/arm".into()).unwrap();
        let visible = |p: &str| m.model().find(&p.into()).unwrap().visible;
        assert!(visible("/bodyset"));
        assert!(visible("/bodyset/arm"));
        assert!(!visible("/ground"));
        assert!(!visible("/markerset/tip"));
        assert_eq!(m.latest_commit().unwrap().message(), "showing only arm");
    }

    #[test]
    fn test_toggle_frames_alternates_message() {
        let mut m = fixtures::undoable_pendulum();
        m.toggle_frames().unwrap();
        assert_eq!(m.latest_commit().unwrap().message(), "shown frames");
        m.toggle_frames().unwrap();
        assert_eq!(m.latest_commit().unwrap().message(), "hidden frames");
    }

    #[test]
    fn test_toggle_markers_hides_then_shows() {
        let mut m = fixtures::undoable_pendulum();
        let tip: ComponentPath = "/markerset/tip".into();
        m.toggle_markers().unwrap();
        assert!(!m.model().find(&tip).unwrap().visible);
        assert_eq!(m.latest_commit().unwrap().message(), "hidden markers");

        m.toggle_markers().unwrap();
        assert!(m.model().find(&tip).unwrap().visible);
        assert_eq!(m.latest_commit().unwrap().message(), "shown markers");
    }

    #[test]
    fn test_toggle_without_targets_is_a_precondition() {
        let mut m = fixtures::undoable_pendulum();
        let head = m.latest_commit_id();
        assert!(m.toggle_forces().unwrap_err().is_precondition());
        assert!(m.toggle_contact_geometry().unwrap_err().is_precondition());
        assert_eq!(m.latest_commit_id(), head);
    }

    #[test]
    fn test_session_state_is_not_committed() {
        let mut m = fixtures::undoable_pendulum();
        let commits = m.graph().len();
        m.set_isolated(Some("/bodyset/arm".into())).unwrap();
        m.set_selected(Some("/markerset/tip".into())).unwrap();
        m.set_scale_factor(0.5).unwrap();
        assert_eq!(m.graph().len(), commits);
        assert!(!m.document().is_dirty());

        m.clear_selection();
        assert!(m.document().selected().is_none());
        assert_eq!(m.document().isolated().unwrap().as_str(), "/bodyset/arm");
    }

    #[test]
    fn test_isolating_a_missing_component_is_rejected() {
        let mut m = fixtures::undoable_pendulum();
        assert!(m.set_isolated(Some("/bodyset/nope".into())).unwrap_err().is_precondition());
        assert!(m.set_scale_factor(0.0).unwrap_err().is_precondition());
    }

    #[test]
    fn test_autoscale_shrinks_for_small_scenes() {
        let mut m = fixtures::undoable_pendulum();
        assert_eq!(m.autoscale_scale_factor(), 1.0);

        m.translate_station(&"/markerset/tip".into(), [-0.995, 0.0, 0.0]).unwrap();
        let sf = m.autoscale_scale_factor();
        assert!(sf < 0.1);
        assert_eq!(m.document().scale_factor(), sf);
    }
}
