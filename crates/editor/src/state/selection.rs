use msk_model::ComponentPath;

/// Selection, hover and isolation, stored as paths so they can be
/// re-resolved against whichever copy of the model is live.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    selected: Option<ComponentPath>,
    hovered: Option<ComponentPath>,
    isolated: Option<ComponentPath>,
}

impl SelectionState {
    pub fn selected(&self) -> Option<&ComponentPath> {
        self.selected.as_ref()
    }

    pub fn hovered(&self) -> Option<&ComponentPath> {
        self.hovered.as_ref()
    }

    pub fn isolated(&self) -> Option<&ComponentPath> {
        self.isolated.as_ref()
    }

    /// Check if a component is the selected one
    pub fn is_selected(&self, path: &ComponentPath) -> bool {
        self.selected.as_ref() == Some(path)
    }

    pub fn select(&mut self, path: Option<ComponentPath>) {
        self.selected = path;
    }

    pub fn hover(&mut self, path: Option<ComponentPath>) {
        self.hovered = path;
    }

    pub fn isolate(&mut self, path: Option<ComponentPath>) {
        self.isolated = path;
    }

    /// Clear selection and hover, keep isolation
    pub fn clear(&mut self) {
        self.selected = None;
        self.hovered = None;
    }

    /// Follow a component that moved from `old` to `new` (e.g. a rename).
    /// Paths beneath `old` are moved too.
    pub fn retarget(&mut self, old: &ComponentPath, new: &ComponentPath) {
        for slot in [&mut self.selected, &mut self.hovered, &mut self.isolated] {
            if let Some(moved) = slot.as_ref().and_then(|p| p.rebase(old, new)) {
                *slot = Some(moved);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_keeps_isolation() {
        let mut s = SelectionState::default();
        s.select(Some("/bodyset/femur".into()));
        s.hover(Some("/bodyset/tibia".into()));
        s.isolate(Some("/bodyset".into()));
        s.clear();
        assert!(s.selected().is_none());
        assert!(s.hovered().is_none());
        assert_eq!(s.isolated().unwrap().as_str(), "/bodyset");
    }

    #[test]
    fn test_retarget_follows_renamed_subtree() {
        let mut s = SelectionState::default();
        s.select(Some("/jointset/knee/knee_angle".into()));
        s.hover(Some("/bodyset/femur".into()));
        s.retarget(&"/jointset/knee".into(), &"/jointset/hinge".into());
        assert_eq!(s.selected().unwrap().as_str(), "/jointset/hinge/knee_angle");
        assert_eq!(s.hovered().unwrap().as_str(), "/bodyset/femur");
    }
}
