//! Adding, renaming and deleting components

use msk_model::{Component, ComponentKind, ComponentPath, JointType, Model, Shape, BODYSET, JOINTSET};
use serde::{Deserialize, Serialize};

use super::{expect_kind, not_found, ActionError, ActionResult, Edit};
use crate::state::UndoableModel;

/// Everything needed to add a body and the joint that attaches it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDetails {
    pub body_name: String,
    /// Frame the new joint attaches the body to
    pub parent_frame: ComponentPath,
    pub joint_type: JointType,
    /// Empty means `<parent>_to_<body>`
    pub joint_name: String,
    pub mass: f64,
    pub center_of_mass: [f64; 3],
    pub inertia: [f64; 3],
    /// Put offset frames between the joint and both of its frames
    pub add_offset_frames: bool,
    pub geometry: Option<Shape>,
}

impl Default for BodyDetails {
    fn default() -> Self {
        Self {
            body_name: "new_body".to_string(),
            parent_frame: ComponentPath::new("/ground"),
            joint_type: JointType::Free,
            joint_name: String::new(),
            mass: 1.0,
            center_of_mass: [0.0; 3],
            inertia: [1.0, 1.0, 1.0],
            add_offset_frames: true,
            geometry: None,
        }
    }
}

impl BodyDetails {
    pub fn named(body_name: impl Into<String>) -> Self {
        Self {
            body_name: body_name.into(),
            ..Self::default()
        }
    }

    fn joint_name(&self) -> String {
        if self.joint_name.is_empty() {
            format!("{}_to_{}", self.parent_frame.component_name(), self.body_name)
        } else {
            self.joint_name.clone()
        }
    }

    /// Build the body and its joint without touching any model
    fn build(&self) -> (Component, Component) {
        let body_path = Model::set_path(BODYSET).join(&self.body_name);
        let joint_name = self.joint_name();
        let joint_path = Model::set_path(JOINTSET).join(&joint_name);

        let mut body = Component::body(&self.body_name, self.mass, self.center_of_mass, self.inertia);
        if let Some(shape) = &self.geometry {
            body = body.with_child(Component::geometry(
                format!("{}_geom_1", self.body_name),
                body_path.clone(),
                shape.clone(),
            ));
        }

        let joint = if self.add_offset_frames {
            let parent_offset = format!("{}_offset", self.parent_frame.component_name());
            let child_offset = format!("{}_offset", self.body_name);
            Component::joint(
                &joint_name,
                self.joint_type,
                joint_path.join(&parent_offset),
                joint_path.join(&child_offset),
            )
            .with_child(Component::offset_frame(parent_offset, self.parent_frame.clone(), [0.0; 3], [0.0; 3]))
            .with_child(Component::offset_frame(child_offset, body_path, [0.0; 3], [0.0; 3]))
        } else {
            Component::joint(&joint_name, self.joint_type, self.parent_frame.clone(), body_path)
        };
        (body, joint)
    }
}

/// The top-level set a component belongs in
fn natural_set(kind: &ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Body(_) => BODYSET,
        ComponentKind::Joint(_) => JOINTSET,
        ComponentKind::CoordinateCouplerConstraint(_) => msk_model::CONSTRAINTSET,
        ComponentKind::HuntCrossleyForce(_) | ComponentKind::PathActuator(_) => msk_model::FORCESET,
        ComponentKind::Marker(_) => msk_model::MARKERSET,
        _ => msk_model::COMPONENTSET,
    }
}

fn check_name(name: &str) -> ActionResult {
    if name.trim().is_empty() {
        return Err(ActionError::precondition("a component name cannot be empty"));
    }
    if name.contains('/') {
        return Err(ActionError::precondition(format!(
            "'{name}' is not a valid component name: it contains '/'"
        )));
    }
    Ok(())
}

impl UndoableModel {
    /// Add a body attached by a new joint to `details.parent_frame`, then
    /// select it. Returns the new body's path.
    pub fn add_body(&mut self, details: &BodyDetails) -> ActionResult<ComponentPath> {
        check_name(&details.body_name)?;
        check_name(&details.joint_name())?;
        expect_kind(self.model(), &details.parent_frame, "physical frame", ComponentKind::is_frame)?;

        let (body, joint) = details.build();
        let body_path = Model::set_path(BODYSET).join(&body.name);
        let context = format!("add {}", details.body_name);

        self.apply_edit(&context, |model| {
            if !model.contains(&details.parent_frame) {
                return Err(not_found(&details.parent_frame));
            }
            let name = body.name.clone();
            model.add_component(&Model::set_path(BODYSET), body)?;
            model.add_component(&Model::set_path(JOINTSET), joint)?;
            Ok(Edit::new(format!("added {name}")).selecting(body_path.clone()))
        })?;
        Ok(body_path)
    }

    /// Insert a prototype component into the set it naturally belongs to
    /// and select it
    pub fn add_component(&mut self, component: Component) -> ActionResult<ComponentPath> {
        check_name(&component.name)?;
        let set = Model::set_path(natural_set(&component.kind));
        let path = set.join(&component.name);
        if self.model().contains(&path) {
            return Err(ActionError::precondition(format!("{path} already exists")));
        }
        let context = format!("add {}", component.name);

        self.apply_edit(&context, |model| {
            let name = component.name.clone();
            let added = model.add_component(&set, component)?;
            Ok(Edit::new(format!("added {name}")).selecting(added))
        })?;
        Ok(path)
    }

    /// Rename a component. Sockets that point at it follow the new name.
    pub fn set_component_name(&mut self, path: &ComponentPath, new_name: &str) -> ActionResult<ComponentPath> {
        check_name(new_name)?;
        let old_name = self
            .model()
            .find(path)
            .ok_or_else(|| not_found(path))?
            .name
            .clone();
        if path.depth() <= 1 {
            return Err(ActionError::precondition(format!("{path} cannot be renamed")));
        }
        let new_path = path.parent().unwrap_or_default().join(new_name);
        if old_name == new_name {
            return Ok(new_path);
        }

        self.apply_edit(&format!("rename {old_name}"), |model| {
            let component = model.find_mut(path).ok_or_else(|| not_found(path))?;
            component.name = new_name.to_string();
            Ok(Edit::new(format!("renamed {old_name} to {new_name}")).moving(path.clone(), new_path.clone()))
        })?;
        Ok(new_path)
    }

    /// Delete the selected component. Fails, leaving the model untouched,
    /// if anything still refers to it.
    pub fn delete_selected(&mut self) -> ActionResult {
        let path = self
            .document()
            .selected()
            .cloned()
            .ok_or_else(|| ActionError::precondition("nothing is selected"))?;
        self.delete_component(&path)
    }

    pub fn delete_component(&mut self, path: &ComponentPath) -> ActionResult {
        let name = self.model().find(path).ok_or_else(|| not_found(path))?.name.clone();
        if path.depth() <= 1 {
            return Err(ActionError::precondition(format!("{path} cannot be deleted")));
        }

        self.apply_edit(&format!("delete {name}"), |model| {
            model.remove_component(path)?;
            Ok(Edit::new(format!("deleted {name}")))
        })?;

        let doc = self.upd_document();
        let dangling = |p: Option<&ComponentPath>| p.is_some_and(|p| p.starts_with(path));
        if dangling(doc.selected()) {
            doc.set_selected(None);
        }
        if dangling(doc.hovered()) {
            doc.set_hovered(None);
        }
        if dangling(doc.isolated()) {
            doc.set_isolated(None);
        }
        Ok(())
    }
}
