//! Joint edits: type changes, offset frames, rezeroing and socket reassignment

use msk_model::component::default_coordinates;
use msk_model::{
    decompose_rigid_transform, rigid_transform, Component, ComponentKind, ComponentPath, JointType,
};
use tracing::info;

use super::{expect_kind, not_found, unique_child_name, ActionError, ActionResult, Edit};
use crate::state::UndoableModel;

fn is_joint(kind: &ComponentKind) -> bool {
    matches!(kind, ComponentKind::Joint(_))
}

/// Which side of a joint an offset frame is inserted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JointSide {
    Parent,
    Child,
}

impl JointSide {
    fn socket(&self) -> &'static str {
        match self {
            JointSide::Parent => "parent_frame",
            JointSide::Child => "child_frame",
        }
    }
}

impl UndoableModel {
    /// Swap a joint's type, replacing its coordinates with fresh ones
    pub fn change_joint_type(&mut self, path: &ComponentPath, joint_type: JointType) -> ActionResult {
        let joint = expect_kind(self.model(), path, "joint", is_joint)?;
        let old_class = joint.class_name();
        let name = joint.name.clone();
        if joint.as_joint().map(|j| j.joint_type) == Some(joint_type) {
            return Ok(());
        }
        let coordinates = default_coordinates(&name, joint_type);

        self.apply_edit(&format!("change the type of {name}"), |model| {
            let component = model.find_mut(path).ok_or_else(|| not_found(path))?;
            component.children.retain(|c| c.as_coordinate().is_none());
            component.children.extend(coordinates);
            if let Some(joint) = component.as_joint_mut() {
                joint.joint_type = joint_type;
            }
            Ok(Edit::new(format!("changed {old_class} to {}", joint_type.class_name())).selecting(path.clone()))
        })
    }

    pub fn add_parent_offset_frame_to_joint(&mut self, path: &ComponentPath) -> ActionResult<ComponentPath> {
        self.add_offset_frame_to_joint(path, JointSide::Parent)
    }

    pub fn add_child_offset_frame_to_joint(&mut self, path: &ComponentPath) -> ActionResult<ComponentPath> {
        self.add_offset_frame_to_joint(path, JointSide::Child)
    }

    /// Insert an identity offset frame between a joint and one of its frames
    fn add_offset_frame_to_joint(&mut self, path: &ComponentPath, side: JointSide) -> ActionResult<ComponentPath> {
        let joint = expect_kind(self.model(), path, "joint", is_joint)?;
        let current = joint
            .socket(side.socket())
            .map(|s| s.connectee().clone())
            .ok_or_else(|| not_found(path))?;
        let frame_name = unique_child_name(self.model(), path, &format!("{}_offset", current.component_name()));
        let frame = Component::offset_frame(&frame_name, current, [0.0; 3], [0.0; 3]);
        let frame_path = path.join(&frame_name);

        self.apply_edit(&format!("add an offset frame to {}", path.component_name()), |model| {
            let joint = model.find_mut(path).ok_or_else(|| not_found(path))?;
            joint.children.push(frame);
            if let Some(socket) = joint.socket_mut(side.socket()) {
                socket.connect(frame_path.clone());
            }
            Ok(Edit::new(format!("added {frame_name}")).selecting(frame_path.clone()))
        })?;
        Ok(frame_path)
    }

    /// A joint can be rezeroed when its parent side is an offset frame that
    /// can absorb the current coordinate values
    pub fn can_rezero_joint(&self, path: &ComponentPath) -> bool {
        let Some(joint) = self.model().find(path).and_then(|c| c.as_joint()) else {
            return false;
        };
        joint.joint_type.coordinate_count() > 0
            && self
                .model()
                .find(joint.parent_frame.connectee())
                .is_some_and(|f| f.as_offset_frame().is_some())
    }

    /// Bake the joint's current pose into its parent offset frame and set
    /// its coordinates to zero, so the model looks the same with the joint
    /// at zero
    pub fn rezero_joint(&mut self, path: &ComponentPath) -> ActionResult {
        if !self.can_rezero_joint(path) {
            return Err(ActionError::precondition(format!(
                "{path}: only joints with coordinates and a parent offset frame can be rezeroed"
            )));
        }
        let model = self.model();
        let Some(joint) = model.find(path).and_then(|c| c.as_joint()) else {
            return Err(not_found(path));
        };
        let joint_type = joint.joint_type;
        let parent_frame = joint.parent_frame.connectee().clone();
        let coordinates = model.joint_coordinate_paths(path);
        let q: Vec<f64> = coordinates
            .iter()
            .map(|c| self.state().coordinate_value(c).unwrap_or(0.0))
            .collect();
        let Some(offset) = model.find(&parent_frame).and_then(|c| c.as_offset_frame()) else {
            return Err(not_found(&parent_frame));
        };
        let baked = rigid_transform(offset.translation, offset.orientation) * joint_type.motion(&q);
        let (translation, orientation) = decompose_rigid_transform(&baked);

        self.apply_edit(&format!("rezero {}", path.component_name()), |model| {
            let frame = model
                .find_mut(&parent_frame)
                .and_then(|c| c.as_offset_frame_mut())
                .ok_or_else(|| not_found(&parent_frame))?;
            frame.translation = translation;
            frame.orientation = orientation;
            for coordinate in &coordinates {
                if let Some(c) = model.find_mut(coordinate).and_then(|c| c.as_coordinate_mut()) {
                    c.default_value = 0.0;
                }
            }
            Ok(Edit::new(format!("rezeroed {}", path.component_name())))
        })
    }

    /// Point a socket at a different component.
    ///
    /// A joint's child frame may never be ground; that is rejected here,
    /// with an explanation, before anything is changed.
    pub fn reassign_socket(&mut self, path: &ComponentPath, socket: &str, connectee: &ComponentPath) -> ActionResult {
        let component = self.model().find(path).ok_or_else(|| not_found(path))?;
        if component.socket(socket).is_none() {
            return Err(ActionError::precondition(format!("{path}: no socket named '{socket}'")));
        }
        let target = self
            .model()
            .find(connectee)
            .ok_or_else(|| ActionError::precondition(format!("{connectee}: cannot find the new connectee")))?;
        if socket == "child_frame" && matches!(target.kind, ComponentKind::Ground) {
            return Err(ActionError::precondition(
                "cannot assign a joint's child frame to ground: connect ground to the parent frame and reverse the joint instead",
            ));
        }

        self.apply_edit(&format!("reassign {path}'s {socket}"), |model| {
            let s = model
                .find_mut(path)
                .and_then(|c| c.socket_mut(socket))
                .ok_or_else(|| not_found(path))?;
            s.connect(connectee.clone());
            Ok(Edit::new("reassigned socket"))
        })?;
        info!("{path}: socket '{socket}' now connects to {connectee}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use glam::DVec3;

    #[test]
    fn test_change_joint_type_replaces_coordinates() {
        let mut m = fixtures::undoable_pendulum();
        let joint = fixtures::shoulder_joint();
        m.change_joint_type(&joint, JointType::Ball).unwrap();
        assert_eq!(m.model().joint_coordinate_paths(&joint).len(), 3);
        assert_eq!(m.latest_commit().unwrap().message(), "changed PinJoint to BallJoint");
    }

    #[test]
    fn test_change_joint_type_breaking_a_coupler_is_rolled_back() {
        let mut m = fixtures::undoable_double_pendulum();
        let err = m
            .change_joint_type(&"/jointset/elbow".into(), JointType::Weld)
            .unwrap_err();
        assert!(matches!(err, ActionError::Validation { .. }));
        assert_eq!(m.model().joint_coordinate_paths(&"/jointset/elbow".into()).len(), 1);
    }

    #[test]
    fn test_add_parent_offset_frame_rewires_joint() {
        let mut m = fixtures::undoable_pendulum();
        let joint = fixtures::shoulder_joint();
        let frame = m.add_parent_offset_frame_to_joint(&joint).unwrap();
        assert_eq!(frame.as_str(), "/jointset/shoulder/ground_offset");
        let socket = m.model().find(&joint).unwrap().socket("parent_frame").unwrap();
        assert_eq!(socket.connectee(), &frame);
        assert!(m.can_rezero_joint(&joint));
    }

    #[test]
    fn test_rezero_keeps_child_pose_and_zeroes_coordinates() {
        let mut m = fixtures::undoable_pendulum();
        let joint = fixtures::shoulder_joint();
        m.add_parent_offset_frame_to_joint(&joint).unwrap();
        m.set_coordinate_value_and_save(&fixtures::shoulder_coordinate(), 0.7).unwrap();

        let tip = "/markerset/tip".into();
        let before = m.model().station_in_ground(m.state(), &tip).unwrap();
        m.rezero_joint(&joint).unwrap();
        let after = m.model().station_in_ground(m.state(), &tip).unwrap();

        assert!((before - after).length() < 1e-9);
        assert!((after - DVec3::new(0.7f64.cos(), 0.7f64.sin(), 0.0)).length() < 1e-9);
        assert_eq!(m.state().coordinate_value(&fixtures::shoulder_coordinate()), Some(0.0));
    }

    #[test]
    fn test_rezero_requires_parent_offset_frame() {
        let mut m = fixtures::undoable_pendulum();
        assert!(!m.can_rezero_joint(&fixtures::shoulder_joint()));
        assert!(m.rezero_joint(&fixtures::shoulder_joint()).unwrap_err().is_precondition());
    }

    #[test]
    fn test_reassign_socket_to_ground_child_is_rejected_up_front() {
        let mut m = fixtures::undoable_pendulum();
        let version = m.document().model_version();
        let err = m
            .reassign_socket(&fixtures::shoulder_joint(), "child_frame", &"/ground".into())
            .unwrap_err();
        assert!(err.is_precondition());
        assert!(!err.to_string().is_empty());
        assert_eq!(m.document().model_version(), version);
    }

    #[test]
    fn test_reassign_socket_commits() {
        let mut m = fixtures::undoable_pendulum();
        m.reassign_socket(&"/markerset/tip".into(), "parent_frame", &"/ground".into())
            .unwrap();
        let marker = m.model().find(&"/markerset/tip".into()).unwrap();
        assert_eq!(marker.socket("parent_frame").unwrap().connectee().as_str(), "/ground");
        assert_eq!(m.latest_commit().unwrap().message(), "reassigned socket");
    }
}
