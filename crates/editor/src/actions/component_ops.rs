//! Frames, geometry, path points, contact geometry and property edits

use glam::{DAffine3, DMat3, DQuat, DVec3};
use msk_model::{
    decompose_rigid_transform, fit_ellipsoid, fit_plane, fit_sphere, Component, ComponentKind, ComponentPath, Shape,
};

use super::{expect_kind, not_found, unique_child_name, ActionError, ActionResult, Edit};
use crate::property_edit::PropertyEdit;
use crate::state::UndoableModel;

const PLANE_HALF_LENGTHS: [f64; 3] = [0.2, 0.0005, 0.2];

impl UndoableModel {
    /// Add an identity offset frame as a child of a physical frame and
    /// select it
    pub fn add_offset_frame_to_physical_frame(&mut self, path: &ComponentPath) -> ActionResult<ComponentPath> {
        expect_kind(self.model(), path, "physical frame", ComponentKind::is_frame)?;
        let name = unique_child_name(
            self.model(),
            path,
            &format!("{}_offsetframe", path.component_name()),
        );
        let frame = Component::offset_frame(&name, path.clone(), [0.0; 3], [0.0; 3]);
        let frame_path = path.join(&name);

        self.apply_edit(&format!("add an offset frame to {}", path.component_name()), |model| {
            model.add_component(path, frame)?;
            Ok(Edit::new(format!("added {name}")).selecting(frame_path.clone()))
        })?;
        Ok(frame_path)
    }

    /// Attach decorative geometry to a physical frame
    pub fn attach_geometry_to_physical_frame(&mut self, path: &ComponentPath, shape: Shape) -> ActionResult<ComponentPath> {
        expect_kind(self.model(), path, "physical frame", ComponentKind::is_frame)?;
        let name = unique_child_name(self.model(), path, &format!("{}_geom_1", path.component_name()));
        let geometry = Component::geometry(&name, path.clone(), shape);
        let geometry_path = path.join(&name);

        self.apply_edit(&format!("attach geometry to {}", path.component_name()), |model| {
            model.add_component(path, geometry)?;
            Ok(Edit::new(format!("attached geometry to {}", path.component_name())).selecting(geometry_path.clone()))
        })?;
        Ok(geometry_path)
    }

    /// Scaled vertices of the mesh at `mesh_path` and the frame it hangs off
    fn mesh_points(&self, mesh_path: &ComponentPath) -> ActionResult<(Vec<DVec3>, ComponentPath)> {
        let component = self.model().find(mesh_path).ok_or_else(|| not_found(mesh_path))?;
        let ComponentKind::Geometry(geometry) = &component.kind else {
            return Err(ActionError::precondition(format!("{mesh_path}: not a mesh")));
        };
        let Some(points) = geometry.shape.scaled_vertices() else {
            return Err(ActionError::precondition(format!("{mesh_path}: not a mesh")));
        };
        Ok((points, geometry.frame.connectee().clone()))
    }

    /// Add `shape` on a new offset frame `fit_name` under `parent`, placed by
    /// `offset`, and select the frame
    fn add_fitted_shape(
        &mut self,
        context: &str,
        parent: ComponentPath,
        fit_name: &str,
        geom_name: &str,
        offset: DAffine3,
        shape: Shape,
    ) -> ActionResult<ComponentPath> {
        let name = unique_child_name(self.model(), &parent, fit_name);
        let frame_path = parent.join(&name);
        let (translation, orientation) = decompose_rigid_transform(&offset);
        let frame = Component::offset_frame(&name, parent.clone(), translation, orientation)
            .with_child(Component::geometry(geom_name, frame_path.clone(), shape));

        self.apply_edit(context, |model| {
            model.add_component(&parent, frame)?;
            Ok(Edit::new(format!("computed {fit_name}")).selecting(frame_path.clone()))
        })?;
        Ok(frame_path)
    }

    /// Fit a sphere to a mesh's vertices and add it, on its own offset
    /// frame, to the frame the mesh is attached to
    pub fn fit_sphere_to_mesh(&mut self, mesh_path: &ComponentPath) -> ActionResult<ComponentPath> {
        let (points, parent) = self.mesh_points(mesh_path)?;
        let fitted = fit_sphere(&points).ok_or_else(|| {
            ActionError::precondition(format!(
                "{mesh_path}: cannot fit a sphere to {} vertices",
                points.len()
            ))
        })?;
        self.add_fitted_shape(
            "fit a sphere to a mesh",
            parent,
            "sphere_fit",
            "sphere_geom",
            DAffine3::from_translation(fitted.origin),
            Shape::Sphere {
                radius: fitted.radius,
            },
        )
    }

    /// Fit an ellipsoid to a mesh. The offset frame's axes follow the
    /// ellipsoid's principal axes.
    pub fn fit_ellipsoid_to_mesh(&mut self, mesh_path: &ComponentPath) -> ActionResult<ComponentPath> {
        let (points, parent) = self.mesh_points(mesh_path)?;
        let fitted = fit_ellipsoid(&points).ok_or_else(|| {
            ActionError::precondition(format!("{mesh_path}: cannot fit an ellipsoid to these vertices"))
        })?;
        let [x, y, z] = fitted.axes;
        let rotation = DQuat::from_mat3(&DMat3::from_cols(x, y, z));
        self.add_fitted_shape(
            "fit an ellipsoid to a mesh",
            parent,
            "ellipsoid_fit",
            "ellipsoid_geom",
            DAffine3::from_rotation_translation(rotation, fitted.origin),
            Shape::Ellipsoid { radii: fitted.radii },
        )
    }

    /// Fit a plane to a mesh, shown as a thin brick whose short axis (+Y)
    /// lies along the plane normal
    pub fn fit_plane_to_mesh(&mut self, mesh_path: &ComponentPath) -> ActionResult<ComponentPath> {
        let (points, parent) = self.mesh_points(mesh_path)?;
        let fitted = fit_plane(&points).ok_or_else(|| {
            ActionError::precondition(format!("{mesh_path}: cannot fit a plane to these vertices"))
        })?;
        let rotation = DQuat::from_rotation_arc(DVec3::Y, fitted.normal);
        self.add_fitted_shape(
            "fit a plane to a mesh",
            parent,
            "plane_fit",
            "plane_geom",
            DAffine3::from_rotation_translation(rotation, fitted.origin),
            Shape::Brick {
                half_lengths: PLANE_HALF_LENGTHS,
            },
        )
    }

    /// Append a path point, fixed in `frame`, to a path actuator
    pub fn add_path_point(&mut self, actuator: &ComponentPath, frame: &ComponentPath) -> ActionResult<ComponentPath> {
        let owner = expect_kind(self.model(), actuator, "path actuator", |k| {
            matches!(k, ComponentKind::PathActuator(_))
        })?;
        let n = owner.children.iter().filter(|c| c.kind.is_station_like()).count();
        expect_kind(self.model(), frame, "physical frame", ComponentKind::is_frame)?;
        let name = unique_child_name(
            self.model(),
            actuator,
            &format!("{}_p{}", actuator.component_name(), n + 1),
        );
        let point = Component::path_point(&name, frame.clone(), [0.0; 3]);
        let point_path = actuator.join(&name);

        self.apply_edit(&format!("add a path point to {}", actuator.component_name()), |model| {
            model.add_component(actuator, point)?;
            Ok(Edit::new(format!("added path point to {}", actuator.component_name())).selecting(point_path.clone()))
        })?;
        Ok(point_path)
    }

    /// Make a contact force act on a contact geometry
    pub fn assign_contact_geometry(&mut self, force: &ComponentPath, geometry: &ComponentPath) -> ActionResult {
        let contact = expect_kind(self.model(), geometry, "contact geometry", |k| {
            matches!(k, ComponentKind::ContactGeometry(_))
        })?;
        let geometry_name = contact.name.clone();
        let existing = expect_kind(self.model(), force, "contact force", |k| {
            matches!(k, ComponentKind::HuntCrossleyForce(_))
        })?;
        if let ComponentKind::HuntCrossleyForce(h) = &existing.kind {
            if h.contact_geometry.contains(&geometry_name) {
                return Err(ActionError::precondition(format!(
                    "{force} already acts on {geometry_name}"
                )));
            }
        }

        self.apply_edit(&format!("assign contact geometry to {}", force.component_name()), |model| {
            let component = model.find_mut(force).ok_or_else(|| not_found(force))?;
            if let ComponentKind::HuntCrossleyForce(h) = &mut component.kind {
                h.contact_geometry.push(geometry_name);
            }
            Ok(Edit::new("added contact geometry"))
        })
    }

    /// Apply a pending property edit and commit
    pub fn apply_property_edit(&mut self, edit: &PropertyEdit) -> ActionResult {
        let path = &edit.component_path;
        let new_value = edit
            .preview(self.model())
            .ok_or_else(|| {
                ActionError::precondition(format!("{path}: no property named '{}'", edit.property_name))
            })?
            .map_err(|e| ActionError::precondition(format!("{path}: {e}")))?;
        let message = format!("set {} to {}", edit.property_name, new_value);

        self.apply_edit(&format!("set {}'s {}", path.component_name(), edit.property_name), |model| {
            model.set_property(path, &edit.property_name, &new_value)?;
            Ok(Edit::new(message))
        })
    }
}
