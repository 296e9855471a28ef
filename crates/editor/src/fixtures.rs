//! Small models shared by unit and integration tests

use msk_model::{Component, ComponentPath, JointType, Model, Shape, BODYSET, CONSTRAINTSET, JOINTSET, MARKERSET};

use crate::state::{HistoryLimits, UndoableModel};

fn add(model: &mut Model, set: &str, component: Component) {
    model
        .add_component(&Model::set_path(set), component)
        .expect("fixture component should be addable");
}

/// One body swinging about the ground's z axis, with a marker one unit out
/// along the body's x axis
pub fn pendulum_model() -> Model {
    let mut model = Model::new("pendulum");
    add(&mut model, BODYSET, Component::body("arm", 1.0, [0.5, 0.0, 0.0], [0.1; 3]));
    add(
        &mut model,
        JOINTSET,
        Component::joint("shoulder", JointType::Pin, "/ground", "/bodyset/arm"),
    );
    add(&mut model, MARKERSET, Component::marker("tip", "/bodyset/arm", [1.0, 0.0, 0.0]));
    model
}

/// [`pendulum_model`] plus a forearm hinged at the arm's tip. The elbow
/// follows the shoulder through a coupler constraint.
pub fn double_pendulum_model() -> Model {
    let mut model = pendulum_model();
    model.name = "double_pendulum".to_string();
    add(&mut model, BODYSET, Component::body("forearm", 0.5, [0.5, 0.0, 0.0], [0.05; 3]));
    add(
        &mut model,
        JOINTSET,
        Component::joint("elbow", JointType::Pin, "/jointset/elbow/arm_offset", "/bodyset/forearm")
            .with_child(Component::offset_frame("arm_offset", "/bodyset/arm", [1.0, 0.0, 0.0], [0.0; 3])),
    );
    add(
        &mut model,
        CONSTRAINTSET,
        Component::coupler_constraint("elbow_follows_shoulder", shoulder_coordinate(), elbow_coordinate(), 0.5, 0.0),
    );
    model
}

pub fn shoulder_joint() -> ComponentPath {
    ComponentPath::new("/jointset/shoulder")
}

pub fn shoulder_coordinate() -> ComponentPath {
    ComponentPath::new("/jointset/shoulder/shoulder_rz")
}

pub fn elbow_coordinate() -> ComponentPath {
    ComponentPath::new("/jointset/elbow/elbow_rz")
}

pub fn undoable_pendulum() -> UndoableModel {
    UndoableModel::from_model(pendulum_model(), HistoryLimits::default()).expect("pendulum should initialize")
}

pub fn undoable_double_pendulum() -> UndoableModel {
    UndoableModel::from_model(double_pendulum_model(), HistoryLimits::default())
        .expect("double pendulum should initialize")
}

/// A mesh whose vertices lie on a sphere
pub fn sphere_mesh(center: [f64; 3], radius: f64) -> Shape {
    let mut vertices = Vec::new();
    for i in 0..8 {
        for j in 1..8 {
            let theta = f64::from(i) * std::f64::consts::TAU / 8.0;
            let phi = f64::from(j) * std::f64::consts::PI / 8.0;
            vertices.push([
                center[0] + radius * phi.sin() * theta.cos(),
                center[1] + radius * phi.sin() * theta.sin(),
                center[2] + radius * phi.cos(),
            ]);
        }
    }
    Shape::Mesh {
        file: "sphere.obj".to_string(),
        scale_factors: [1.0; 3],
        vertices,
    }
}
