//! Derived kinematic state of a model

use std::collections::BTreeMap;

use glam::{DAffine3, DVec3};

use crate::ComponentPath;

/// Working value of a single coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateState {
    pub value: f64,
    pub speed: f64,
    pub locked: bool,
}

/// Coordinate values and the resulting frame poses.
///
/// Produced by [`crate::Model::initialize_state`]. Frame poses are only
/// meaningful after [`crate::Model::realize_positions`] has run against the
/// current coordinate values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub(crate) coordinates: BTreeMap<ComponentPath, CoordinateState>,
    pub(crate) frames: BTreeMap<ComponentPath, DAffine3>,
}

impl State {
    pub fn coordinate(&self, path: &ComponentPath) -> Option<&CoordinateState> {
        self.coordinates.get(path)
    }

    pub fn coordinate_mut(&mut self, path: &ComponentPath) -> Option<&mut CoordinateState> {
        self.coordinates.get_mut(path)
    }

    pub fn coordinate_value(&self, path: &ComponentPath) -> Option<f64> {
        self.coordinates.get(path).map(|c| c.value)
    }

    pub fn coordinates(&self) -> impl Iterator<Item = (&ComponentPath, &CoordinateState)> {
        self.coordinates.iter()
    }

    /// Pose of a frame (ground, body or offset frame) in ground
    pub fn frame_in_ground(&self, path: &ComponentPath) -> Option<DAffine3> {
        self.frames.get(path).copied()
    }

    /// Location of a frame's origin in ground
    pub fn frame_origin(&self, path: &ComponentPath) -> Option<DVec3> {
        self.frame_in_ground(path).map(|t| t.translation)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}
