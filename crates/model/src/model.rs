//! The model: a component tree plus finalize/initialize machinery
//!
//! Bringing a model into a usable state is a three step process that must run
//! in order:
//!
//! 1. [`Model::finalize_connections`] resolves every socket against the tree
//!    and binds it to the connectee's stable id (renames propagate here).
//! 2. [`Model::initialize_model`] validates names, properties, sockets and the
//!    kinematic tree.
//! 3. [`Model::initialize_state`] derives a [`State`] from coordinate defaults.
//!
//! Every step reports problems as a [`ModelError`].

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use glam::{DAffine3, DVec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::{Component, ComponentId, ComponentKind, Coordinate};
use crate::joint::{rigid_transform, JointType};
use crate::property::{PropertyError, PropertyValue};
use crate::socket::SocketTarget;
use crate::state::{CoordinateState, State};
use crate::{ComponentPath, ModelError};

pub const GROUND: &str = "ground";
pub const BODYSET: &str = "bodyset";
pub const JOINTSET: &str = "jointset";
pub const CONSTRAINTSET: &str = "constraintset";
pub const FORCESET: &str = "forceset";
pub const MARKERSET: &str = "markerset";
pub const COMPONENTSET: &str = "componentset";

const STANDARD_SETS: [&str; 6] = [BODYSET, JOINTSET, CONSTRAINTSET, FORCESET, MARKERSET, COMPONENTSET];

/// Longest offset-frame chain followed before it is declared cyclic
const MAX_FRAME_CHAIN: usize = 64;

/// Model-wide display toggles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayHints {
    #[serde(default)]
    pub show_frames: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    #[serde(default)]
    pub display: DisplayHints,
    #[serde(default)]
    components: Vec<Component>,
    #[serde(skip)]
    input_file: Option<PathBuf>,
    #[serde(skip)]
    initialized: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self::new("untitled")
    }
}

/// One joint resolved down to the bases of its two frames
#[derive(Debug, Clone)]
struct JointLink {
    path: ComponentPath,
    joint_type: JointType,
    parent_base: ComponentPath,
    parent_offset: DAffine3,
    child_base: ComponentPath,
    child_offset: DAffine3,
    coordinates: Vec<ComponentPath>,
}

/// What a socket may resolve to, captured before a mutable pass
#[derive(Debug, Clone, Copy)]
struct Resolved {
    id: ComponentId,
    is_frame: bool,
    is_coordinate: bool,
}

impl Resolved {
    fn satisfies(&self, target: SocketTarget) -> bool {
        match target {
            SocketTarget::Frame => self.is_frame,
            SocketTarget::Coordinate => self.is_coordinate,
        }
    }
}

fn walk<'a>(components: &'a [Component], parent: &ComponentPath, out: &mut Vec<(ComponentPath, &'a Component)>) {
    for c in components {
        let path = parent.join(&c.name);
        out.push((path.clone(), c));
        walk(&c.children, &path, out);
    }
}

fn visit_mut(
    components: &mut [Component],
    parent: &ComponentPath,
    f: &mut dyn FnMut(&ComponentPath, &mut Component) -> Result<(), ModelError>,
) -> Result<(), ModelError> {
    for c in components.iter_mut() {
        let path = parent.join(&c.name);
        f(&path, c)?;
        visit_mut(&mut c.children, &path, f)?;
    }
    Ok(())
}

fn check_sibling_names(components: &[Component], parent: &ComponentPath) -> Result<(), ModelError> {
    let mut seen = HashSet::new();
    for c in components {
        if c.name.trim().is_empty() || c.name.contains('/') {
            return Err(ModelError::InvalidName {
                path: parent.clone(),
                name: c.name.clone(),
            });
        }
        if !seen.insert(c.name.as_str()) {
            return Err(ModelError::DuplicateName {
                parent: parent.clone(),
                name: c.name.clone(),
            });
        }
        check_sibling_names(&c.children, &parent.join(&c.name))?;
    }
    Ok(())
}

impl Model {
    /// An empty model: ground plus the standard sets
    pub fn new(name: impl Into<String>) -> Self {
        let mut model = Self {
            name: name.into(),
            display: DisplayHints::default(),
            components: Vec::new(),
            input_file: None,
            initialized: false,
        };
        model.ensure_standard_sets();
        model
    }

    /// Add ground and any missing standard set
    pub fn ensure_standard_sets(&mut self) {
        if !self.components.iter().any(|c| matches!(c.kind, ComponentKind::Ground)) {
            self.components.insert(0, Component::ground());
            self.initialized = false;
        }
        for set in STANDARD_SETS {
            if !self.components.iter().any(|c| c.name == set) {
                self.components.push(Component::container(set));
                self.initialized = false;
            }
        }
    }

    /// Path of a top-level set such as [`BODYSET`]
    pub fn set_path(set: &str) -> ComponentPath {
        ComponentPath::root().join(set)
    }

    pub fn ground_path(&self) -> ComponentPath {
        self.components
            .iter()
            .find(|c| matches!(c.kind, ComponentKind::Ground))
            .map(|c| ComponentPath::root().join(&c.name))
            .unwrap_or_else(|| Self::set_path(GROUND))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// File this model was loaded from, if any
    pub fn input_file(&self) -> Option<&Path> {
        self.input_file.as_deref()
    }

    pub fn set_input_file(&mut self, path: Option<PathBuf>) {
        self.input_file = path;
    }

    pub fn top_level(&self) -> &[Component] {
        &self.components
    }

    pub fn find(&self, path: &ComponentPath) -> Option<&Component> {
        let mut segments = path.segments();
        let first = segments.next()?;
        let mut current = self.components.iter().find(|c| c.name == first)?;
        for segment in segments {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Mutable lookup. Callers that change structure must re-finalize.
    pub fn find_mut(&mut self, path: &ComponentPath) -> Option<&mut Component> {
        let mut segments = path.segments();
        let first = segments.next()?;
        let mut current = self.components.iter_mut().find(|c| c.name == first)?;
        for segment in segments {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    pub fn contains(&self, path: &ComponentPath) -> bool {
        self.find(path).is_some()
    }

    /// Every component with its absolute path, depth first
    pub fn walk(&self) -> Vec<(ComponentPath, &Component)> {
        let mut out = Vec::new();
        walk(&self.components, &ComponentPath::root(), &mut out);
        out
    }

    /// Current absolute path of the component with the given id
    pub fn path_of(&self, id: ComponentId) -> Option<ComponentPath> {
        self.walk().into_iter().find(|(_, c)| c.id() == id).map(|(p, _)| p)
    }

    pub fn bodies(&self) -> Vec<(ComponentPath, &Component)> {
        self.walk()
            .into_iter()
            .filter(|(_, c)| matches!(c.kind, ComponentKind::Body(_)))
            .collect()
    }

    pub fn joints(&self) -> Vec<(ComponentPath, &Component)> {
        self.walk()
            .into_iter()
            .filter(|(_, c)| matches!(c.kind, ComponentKind::Joint(_)))
            .collect()
    }

    pub fn coordinates(&self) -> Vec<(ComponentPath, &Coordinate)> {
        self.walk()
            .into_iter()
            .filter_map(|(p, c)| c.as_coordinate().map(|coord| (p, coord)))
            .collect()
    }

    /// Paths of the coordinates owned by a joint, in degree-of-freedom order
    pub fn joint_coordinate_paths(&self, joint: &ComponentPath) -> Vec<ComponentPath> {
        self.find(joint)
            .map(|j| j.joint_coordinates().map(|(c, _)| joint.join(&c.name)).collect())
            .unwrap_or_default()
    }

    /// Insert `component` under `parent`, giving the subtree fresh identities.
    ///
    /// Returns the new component's path. Sibling name clashes are reported by
    /// the next initialization, not here.
    pub fn add_component(&mut self, parent: &ComponentPath, mut component: Component) -> Result<ComponentPath, ModelError> {
        component.reset_identity();
        let path = parent.join(&component.name);
        if parent.is_root() {
            self.components.push(component);
        } else {
            self.find_mut(parent)
                .ok_or_else(|| ModelError::NoSuchComponent(parent.clone()))?
                .children
                .push(component);
        }
        self.initialized = false;
        Ok(path)
    }

    /// Detach and return the component at `path`
    pub fn remove_component(&mut self, path: &ComponentPath) -> Result<Component, ModelError> {
        if path.depth() <= 1 {
            return Err(ModelError::CannotRemove(path.clone()));
        }
        let parent = path.parent().unwrap_or_default();
        let owner = self
            .find_mut(&parent)
            .ok_or_else(|| ModelError::NoSuchComponent(path.clone()))?;
        let idx = owner
            .children
            .iter()
            .position(|c| c.name == path.component_name())
            .ok_or_else(|| ModelError::NoSuchComponent(path.clone()))?;
        let removed = owner.children.remove(idx);
        self.initialized = false;
        Ok(removed)
    }

    pub fn set_property(&mut self, path: &ComponentPath, property: &str, value: &PropertyValue) -> Result<(), ModelError> {
        let component = self
            .find_mut(path)
            .ok_or_else(|| ModelError::NoSuchComponent(path.clone()))?;
        component.set_property(property, value).map_err(|e| match e {
            PropertyError::Unknown => ModelError::UnknownProperty {
                path: path.clone(),
                property: property.to_string(),
            },
            PropertyError::TypeMismatch(expected) => ModelError::PropertyTypeMismatch {
                path: path.clone(),
                property: property.to_string(),
                expected,
            },
        })
    }

    /// Resolve every socket against the current tree.
    ///
    /// Bound sockets follow their connectee by id, so a renamed or moved
    /// connectee has its new path written back. Unbound sockets are resolved
    /// by path and bound.
    pub fn finalize_connections(&mut self) -> Result<(), ModelError> {
        self.initialized = false;
        check_sibling_names(&self.components, &ComponentPath::root())?;

        let mut by_id: HashMap<ComponentId, ComponentPath> = HashMap::new();
        let mut by_path: HashMap<ComponentPath, Resolved> = HashMap::new();
        for (path, c) in self.walk() {
            by_id.insert(c.id(), path.clone());
            by_path.insert(
                path,
                Resolved {
                    id: c.id(),
                    is_frame: c.kind.is_frame(),
                    is_coordinate: c.as_coordinate().is_some(),
                },
            );
        }

        let mut rebound = 0usize;
        visit_mut(&mut self.components, &ComponentPath::root(), &mut |owner, component| {
            for (name, socket, target) in component.kind.sockets_mut() {
                if let Some(id) = socket.binding() {
                    match by_id.get(&id) {
                        Some(current) => {
                            if current != socket.connectee() {
                                rebound += 1;
                            }
                            socket.bind(id, current.clone());
                        }
                        None => socket.unbind(),
                    }
                }

                let connectee = socket.connectee().clone();
                let resolved = by_path.get(&connectee).ok_or_else(|| ModelError::MissingConnectee {
                    owner: owner.clone(),
                    socket: name.to_string(),
                    connectee: connectee.clone(),
                })?;
                if !resolved.satisfies(target) {
                    return Err(ModelError::WrongConnecteeKind {
                        owner: owner.clone(),
                        socket: name.to_string(),
                        connectee,
                        expected: target.describe(),
                    });
                }
                socket.bind(resolved.id, connectee);
            }
            Ok(())
        })?;

        if rebound > 0 {
            debug!(rebound, "socket paths updated to follow their connectees");
        }
        Ok(())
    }

    /// Validate the finalized model
    pub fn initialize_model(&mut self) -> Result<(), ModelError> {
        self.initialized = false;
        check_sibling_names(&self.components, &ComponentPath::root())?;

        let all = self.walk();
        let contact_names: HashSet<&str> = all
            .iter()
            .filter(|(_, c)| matches!(c.kind, ComponentKind::ContactGeometry(_)))
            .map(|(_, c)| c.name.as_str())
            .collect();

        for (path, c) in &all {
            c.check_properties()
                .map_err(|(property, reason)| ModelError::InvalidProperty {
                    path: path.clone(),
                    property: property.to_string(),
                    reason,
                })?;

            for (socket, s, target) in c.kind.sockets() {
                let connectee = self.find(s.connectee()).ok_or_else(|| ModelError::MissingConnectee {
                    owner: path.clone(),
                    socket: socket.to_string(),
                    connectee: s.connectee().clone(),
                })?;
                if !connectee.kind.satisfies(target) {
                    return Err(ModelError::WrongConnecteeKind {
                        owner: path.clone(),
                        socket: socket.to_string(),
                        connectee: s.connectee().clone(),
                        expected: target.describe(),
                    });
                }
            }

            match &c.kind {
                ComponentKind::Joint(j) => {
                    let found = c.joint_coordinates().count();
                    let expected = j.joint_type.coordinate_count();
                    if found != expected {
                        return Err(ModelError::CoordinateCount {
                            joint: path.clone(),
                            joint_type: j.joint_type.class_name(),
                            expected,
                            found,
                        });
                    }
                }
                ComponentKind::HuntCrossleyForce(h) => {
                    if let Some(missing) = h.contact_geometry.iter().find(|n| !contact_names.contains(n.as_str())) {
                        return Err(ModelError::MissingConnectee {
                            owner: path.clone(),
                            socket: "contact_geometry".to_string(),
                            connectee: ComponentPath::new(missing),
                        });
                    }
                }
                _ => {}
            }
        }

        let order = self.joint_order()?;
        debug!(joints = order.len(), components = all.len(), "model initialized");
        self.initialized = true;
        Ok(())
    }

    /// Derive a fresh state from coordinate defaults
    pub fn initialize_state(&self) -> Result<State, ModelError> {
        if !self.initialized {
            return Err(ModelError::NotInitialized);
        }
        let mut state = State::default();
        for (path, coord) in self.coordinates() {
            state.coordinates.insert(
                path,
                CoordinateState {
                    value: coord.default_value,
                    speed: coord.default_speed_value,
                    locked: coord.locked,
                },
            );
        }
        self.assemble(&mut state)?;
        Ok(state)
    }

    /// Enforce coordinate coupler constraints, then realize frame poses
    pub fn assemble(&self, state: &mut State) -> Result<(), ModelError> {
        for (path, c) in self.walk() {
            let ComponentKind::CoordinateCouplerConstraint(coupler) = &c.kind else {
                continue;
            };
            let independent = state
                .coordinate_value(coupler.independent_coordinate.connectee())
                .ok_or_else(|| ModelError::MissingConnectee {
                    owner: path.clone(),
                    socket: "independent_coordinate".to_string(),
                    connectee: coupler.independent_coordinate.connectee().clone(),
                })?;
            let dependent = state
                .coordinate_mut(coupler.dependent_coordinate.connectee())
                .ok_or_else(|| ModelError::MissingConnectee {
                    owner: path.clone(),
                    socket: "dependent_coordinate".to_string(),
                    connectee: coupler.dependent_coordinate.connectee().clone(),
                })?;
            dependent.value = coupler.scale_factor * independent + coupler.offset;
        }
        self.realize_positions(state)
    }

    /// Recompute every frame pose from the state's coordinate values
    pub fn realize_positions(&self, state: &mut State) -> Result<(), ModelError> {
        let order = self.joint_order()?;
        state.frames.clear();
        state.frames.insert(self.ground_path(), DAffine3::IDENTITY);

        for link in &order {
            let parent_base = state
                .frames
                .get(&link.parent_base)
                .copied()
                .ok_or_else(|| ModelError::KinematicLoop(link.path.clone()))?;
            let q: Vec<f64> = link
                .coordinates
                .iter()
                .map(|p| state.coordinate_value(p).unwrap_or(0.0))
                .collect();
            let parent_in_ground = parent_base * link.parent_offset;
            let child_in_ground = parent_in_ground * link.joint_type.motion(&q);
            state
                .frames
                .insert(link.child_base.clone(), child_in_ground * link.child_offset.inverse());
        }

        for (path, c) in self.walk() {
            if c.as_offset_frame().is_none() {
                continue;
            }
            let (base, offset) = self.frame_in_base(&path)?;
            if let Some(base_pose) = state.frames.get(&base).copied() {
                state.frames.insert(path, base_pose * offset);
            }
        }
        Ok(())
    }

    /// Follow offset frames down to their ground or body base.
    ///
    /// Returns the base and the pose of `frame` expressed in it.
    pub fn frame_in_base(&self, frame: &ComponentPath) -> Result<(ComponentPath, DAffine3), ModelError> {
        let mut current = frame.clone();
        let mut transform = DAffine3::IDENTITY;
        for _ in 0..MAX_FRAME_CHAIN {
            let c = self
                .find(&current)
                .ok_or_else(|| ModelError::NoSuchComponent(current.clone()))?;
            match &c.kind {
                ComponentKind::Ground | ComponentKind::Body(_) => return Ok((current, transform)),
                ComponentKind::OffsetFrame(f) => {
                    transform = rigid_transform(f.translation, f.orientation) * transform;
                    current = f.parent.connectee().clone();
                }
                _ => {
                    return Err(ModelError::WrongConnecteeKind {
                        owner: frame.clone(),
                        socket: "parent".to_string(),
                        connectee: current,
                        expected: SocketTarget::Frame.describe(),
                    })
                }
            }
        }
        Err(ModelError::CyclicFrames(frame.clone()))
    }

    /// Location of a station, marker or path point expressed in ground
    pub fn station_in_ground(&self, state: &State, station: &ComponentPath) -> Option<DVec3> {
        let s = self.find(station)?.as_station()?;
        let frame = state.frame_in_ground(s.parent_frame.connectee())?;
        Some(frame.transform_point3(DVec3::from_array(s.location)))
    }

    /// Order joints so that every joint's parent base is placed before it
    fn joint_order(&self) -> Result<Vec<JointLink>, ModelError> {
        let ground = self.ground_path();
        let mut links = Vec::new();
        for (path, c) in self.joints() {
            let Some(joint) = c.as_joint() else { continue };
            let (parent_base, parent_offset) = self.frame_in_base(joint.parent_frame.connectee())?;
            let (child_base, child_offset) = self.frame_in_base(joint.child_frame.connectee())?;
            if child_base == ground {
                return Err(ModelError::ChildFrameIsGround(path));
            }
            let coordinates = c.joint_coordinates().map(|(cc, _)| path.join(&cc.name)).collect();
            links.push(JointLink {
                path,
                joint_type: joint.joint_type,
                parent_base,
                parent_offset,
                child_base,
                child_offset,
                coordinates,
            });
        }

        let mut parented = HashSet::new();
        for link in &links {
            if !parented.insert(link.child_base.clone()) {
                return Err(ModelError::MultipleParentJoints(link.child_base.clone()));
            }
        }
        if let Some((body, _)) = self.bodies().into_iter().find(|(p, _)| !parented.contains(p)) {
            return Err(ModelError::UnconnectedBody(body));
        }

        let mut known: HashSet<ComponentPath> = HashSet::from([ground]);
        let mut ordered = Vec::with_capacity(links.len());
        let mut pending = links;
        while !pending.is_empty() {
            let (ready, rest): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|l| known.contains(&l.parent_base));
            if ready.is_empty() {
                return Err(ModelError::KinematicLoop(rest[0].path.clone()));
            }
            for link in ready {
                if !known.insert(link.child_base.clone()) {
                    return Err(ModelError::KinematicLoop(link.path));
                }
                ordered.push(link);
            }
            pending = rest;
        }
        Ok(ordered)
    }
}
