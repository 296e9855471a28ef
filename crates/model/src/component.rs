//! The component tree

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::geometry::Shape;
use crate::joint::{JointType, MotionType};
use crate::socket::{Socket, SocketTarget};
use crate::ComponentPath;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide identity of a component, stable across renames and clones.
///
/// Not persisted: components loaded from disk receive fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    pub fn fresh() -> Self {
        Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

fn default_true() -> bool {
    true
}

/// A node in the model's component tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(skip, default = "ComponentId::fresh")]
    id: ComponentId,
    pub name: String,
    /// Appearance flag, only affects decoration
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(flatten)]
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Component>,
}

/// Per-kind data of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    /// Grouping node (`bodyset`, `jointset`, ...)
    Container,
    Ground,
    Body(Body),
    OffsetFrame(OffsetFrame),
    Joint(Joint),
    Coordinate(Coordinate),
    Station(Station),
    Marker(Station),
    PathPoint(Station),
    Geometry(Geometry),
    ContactGeometry(ContactGeometry),
    HuntCrossleyForce(HuntCrossleyForce),
    PathActuator(PathActuator),
    CoordinateCouplerConstraint(CouplerConstraint),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub mass: f64,
    #[serde(default)]
    pub mass_center: [f64; 3],
    #[serde(default)]
    pub inertia: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetFrame {
    pub parent: Socket,
    #[serde(default)]
    pub translation: [f64; 3],
    /// Body-fixed XYZ Euler angles, radians
    #[serde(default)]
    pub orientation: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub joint_type: JointType,
    pub parent_frame: Socket,
    pub child_frame: Socket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub motion_type: MotionType,
    #[serde(default)]
    pub default_value: f64,
    #[serde(default)]
    pub default_speed_value: f64,
    pub range: [f64; 2],
    #[serde(default)]
    pub locked: bool,
}

impl Coordinate {
    /// `(min, max)` regardless of the order the range was authored in
    pub fn ordered_range(&self) -> (f64, f64) {
        (self.range[0].min(self.range[1]), self.range[0].max(self.range[1]))
    }

    pub fn is_in_range(&self, value: f64) -> bool {
        let (lo, hi) = self.ordered_range();
        lo <= value && value <= hi
    }
}

/// A point fixed in a frame (stations, markers, path points)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub parent_frame: Socket,
    #[serde(default)]
    pub location: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub frame: Socket,
    #[serde(flatten)]
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactGeometry {
    pub frame: Socket,
    #[serde(default)]
    pub location: [f64; 3],
    #[serde(flatten)]
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuntCrossleyForce {
    pub stiffness: f64,
    pub dissipation: f64,
    /// Names of the contact geometry this force acts between
    #[serde(default)]
    pub contact_geometry: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathActuator {
    pub optimal_force: f64,
}

/// Constrains `dependent = scale_factor * independent + offset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplerConstraint {
    pub independent_coordinate: Socket,
    pub dependent_coordinate: Socket,
    pub scale_factor: f64,
    #[serde(default)]
    pub offset: f64,
}

impl ComponentKind {
    pub fn class_name(&self) -> &'static str {
        match self {
            ComponentKind::Container => "Set",
            ComponentKind::Ground => "Ground",
            ComponentKind::Body(_) => "Body",
            ComponentKind::OffsetFrame(_) => "PhysicalOffsetFrame",
            ComponentKind::Joint(j) => j.joint_type.class_name(),
            ComponentKind::Coordinate(_) => "Coordinate",
            ComponentKind::Station(_) => "Station",
            ComponentKind::Marker(_) => "Marker",
            ComponentKind::PathPoint(_) => "PathPoint",
            ComponentKind::Geometry(g) => g.shape.kind_name(),
            ComponentKind::ContactGeometry(_) => "ContactGeometry",
            ComponentKind::HuntCrossleyForce(_) => "HuntCrossleyForce",
            ComponentKind::PathActuator(_) => "PathActuator",
            ComponentKind::CoordinateCouplerConstraint(_) => "CoordinateCouplerConstraint",
        }
    }

    /// Ground, bodies and offset frames
    pub fn is_frame(&self) -> bool {
        matches!(
            self,
            ComponentKind::Ground | ComponentKind::Body(_) | ComponentKind::OffsetFrame(_)
        )
    }

    pub fn is_station_like(&self) -> bool {
        matches!(
            self,
            ComponentKind::Station(_) | ComponentKind::Marker(_) | ComponentKind::PathPoint(_)
        )
    }

    /// Whether a component of this kind may be plugged into a socket expecting `target`
    pub fn satisfies(&self, target: SocketTarget) -> bool {
        match target {
            SocketTarget::Frame => self.is_frame(),
            SocketTarget::Coordinate => matches!(self, ComponentKind::Coordinate(_)),
        }
    }

    /// All sockets of this kind, with the kind of connectee each one expects
    pub fn sockets(&self) -> Vec<(&'static str, &Socket, SocketTarget)> {
        use SocketTarget::*;
        match self {
            ComponentKind::OffsetFrame(f) => vec![("parent", &f.parent, Frame)],
            ComponentKind::Joint(j) => vec![
                ("parent_frame", &j.parent_frame, Frame),
                ("child_frame", &j.child_frame, Frame),
            ],
            ComponentKind::Station(s) | ComponentKind::Marker(s) | ComponentKind::PathPoint(s) => {
                vec![("parent_frame", &s.parent_frame, Frame)]
            }
            ComponentKind::Geometry(g) => vec![("frame", &g.frame, Frame)],
            ComponentKind::ContactGeometry(g) => vec![("frame", &g.frame, Frame)],
            ComponentKind::CoordinateCouplerConstraint(c) => vec![
                ("independent_coordinate", &c.independent_coordinate, Coordinate),
                ("dependent_coordinate", &c.dependent_coordinate, Coordinate),
            ],
            _ => Vec::new(),
        }
    }

    pub fn sockets_mut(&mut self) -> Vec<(&'static str, &mut Socket, SocketTarget)> {
        use SocketTarget::*;
        match self {
            ComponentKind::OffsetFrame(f) => vec![("parent", &mut f.parent, Frame)],
            ComponentKind::Joint(j) => vec![
                ("parent_frame", &mut j.parent_frame, Frame),
                ("child_frame", &mut j.child_frame, Frame),
            ],
            ComponentKind::Station(s) | ComponentKind::Marker(s) | ComponentKind::PathPoint(s) => {
                vec![("parent_frame", &mut s.parent_frame, Frame)]
            }
            ComponentKind::Geometry(g) => vec![("frame", &mut g.frame, Frame)],
            ComponentKind::ContactGeometry(g) => vec![("frame", &mut g.frame, Frame)],
            ComponentKind::CoordinateCouplerConstraint(c) => vec![
                ("independent_coordinate", &mut c.independent_coordinate, Coordinate),
                ("dependent_coordinate", &mut c.dependent_coordinate, Coordinate),
            ],
            _ => Vec::new(),
        }
    }
}

impl Component {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            id: ComponentId::fresh(),
            name: name.into(),
            visible: true,
            kind,
            children: Vec::new(),
        }
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self::new(name, ComponentKind::Container)
    }

    pub fn ground() -> Self {
        Self::new("ground", ComponentKind::Ground)
    }

    pub fn body(name: impl Into<String>, mass: f64, mass_center: [f64; 3], inertia: [f64; 3]) -> Self {
        Self::new(
            name,
            ComponentKind::Body(Body {
                mass,
                mass_center,
                inertia,
            }),
        )
    }

    pub fn offset_frame(
        name: impl Into<String>,
        parent: impl Into<ComponentPath>,
        translation: [f64; 3],
        orientation: [f64; 3],
    ) -> Self {
        Self::new(
            name,
            ComponentKind::OffsetFrame(OffsetFrame {
                parent: Socket::new(parent),
                translation,
                orientation,
            }),
        )
    }

    /// A joint with one default-initialized coordinate per degree of freedom
    pub fn joint(
        name: impl Into<String>,
        joint_type: JointType,
        parent_frame: impl Into<ComponentPath>,
        child_frame: impl Into<ComponentPath>,
    ) -> Self {
        let name = name.into();
        let mut joint = Self::new(
            name.clone(),
            ComponentKind::Joint(Joint {
                joint_type,
                parent_frame: Socket::new(parent_frame),
                child_frame: Socket::new(child_frame),
            }),
        );
        joint.children = default_coordinates(&name, joint_type);
        joint
    }

    pub fn coordinate(name: impl Into<String>, motion_type: MotionType, range: [f64; 2]) -> Self {
        Self::new(
            name,
            ComponentKind::Coordinate(Coordinate {
                motion_type,
                default_value: 0.0,
                default_speed_value: 0.0,
                range,
                locked: false,
            }),
        )
    }

    pub fn station(name: impl Into<String>, parent_frame: impl Into<ComponentPath>, location: [f64; 3]) -> Self {
        Self::new(
            name,
            ComponentKind::Station(Station {
                parent_frame: Socket::new(parent_frame),
                location,
            }),
        )
    }

    pub fn marker(name: impl Into<String>, parent_frame: impl Into<ComponentPath>, location: [f64; 3]) -> Self {
        Self::new(
            name,
            ComponentKind::Marker(Station {
                parent_frame: Socket::new(parent_frame),
                location,
            }),
        )
    }

    pub fn path_point(name: impl Into<String>, parent_frame: impl Into<ComponentPath>, location: [f64; 3]) -> Self {
        Self::new(
            name,
            ComponentKind::PathPoint(Station {
                parent_frame: Socket::new(parent_frame),
                location,
            }),
        )
    }

    pub fn geometry(name: impl Into<String>, frame: impl Into<ComponentPath>, shape: Shape) -> Self {
        Self::new(
            name,
            ComponentKind::Geometry(Geometry {
                frame: Socket::new(frame),
                shape,
            }),
        )
    }

    pub fn contact_geometry(
        name: impl Into<String>,
        frame: impl Into<ComponentPath>,
        location: [f64; 3],
        shape: Shape,
    ) -> Self {
        Self::new(
            name,
            ComponentKind::ContactGeometry(ContactGeometry {
                frame: Socket::new(frame),
                location,
                shape,
            }),
        )
    }

    pub fn hunt_crossley_force(name: impl Into<String>, stiffness: f64, dissipation: f64) -> Self {
        Self::new(
            name,
            ComponentKind::HuntCrossleyForce(HuntCrossleyForce {
                stiffness,
                dissipation,
                contact_geometry: Vec::new(),
            }),
        )
    }

    pub fn path_actuator(name: impl Into<String>, optimal_force: f64) -> Self {
        Self::new(name, ComponentKind::PathActuator(PathActuator { optimal_force }))
    }

    pub fn coupler_constraint(
        name: impl Into<String>,
        independent: impl Into<ComponentPath>,
        dependent: impl Into<ComponentPath>,
        scale_factor: f64,
        offset: f64,
    ) -> Self {
        Self::new(
            name,
            ComponentKind::CoordinateCouplerConstraint(CouplerConstraint {
                independent_coordinate: Socket::new(independent),
                dependent_coordinate: Socket::new(dependent),
                scale_factor,
                offset,
            }),
        )
    }

    /// Attach a child, builder style
    pub fn with_child(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn child(&self, name: &str) -> Option<&Component> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Component> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Give this component and its whole subtree new identities and drop
    /// every socket binding inside it, so it can be inserted as a new object.
    pub fn reset_identity(&mut self) {
        self.id = ComponentId::fresh();
        for (_, socket, _) in self.kind.sockets_mut() {
            socket.unbind();
        }
        for child in &mut self.children {
            child.reset_identity();
        }
    }

    /// Find the socket with the given name
    pub fn socket(&self, name: &str) -> Option<&Socket> {
        self.kind
            .sockets()
            .into_iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, s, _)| s)
    }

    pub fn socket_mut(&mut self, name: &str) -> Option<&mut Socket> {
        self.kind
            .sockets_mut()
            .into_iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, s, _)| s)
    }

    pub fn as_joint(&self) -> Option<&Joint> {
        match &self.kind {
            ComponentKind::Joint(j) => Some(j),
            _ => None,
        }
    }

    pub fn as_joint_mut(&mut self) -> Option<&mut Joint> {
        match &mut self.kind {
            ComponentKind::Joint(j) => Some(j),
            _ => None,
        }
    }

    pub fn as_coordinate(&self) -> Option<&Coordinate> {
        match &self.kind {
            ComponentKind::Coordinate(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_coordinate_mut(&mut self) -> Option<&mut Coordinate> {
        match &mut self.kind {
            ComponentKind::Coordinate(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_offset_frame(&self) -> Option<&OffsetFrame> {
        match &self.kind {
            ComponentKind::OffsetFrame(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_offset_frame_mut(&mut self) -> Option<&mut OffsetFrame> {
        match &mut self.kind {
            ComponentKind::OffsetFrame(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_station(&self) -> Option<&Station> {
        match &self.kind {
            ComponentKind::Station(s) | ComponentKind::Marker(s) | ComponentKind::PathPoint(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_station_mut(&mut self) -> Option<&mut Station> {
        match &mut self.kind {
            ComponentKind::Station(s) | ComponentKind::Marker(s) | ComponentKind::PathPoint(s) => Some(s),
            _ => None,
        }
    }

    /// Coordinates owned by a joint, in degree-of-freedom order
    pub fn joint_coordinates(&self) -> impl Iterator<Item = (&Component, &Coordinate)> {
        self.children
            .iter()
            .filter_map(|c| c.as_coordinate().map(|coord| (c, coord)))
    }
}

/// Coordinates a fresh joint of `joint_type` starts with
pub fn default_coordinates(joint_name: &str, joint_type: JointType) -> Vec<Component> {
    joint_type
        .coordinate_specs()
        .iter()
        .map(|spec| {
            Component::coordinate(
                format!("{}_{}", joint_name, spec.suffix),
                spec.motion,
                spec.default_range,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_gets_coordinates_per_dof() {
        let j = Component::joint("hip", JointType::Free, "/ground", "/bodyset/pelvis");
        let names: Vec<_> = j.joint_coordinates().map(|(c, _)| c.name.clone()).collect();
        assert_eq!(names, vec!["hip_rx", "hip_ry", "hip_rz", "hip_tx", "hip_ty", "hip_tz"]);
    }

    #[test]
    fn test_clone_keeps_identity_reset_does_not() {
        let body = Component::body("femur", 1.0, [0.0; 3], [1.0; 3]);
        let copy = body.clone();
        assert_eq!(body.id(), copy.id());

        let mut fresh = body.clone();
        fresh.reset_identity();
        assert_ne!(body.id(), fresh.id());
    }

    #[test]
    fn test_socket_lookup_by_name() {
        let mut j = Component::joint("knee", JointType::Pin, "/bodyset/femur", "/bodyset/tibia");
        assert_eq!(j.socket("child_frame").unwrap().connectee().as_str(), "/bodyset/tibia");
        assert!(j.socket("frame").is_none());

        j.socket_mut("parent_frame").unwrap().connect("/ground");
        assert_eq!(j.socket("parent_frame").unwrap().connectee().as_str(), "/ground");
    }

    #[test]
    fn test_coordinate_range_order_is_irrelevant() {
        let mut c = Component::coordinate("q", MotionType::Rotational, [1.0, -1.0]);
        let coord = c.as_coordinate_mut().unwrap();
        assert_eq!(coord.ordered_range(), (-1.0, 1.0));
        assert!(coord.is_in_range(0.5));
        assert!(!coord.is_in_range(1.5));
    }

    #[test]
    fn test_component_serde_is_tagged_and_skips_id() {
        let body = Component::body("femur", 2.0, [0.0; 3], [1.0; 3]);
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""type":"body""#));
        assert!(!json.contains("\"id\""));

        let back: Component = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "femur");
        assert_ne!(back.id(), body.id());
    }
}
