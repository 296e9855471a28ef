//! Joint types and their coordinate layouts

use glam::{DAffine3, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

/// Whether a coordinate rotates or translates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionType {
    Rotational,
    Translational,
}

/// Layout of one generalized coordinate of a joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateSpec {
    /// Appended to the joint name to form the coordinate name
    pub suffix: &'static str,
    pub motion: MotionType,
    pub default_range: [f64; 2],
}

const ROTATION_RANGE: [f64; 2] = [-std::f64::consts::PI, std::f64::consts::PI];
const TRANSLATION_RANGE: [f64; 2] = [-1.0, 1.0];

const fn rot(suffix: &'static str) -> CoordinateSpec {
    CoordinateSpec {
        suffix,
        motion: MotionType::Rotational,
        default_range: ROTATION_RANGE,
    }
}

const fn trans(suffix: &'static str) -> CoordinateSpec {
    CoordinateSpec {
        suffix,
        motion: MotionType::Translational,
        default_range: TRANSLATION_RANGE,
    }
}

/// The mobility of a joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointType {
    /// No relative motion
    Weld,
    /// Rotation about the parent frame's Z axis
    Pin,
    /// Translation along the parent frame's X axis
    Slider,
    /// Body-fixed XYZ rotation
    Ball,
    /// Body-fixed XYZ rotation followed by XYZ translation
    Free,
}

impl JointType {
    pub fn all() -> &'static [JointType] {
        &[
            JointType::Weld,
            JointType::Pin,
            JointType::Slider,
            JointType::Ball,
            JointType::Free,
        ]
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            JointType::Weld => "WeldJoint",
            JointType::Pin => "PinJoint",
            JointType::Slider => "SliderJoint",
            JointType::Ball => "BallJoint",
            JointType::Free => "FreeJoint",
        }
    }

    pub fn coordinate_specs(&self) -> &'static [CoordinateSpec] {
        const PIN: [CoordinateSpec; 1] = [rot("rz")];
        const SLIDER: [CoordinateSpec; 1] = [trans("tx")];
        const BALL: [CoordinateSpec; 3] = [rot("rx"), rot("ry"), rot("rz")];
        const FREE: [CoordinateSpec; 6] = [
            rot("rx"),
            rot("ry"),
            rot("rz"),
            trans("tx"),
            trans("ty"),
            trans("tz"),
        ];
        match self {
            JointType::Weld => &[],
            JointType::Pin => &PIN,
            JointType::Slider => &SLIDER,
            JointType::Ball => &BALL,
            JointType::Free => &FREE,
        }
    }

    pub fn coordinate_count(&self) -> usize {
        self.coordinate_specs().len()
    }

    /// Transform of the child frame expressed in the parent frame for the
    /// given coordinate values. Missing values are treated as zero.
    pub fn motion(&self, q: &[f64]) -> DAffine3 {
        let at = |i: usize| q.get(i).copied().unwrap_or(0.0);
        match self {
            JointType::Weld => DAffine3::IDENTITY,
            JointType::Pin => DAffine3::from_rotation_z(at(0)),
            JointType::Slider => DAffine3::from_translation(DVec3::new(at(0), 0.0, 0.0)),
            JointType::Ball => {
                DAffine3::from_quat(DQuat::from_euler(EulerRot::XYZ, at(0), at(1), at(2)))
            }
            JointType::Free => DAffine3::from_rotation_translation(
                DQuat::from_euler(EulerRot::XYZ, at(0), at(1), at(2)),
                DVec3::new(at(3), at(4), at(5)),
            ),
        }
    }
}

/// Build a rigid transform from a translation and body-fixed XYZ Euler angles
pub fn rigid_transform(translation: [f64; 3], orientation: [f64; 3]) -> DAffine3 {
    DAffine3::from_rotation_translation(
        DQuat::from_euler(EulerRot::XYZ, orientation[0], orientation[1], orientation[2]),
        DVec3::from_array(translation),
    )
}

/// Inverse of [`rigid_transform`]: split a rigid transform into translation
/// and body-fixed XYZ Euler angles
pub fn decompose_rigid_transform(transform: &DAffine3) -> ([f64; 3], [f64; 3]) {
    let (_, rotation, translation) = transform.to_scale_rotation_translation();
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    (translation.to_array(), [x, y, z])
}
