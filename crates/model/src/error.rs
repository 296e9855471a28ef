//! Errors raised while finalizing, initializing, or persisting a model

use std::path::PathBuf;

use thiserror::Error;

use crate::ComponentPath;

/// Everything that can go wrong when a model is brought into a valid state
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A socket points at a path that does not resolve.
    #[error("{owner}: socket '{socket}' cannot find its connectee '{connectee}'")]
    MissingConnectee {
        owner: ComponentPath,
        socket: String,
        connectee: ComponentPath,
    },

    /// A socket resolves to a component of the wrong kind.
    #[error("{owner}: socket '{socket}' expects a {expected} but '{connectee}' is not one")]
    WrongConnecteeKind {
        owner: ComponentPath,
        socket: String,
        connectee: ComponentPath,
        expected: &'static str,
    },

    #[error("{path}: invalid component name '{name}'")]
    InvalidName { path: ComponentPath, name: String },

    #[error("{parent}: more than one child is named '{name}'")]
    DuplicateName { parent: ComponentPath, name: String },

    #[error("{path}: invalid value for property '{property}': {reason}")]
    InvalidProperty {
        path: ComponentPath,
        property: String,
        reason: String,
    },

    #[error("{path}: no property named '{property}'")]
    UnknownProperty { path: ComponentPath, property: String },

    #[error("{path}: property '{property}' expects a {expected} value")]
    PropertyTypeMismatch {
        path: ComponentPath,
        property: String,
        expected: &'static str,
    },

    #[error("{joint}: a {joint_type} joint needs {expected} coordinates but has {found}")]
    CoordinateCount {
        joint: ComponentPath,
        joint_type: &'static str,
        expected: usize,
        found: usize,
    },

    /// A body is not the child of any joint.
    #[error("body {0} is not connected to the model by a joint")]
    UnconnectedBody(ComponentPath),

    #[error("body {0} is the child of more than one joint")]
    MultipleParentJoints(ComponentPath),

    #[error("joint {0} is part of a kinematic loop or is not reachable from ground")]
    KinematicLoop(ComponentPath),

    #[error("joint {0} uses ground as its child frame")]
    ChildFrameIsGround(ComponentPath),

    #[error("offset frame chain starting at {0} is cyclic")]
    CyclicFrames(ComponentPath),

    #[error("{0}: no such component")]
    NoSuchComponent(ComponentPath),

    #[error("{0} is a fixed part of every model and cannot be removed")]
    CannotRemove(ComponentPath),

    #[error("the model must be initialized before its state can be derived")]
    NotInitialized,

    #[error("cannot read or write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse model file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
