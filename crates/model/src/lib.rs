//! Multibody musculoskeletal models
//!
//! A [`Model`] is a tree of [`Component`]s addressed by [`ComponentPath`].
//! Components refer to each other through [`Socket`]s. A model is usable
//! once it has been finalized and initialized, after which a kinematic
//! [`State`] can be derived from it.

pub mod component;
pub mod error;
pub mod geometry;
pub mod io;
pub mod joint;
pub mod model;
pub mod path;
pub mod property;
pub mod socket;
pub mod state;

pub use component::{Component, ComponentId, ComponentKind};
pub use error::ModelError;
pub use geometry::{fit_ellipsoid, fit_plane, fit_sphere, FittedEllipsoid, FittedPlane, FittedSphere, Shape};
pub use joint::{decompose_rigid_transform, rigid_transform, JointType, MotionType};
pub use model::{
    DisplayHints, Model, BODYSET, COMPONENTSET, CONSTRAINTSET, FORCESET, GROUND, JOINTSET, MARKERSET,
};
pub use path::ComponentPath;
pub use property::{PropertyError, PropertyValue};
pub use socket::{Socket, SocketTarget};
pub use state::{CoordinateState, State};
