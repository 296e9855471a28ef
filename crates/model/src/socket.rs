//! Named references from one component to another

use serde::{Deserialize, Serialize};

use crate::{ComponentId, ComponentPath};

/// What a socket may be connected to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketTarget {
    /// Ground, a body, or an offset frame
    Frame,
    Coordinate,
}

impl SocketTarget {
    pub fn describe(&self) -> &'static str {
        match self {
            SocketTarget::Frame => "physical frame",
            SocketTarget::Coordinate => "coordinate",
        }
    }
}

/// A reference to another component, stored by absolute path.
///
/// After [`crate::Model::finalize_connections`] the socket is also bound to the
/// connectee's stable id, so a later rename of the connectee is written back
/// into `connectee` on the next finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Socket {
    connectee: ComponentPath,
    #[serde(skip)]
    binding: Option<ComponentId>,
}

impl Socket {
    pub fn new(connectee: impl Into<ComponentPath>) -> Self {
        Self {
            connectee: connectee.into(),
            binding: None,
        }
    }

    /// Path of the connectee as of the last finalization or connection
    pub fn connectee(&self) -> &ComponentPath {
        &self.connectee
    }

    /// Point the socket at a different component, dropping any binding
    pub fn connect(&mut self, connectee: impl Into<ComponentPath>) {
        self.connectee = connectee.into();
        self.binding = None;
    }

    pub fn binding(&self) -> Option<ComponentId> {
        self.binding
    }

    pub(crate) fn bind(&mut self, id: ComponentId, path: ComponentPath) {
        self.binding = Some(id);
        self.connectee = path;
    }

    pub(crate) fn unbind(&mut self) {
        self.binding = None;
    }
}
