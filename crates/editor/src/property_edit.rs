//! Pending property edits
//!
//! A [`PropertyEdit`] describes a change to one property of one component
//! without applying it, so editors can hand it around, log it or serialize
//! it. It is applied with [`crate::UndoableModel::apply_property_edit`].

use msk_model::{ComponentPath, Model, PropertyValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do with the property's current value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyChange {
    /// Replace the whole value
    Set { value: PropertyValue },
    /// Replace one element of a vector-valued property
    SetElement { index: usize, value: f64 },
    /// Flip a boolean
    Toggle,
    /// Multiply every number in the value
    Scale { factor: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChangeError {
    #[error("cannot {change} a {value_type} value")]
    Unsupported {
        change: &'static str,
        value_type: &'static str,
    },
    #[error("element {index} is out of bounds for a value of length {len}")]
    OutOfBounds { index: usize, len: usize },
}

impl PropertyChange {
    fn verb(&self) -> &'static str {
        match self {
            PropertyChange::Set { .. } => "set",
            PropertyChange::SetElement { .. } => "set an element of",
            PropertyChange::Toggle => "toggle",
            PropertyChange::Scale { .. } => "scale",
        }
    }

    /// The value the property would have after this change
    pub fn apply(&self, current: &PropertyValue) -> Result<PropertyValue, ChangeError> {
        let unsupported = || ChangeError::Unsupported {
            change: self.verb(),
            value_type: current.type_name(),
        };
        match (self, current) {
            (PropertyChange::Set { value }, _) => Ok(value.clone()),
            (PropertyChange::SetElement { index, value }, PropertyValue::Vec3(v)) => {
                let mut v = *v;
                let slot = v
                    .get_mut(*index)
                    .ok_or(ChangeError::OutOfBounds { index: *index, len: 3 })?;
                *slot = *value;
                Ok(PropertyValue::Vec3(v))
            }
            (PropertyChange::SetElement { index, value }, PropertyValue::Doubles(v)) => {
                let mut v = v.clone();
                let len = v.len();
                let slot = v
                    .get_mut(*index)
                    .ok_or(ChangeError::OutOfBounds { index: *index, len })?;
                *slot = *value;
                Ok(PropertyValue::Doubles(v))
            }
            (PropertyChange::Toggle, PropertyValue::Bool(b)) => Ok(PropertyValue::Bool(!b)),
            (PropertyChange::Scale { factor }, PropertyValue::Double(d)) => Ok(PropertyValue::Double(d * factor)),
            (PropertyChange::Scale { factor }, PropertyValue::Vec3(v)) => {
                Ok(PropertyValue::Vec3(v.map(|x| x * factor)))
            }
            (PropertyChange::Scale { factor }, PropertyValue::Doubles(v)) => {
                Ok(PropertyValue::Doubles(v.iter().map(|x| x * factor).collect()))
            }
            _ => Err(unsupported()),
        }
    }
}

/// A deferred edit of `property_name` on the component at `component_path`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyEdit {
    pub component_path: ComponentPath,
    pub property_name: String,
    pub change: PropertyChange,
}

impl PropertyEdit {
    pub fn new(component_path: impl Into<ComponentPath>, property_name: impl Into<String>, change: PropertyChange) -> Self {
        Self {
            component_path: component_path.into(),
            property_name: property_name.into(),
            change,
        }
    }

    pub fn set(component_path: impl Into<ComponentPath>, property_name: impl Into<String>, value: PropertyValue) -> Self {
        Self::new(component_path, property_name, PropertyChange::Set { value })
    }

    /// The value this edit would produce against `model`, without applying it.
    /// `None` if the target or property does not exist.
    pub fn preview(&self, model: &Model) -> Option<Result<PropertyValue, ChangeError>> {
        let current = model.find(&self.component_path)?.property(&self.property_name)?;
        Some(self.change.apply(&current))
    }
}
