//! Named, typed properties of components
//!
//! Every editable scalar of a component is exposed under a stable property
//! name so that generic editors can read and write it without knowing the
//! component's concrete kind.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::component::{Component, ComponentKind};
use crate::geometry::Shape;

/// Value of a single property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Double(f64),
    Bool(bool),
    Vec3([f64; 3]),
    Doubles(Vec<f64>),
    Text(String),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Double(_) => "double",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Vec3(_) => "vec3",
            PropertyValue::Doubles(_) => "doubles",
            PropertyValue::Text(_) => "text",
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// `Vec3`, or `Doubles` of length three
    pub fn as_vec3(&self) -> Option<[f64; 3]> {
        match self {
            PropertyValue::Vec3(v) => Some(*v),
            PropertyValue::Doubles(v) if v.len() == 3 => Some([v[0], v[1], v[2]]),
            _ => None,
        }
    }

    pub fn as_doubles(&self) -> Option<Vec<f64>> {
        match self {
            PropertyValue::Doubles(v) => Some(v.clone()),
            PropertyValue::Vec3(v) => Some(v.to_vec()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

fn fmt_doubles(f: &mut fmt::Formatter<'_>, values: &[f64]) -> fmt::Result {
    f.write_str("(")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{:.3}", v)?;
    }
    f.write_str(")")
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Double(v) => write!(f, "{:.3}", v),
            PropertyValue::Bool(v) => write!(f, "{}", v),
            PropertyValue::Vec3(v) => fmt_doubles(f, v),
            PropertyValue::Doubles(v) => fmt_doubles(f, v),
            PropertyValue::Text(v) => f.write_str(v),
        }
    }
}

/// Why a property could not be written
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("no such property")]
    Unknown,
    #[error("expected a {0} value")]
    TypeMismatch(&'static str),
}

fn double(value: &PropertyValue) -> Result<f64, PropertyError> {
    value.as_double().ok_or(PropertyError::TypeMismatch("double"))
}

fn vec3(value: &PropertyValue) -> Result<[f64; 3], PropertyError> {
    value.as_vec3().ok_or(PropertyError::TypeMismatch("vec3"))
}

fn boolean(value: &PropertyValue) -> Result<bool, PropertyError> {
    value.as_bool().ok_or(PropertyError::TypeMismatch("bool"))
}

fn shape_property_names(shape: &Shape) -> &'static [&'static str] {
    match shape {
        Shape::Sphere { .. } => &["radius"],
        Shape::Brick { .. } => &["half_lengths"],
        Shape::Ellipsoid { .. } => &["radii"],
        Shape::Cylinder { .. } => &["radius", "half_height"],
        Shape::Mesh { .. } => &["mesh_file", "scale_factors"],
    }
}

fn shape_property(shape: &Shape, name: &str) -> Option<PropertyValue> {
    match (shape, name) {
        (Shape::Sphere { radius }, "radius") | (Shape::Cylinder { radius, .. }, "radius") => {
            Some(PropertyValue::Double(*radius))
        }
        (Shape::Cylinder { half_height, .. }, "half_height") => Some(PropertyValue::Double(*half_height)),
        (Shape::Brick { half_lengths }, "half_lengths") => Some(PropertyValue::Vec3(*half_lengths)),
        (Shape::Ellipsoid { radii }, "radii") => Some(PropertyValue::Vec3(*radii)),
        (Shape::Mesh { file, .. }, "mesh_file") => Some(PropertyValue::Text(file.clone())),
        (Shape::Mesh { scale_factors, .. }, "scale_factors") => Some(PropertyValue::Vec3(*scale_factors)),
        _ => None,
    }
}

fn set_shape_property(shape: &mut Shape, name: &str, value: &PropertyValue) -> Result<(), PropertyError> {
    match (shape, name) {
        (Shape::Sphere { radius }, "radius") | (Shape::Cylinder { radius, .. }, "radius") => {
            *radius = double(value)?
        }
        (Shape::Cylinder { half_height, .. }, "half_height") => *half_height = double(value)?,
        (Shape::Brick { half_lengths }, "half_lengths") => *half_lengths = vec3(value)?,
        (Shape::Ellipsoid { radii }, "radii") => *radii = vec3(value)?,
        (Shape::Mesh { file, .. }, "mesh_file") => {
            *file = value
                .as_text()
                .ok_or(PropertyError::TypeMismatch("text"))?
                .to_string()
        }
        (Shape::Mesh { scale_factors, .. }, "scale_factors") => *scale_factors = vec3(value)?,
        _ => return Err(PropertyError::Unknown),
    }
    Ok(())
}

fn check_shape(shape: &Shape) -> Result<(), (&'static str, String)> {
    match shape {
        Shape::Sphere { radius } => positive("radius", *radius),
        Shape::Cylinder { radius, half_height } => {
            positive("radius", *radius)?;
            positive("half_height", *half_height)
        }
        Shape::Brick { half_lengths } => half_lengths
            .iter()
            .try_for_each(|v| positive("half_lengths", *v)),
        Shape::Ellipsoid { radii } => radii.iter().try_for_each(|v| positive("radii", *v)),
        Shape::Mesh {
            file, scale_factors, ..
        } => {
            if file.trim().is_empty() {
                return Err(("mesh_file", "mesh file name is empty".to_string()));
            }
            scale_factors.iter().try_for_each(|v| finite("scale_factors", *v))
        }
    }
}

fn finite(property: &'static str, v: f64) -> Result<(), (&'static str, String)> {
    if v.is_finite() {
        Ok(())
    } else {
        Err((property, format!("{} is not a finite number", v)))
    }
}

fn positive(property: &'static str, v: f64) -> Result<(), (&'static str, String)> {
    finite(property, v)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err((property, format!("{} must be greater than zero", v)))
    }
}

fn non_negative(property: &'static str, v: f64) -> Result<(), (&'static str, String)> {
    finite(property, v)?;
    if v >= 0.0 {
        Ok(())
    } else {
        Err((property, format!("{} must not be negative", v)))
    }
}

fn all_finite(property: &'static str, v: &[f64]) -> Result<(), (&'static str, String)> {
    v.iter().try_for_each(|x| finite(property, *x))
}

impl Component {
    /// Names of every property this component exposes, in display order
    pub fn property_names(&self) -> Vec<&'static str> {
        let mut names = vec!["visible"];
        match &self.kind {
            ComponentKind::Body(_) => names.extend(["mass", "mass_center", "inertia"]),
            ComponentKind::OffsetFrame(_) => names.extend(["translation", "orientation"]),
            ComponentKind::Coordinate(_) => {
                names.extend(["default_value", "default_speed_value", "range", "locked"])
            }
            ComponentKind::Station(_) | ComponentKind::Marker(_) | ComponentKind::PathPoint(_) => {
                names.push("location")
            }
            ComponentKind::Geometry(g) => names.extend(shape_property_names(&g.shape)),
            ComponentKind::ContactGeometry(g) => {
                names.push("location");
                names.extend(shape_property_names(&g.shape));
            }
            ComponentKind::HuntCrossleyForce(_) => names.extend(["stiffness", "dissipation"]),
            ComponentKind::PathActuator(_) => names.push("optimal_force"),
            ComponentKind::CoordinateCouplerConstraint(_) => names.extend(["scale_factor", "offset"]),
            ComponentKind::Container | ComponentKind::Ground | ComponentKind::Joint(_) => {}
        }
        names
    }

    /// Current value of the named property
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        use PropertyValue::*;
        if name == "visible" {
            return Some(Bool(self.visible));
        }
        match (&self.kind, name) {
            (ComponentKind::Body(b), "mass") => Some(Double(b.mass)),
            (ComponentKind::Body(b), "mass_center") => Some(Vec3(b.mass_center)),
            (ComponentKind::Body(b), "inertia") => Some(Vec3(b.inertia)),
            (ComponentKind::OffsetFrame(f), "translation") => Some(Vec3(f.translation)),
            (ComponentKind::OffsetFrame(f), "orientation") => Some(Vec3(f.orientation)),
            (ComponentKind::Coordinate(c), "default_value") => Some(Double(c.default_value)),
            (ComponentKind::Coordinate(c), "default_speed_value") => Some(Double(c.default_speed_value)),
            (ComponentKind::Coordinate(c), "range") => Some(Doubles(c.range.to_vec())),
            (ComponentKind::Coordinate(c), "locked") => Some(Bool(c.locked)),
            (ComponentKind::Station(s), "location")
            | (ComponentKind::Marker(s), "location")
            | (ComponentKind::PathPoint(s), "location") => Some(Vec3(s.location)),
            (ComponentKind::Geometry(g), _) => shape_property(&g.shape, name),
            (ComponentKind::ContactGeometry(g), "location") => Some(Vec3(g.location)),
            (ComponentKind::ContactGeometry(g), _) => shape_property(&g.shape, name),
            (ComponentKind::HuntCrossleyForce(h), "stiffness") => Some(Double(h.stiffness)),
            (ComponentKind::HuntCrossleyForce(h), "dissipation") => Some(Double(h.dissipation)),
            (ComponentKind::PathActuator(p), "optimal_force") => Some(Double(p.optimal_force)),
            (ComponentKind::CoordinateCouplerConstraint(c), "scale_factor") => Some(Double(c.scale_factor)),
            (ComponentKind::CoordinateCouplerConstraint(c), "offset") => Some(Double(c.offset)),
            _ => None,
        }
    }

    /// Overwrite the named property. Only the value's type is checked here;
    /// semantic validity is checked when the model is initialized.
    pub fn set_property(&mut self, name: &str, value: &PropertyValue) -> Result<(), PropertyError> {
        if name == "visible" {
            self.visible = boolean(value)?;
            return Ok(());
        }
        match (&mut self.kind, name) {
            (ComponentKind::Body(b), "mass") => b.mass = double(value)?,
            (ComponentKind::Body(b), "mass_center") => b.mass_center = vec3(value)?,
            (ComponentKind::Body(b), "inertia") => b.inertia = vec3(value)?,
            (ComponentKind::OffsetFrame(f), "translation") => f.translation = vec3(value)?,
            (ComponentKind::OffsetFrame(f), "orientation") => f.orientation = vec3(value)?,
            (ComponentKind::Coordinate(c), "default_value") => c.default_value = double(value)?,
            (ComponentKind::Coordinate(c), "default_speed_value") => c.default_speed_value = double(value)?,
            (ComponentKind::Coordinate(c), "range") => {
                let v = value
                    .as_doubles()
                    .filter(|v| v.len() == 2)
                    .ok_or(PropertyError::TypeMismatch("pair of doubles"))?;
                c.range = [v[0], v[1]];
            }
            (ComponentKind::Coordinate(c), "locked") => c.locked = boolean(value)?,
            (ComponentKind::Station(s), "location")
            | (ComponentKind::Marker(s), "location")
            | (ComponentKind::PathPoint(s), "location") => s.location = vec3(value)?,
            (ComponentKind::Geometry(g), _) => set_shape_property(&mut g.shape, name, value)?,
            (ComponentKind::ContactGeometry(g), "location") => g.location = vec3(value)?,
            (ComponentKind::ContactGeometry(g), _) => set_shape_property(&mut g.shape, name, value)?,
            (ComponentKind::HuntCrossleyForce(h), "stiffness") => h.stiffness = double(value)?,
            (ComponentKind::HuntCrossleyForce(h), "dissipation") => h.dissipation = double(value)?,
            (ComponentKind::PathActuator(p), "optimal_force") => p.optimal_force = double(value)?,
            (ComponentKind::CoordinateCouplerConstraint(c), "scale_factor") => c.scale_factor = double(value)?,
            (ComponentKind::CoordinateCouplerConstraint(c), "offset") => c.offset = double(value)?,
            _ => return Err(PropertyError::Unknown),
        }
        Ok(())
    }

    /// Semantic validation of this component's own properties.
    ///
    /// Returns the offending property and a reason.
    pub fn check_properties(&self) -> Result<(), (&'static str, String)> {
        match &self.kind {
            ComponentKind::Body(b) => {
                non_negative("mass", b.mass)?;
                all_finite("mass_center", &b.mass_center)?;
                b.inertia.iter().try_for_each(|v| non_negative("inertia", *v))
            }
            ComponentKind::OffsetFrame(f) => {
                all_finite("translation", &f.translation)?;
                all_finite("orientation", &f.orientation)
            }
            ComponentKind::Coordinate(c) => {
                all_finite("range", &c.range)?;
                finite("default_value", c.default_value)?;
                finite("default_speed_value", c.default_speed_value)
            }
            ComponentKind::Station(s) | ComponentKind::Marker(s) | ComponentKind::PathPoint(s) => {
                all_finite("location", &s.location)
            }
            ComponentKind::Geometry(g) => check_shape(&g.shape),
            ComponentKind::ContactGeometry(g) => {
                all_finite("location", &g.location)?;
                check_shape(&g.shape)
            }
            ComponentKind::HuntCrossleyForce(h) => {
                non_negative("stiffness", h.stiffness)?;
                non_negative("dissipation", h.dissipation)
            }
            ComponentKind::PathActuator(p) => non_negative("optimal_force", p.optimal_force),
            ComponentKind::CoordinateCouplerConstraint(c) => {
                finite("scale_factor", c.scale_factor)?;
                finite("offset", c.offset)
            }
            ComponentKind::Container | ComponentKind::Ground | ComponentKind::Joint(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_properties_roundtrip_through_setters() {
        let mut body = Component::body("femur", 1.0, [0.0; 3], [1.0; 3]);
        body.set_property("mass", &PropertyValue::Double(4.5)).unwrap();
        assert_eq!(body.property("mass"), Some(PropertyValue::Double(4.5)));
        assert!(body.property_names().contains(&"inertia"));
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let mut body = Component::body("femur", 1.0, [0.0; 3], [1.0; 3]);
        let err = body
            .set_property("mass", &PropertyValue::Bool(true))
            .unwrap_err();
        assert_eq!(err, PropertyError::TypeMismatch("double"));
        assert_eq!(
            body.set_property("nope", &PropertyValue::Double(1.0)),
            Err(PropertyError::Unknown)
        );
    }

    #[test]
    fn test_negative_mass_fails_validation() {
        let body = Component::body("femur", -1.0, [0.0; 3], [1.0; 3]);
        let (prop, _) = body.check_properties().unwrap_err();
        assert_eq!(prop, "mass");
    }

    #[test]
    fn test_shape_properties_follow_shape_kind() {
        let mut g = Component::geometry("g", "/ground", Shape::Cylinder { radius: 0.1, half_height: 0.2 });
        assert_eq!(g.property_names(), vec!["visible", "radius", "half_height"]);
        g.set_property("radius", &PropertyValue::Double(0.0)).unwrap();
        assert!(g.check_properties().is_err());
    }

    #[test]
    fn test_display_uses_three_decimals() {
        assert_eq!(PropertyValue::Double(0.5).to_string(), "0.500");
        assert_eq!(PropertyValue::Vec3([1.0, 2.0, 3.0]).to_string(), "(1.000, 2.000, 3.000)");
    }
}
