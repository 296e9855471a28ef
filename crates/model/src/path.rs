//! Absolute component paths
//!
//! Components are addressed by slash-separated absolute paths such as
//! `/jointset/knee_r/knee_angle_r`. The model itself is `/`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Absolute path to a component within a [`crate::Model`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentPath(String);

impl ComponentPath {
    /// Parse a path, normalizing repeated and trailing separators.
    ///
    /// Relative input is treated as rooted at the model.
    pub fn new(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len() + 1);
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            out.push('/');
            out.push_str(segment);
        }
        if out.is_empty() {
            out.push('/');
        }
        Self(out)
    }

    /// Path of the model itself
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path segments, root excluded
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments below the root
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Name of the addressed component (last segment, empty for the root)
    pub fn component_name(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    /// Path of the owning component, `None` for the root
    pub fn parent(&self) -> Option<ComponentPath> {
        if self.is_root() {
            return None;
        }
        let idx = self.0.rfind('/').unwrap_or(0);
        Some(Self::new(&self.0[..idx]))
    }

    /// Child path `self/name`
    pub fn join(&self, name: &str) -> ComponentPath {
        if self.is_root() {
            Self::new(name)
        } else {
            Self::new(&format!("{}/{}", self.0, name))
        }
    }

    /// True if `self` is `other` or lies beneath it
    pub fn starts_with(&self, other: &ComponentPath) -> bool {
        if other.is_root() {
            return true;
        }
        self.0 == other.0
            || (self.0.starts_with(&other.0) && self.0.as_bytes().get(other.0.len()) == Some(&b'/'))
    }

    /// Re-root `self` from `old_prefix` onto `new_prefix`, if it lies beneath `old_prefix`
    pub fn rebase(&self, old_prefix: &ComponentPath, new_prefix: &ComponentPath) -> Option<ComponentPath> {
        if !self.starts_with(old_prefix) {
            return None;
        }
        let rest = &self.0[old_prefix.0.len().min(self.0.len())..];
        Some(Self::new(&format!("{}{}", new_prefix.0, rest)))
    }
}

impl Default for ComponentPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ComponentPath {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_separators() {
        assert_eq!(ComponentPath::new("//bodyset//femur/").as_str(), "/bodyset/femur");
        assert_eq!(ComponentPath::new("bodyset/femur").as_str(), "/bodyset/femur");
        assert_eq!(ComponentPath::new("").as_str(), "/");
    }

    #[test]
    fn test_parent_and_name() {
        let p = ComponentPath::new("/jointset/knee/knee_angle");
        assert_eq!(p.component_name(), "knee_angle");
        assert_eq!(p.parent().unwrap().as_str(), "/jointset/knee");
        assert_eq!(ComponentPath::new("/ground").parent().unwrap(), ComponentPath::root());
        assert!(ComponentPath::root().parent().is_none());
    }

    #[test]
    fn test_join() {
        assert_eq!(ComponentPath::root().join("ground").as_str(), "/ground");
        assert_eq!(ComponentPath::new("/bodyset").join("tibia").as_str(), "/bodyset/tibia");
    }

    #[test]
    fn test_starts_with_respects_segment_boundaries() {
        let p = ComponentPath::new("/bodyset/femur_r");
        assert!(p.starts_with(&ComponentPath::new("/bodyset")));
        assert!(!p.starts_with(&ComponentPath::new("/bodyset/femur")));
        assert!(p.starts_with(&ComponentPath::root()));
    }

    #[test]
    fn test_rebase() {
        let p = ComponentPath::new("/jointset/knee/knee_angle");
        let moved = p
            .rebase(&ComponentPath::new("/jointset/knee"), &ComponentPath::new("/jointset/hinge"))
            .unwrap();
        assert_eq!(moved.as_str(), "/jointset/hinge/knee_angle");
        assert!(p.rebase(&ComponentPath::new("/bodyset"), &ComponentPath::root()).is_none());
    }
}
