//! Node and property path parsing and formatting.
//!
//! Grammar (engine-agnostic):
//!   node path:      segment/segment/...      (relative to the scene root, root = "")
//!   property path:  field.field[index].field
//!   Examples:
//!   "Armature/Hips/Spine" -> segments=["Armature","Hips","Spine"]
//!   "localPosition.x"     -> root="localPosition", segments=["localPosition","x"]
//!   "materials[1]"        -> root="materials", segments=["materials","[1]"]
//!
//! Both paths are string-backed and serialize as plain strings.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid node path '{path}': empty segment")]
    EmptySegment { path: String },
    #[error("invalid property path '{path}': {reason}")]
    InvalidProperty { path: String, reason: &'static str },
}

/// Path of a node relative to the scene root. The root itself is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a `/`-separated path. Empty input is the root; empty segments are rejected.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let segments: Vec<String> = s.split('/').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment { path: s.to_string() });
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<NodePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn join(&self, name: &str) -> NodePath {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Append every segment of `rest` to this path.
    pub fn concat(&self, rest: &NodePath) -> NodePath {
        let mut segments = self.segments.clone();
        segments.extend(rest.segments.iter().cloned());
        Self { segments }
    }

    /// Proper ancestors, longest first, ending with the root.
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> + '_ {
        (0..self.segments.len()).rev().map(move |len| Self {
            segments: self.segments[..len].to_vec(),
        })
    }

    /// Remainder of this path below `prefix`, if `prefix` is an ancestor-or-self.
    pub fn strip_prefix(&self, prefix: &NodePath) -> Option<NodePath> {
        if prefix.segments.len() > self.segments.len() {
            return None;
        }
        if self.segments[..prefix.segments.len()] != prefix.segments[..] {
            return None;
        }
        Some(Self {
            segments: self.segments[prefix.segments.len()..].to_vec(),
        })
    }

    pub fn starts_with(&self, prefix: &NodePath) -> bool {
        self.strip_prefix(prefix).is_some()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for NodePath {
    type Err = PathError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodePath::parse(s)
    }
}

impl Serialize for NodePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D>(deserializer: D) -> Result<NodePath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NodePath::parse(&s).map_err(de::Error::custom)
    }
}

/// Dotted/indexed property name scoped to a node or behavior instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyPath {
    raw: String,
}

impl PropertyPath {
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Err(PathError::InvalidProperty {
                path: s.to_string(),
                reason: "empty property",
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(PathError::InvalidProperty {
                path: s.to_string(),
                reason: "contains whitespace",
            });
        }
        let mut depth = 0i32;
        for c in s.chars() {
            match c {
                '[' => depth += 1,
                ']' => depth -= 1,
                _ => {}
            }
            if !(0..=1).contains(&depth) {
                return Err(PathError::InvalidProperty {
                    path: s.to_string(),
                    reason: "unbalanced index brackets",
                });
            }
        }
        if depth != 0 {
            return Err(PathError::InvalidProperty {
                path: s.to_string(),
                reason: "unbalanced index brackets",
            });
        }
        if s.split('.').any(str::is_empty) {
            return Err(PathError::InvalidProperty {
                path: s.to_string(),
                reason: "empty field segment",
            });
        }
        Ok(Self { raw: s.to_string() })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Segments split on `.` and before each `[index]`.
    pub fn segments(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for field in self.raw.split('.') {
            let mut rest = field;
            while let Some(open) = rest
                .char_indices()
                .skip(1)
                .find(|(_, c)| *c == '[')
                .map(|(i, _)| i)
            {
                out.push(&rest[..open]);
                rest = &rest[open..];
            }
            out.push(rest);
        }
        out
    }

    /// First segment; e.g. `localPosition` for `localPosition.x`.
    pub fn root(&self) -> &str {
        let end = self
            .raw
            .find(|c| c == '.' || c == '[')
            .unwrap_or(self.raw.len());
        &self.raw[..end]
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for PropertyPath {
    type Err = PathError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyPath::parse(s)
    }
}
