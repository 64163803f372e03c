//! Value: static property values and animated constants.
//! Numeric payloads use f32, matching the curve data they are compared against.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse kind of a [`Value`], handy for quick dispatch.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Bool,
    Int,
    Vec3,
    Quat,
    Text,
    Asset,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// Boolean flag
    Bool(bool),

    /// Integer (enum-like properties)
    Int(i32),

    /// 3D vector
    Vec3([f32; 3]),

    /// Quaternion (x, y, z, w)
    Quat([f32; 4]),

    /// Text; also used for asset-name properties such as controller references
    Text(String),

    /// Reference to an external asset (material, mesh) by name
    Asset(String),
}

impl Value {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Quat(_) => ValueKind::Quat,
            Value::Text(_) => ValueKind::Text,
            Value::Asset(_) => ValueKind::Asset,
        }
    }

    /// Interpret the value as a flag. Curves drive flags with floats, so any
    /// non-zero number counts as `true`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Float(f) => Some(*f != 0.0),
            Value::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f32),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Asset(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn quat(x: f32, y: f32, z: f32, w: f32) -> Self {
        Value::Quat([x, y, z, w])
    }

    pub fn identity_quat() -> Self {
        Value::Quat([0.0, 0.0, 0.0, 1.0])
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Vec3([x, y, z]) => write!(f, "({x}, {y}, {z})"),
            Value::Quat([x, y, z, w]) => write!(f, "({x}, {y}, {z}, {w})"),
            Value::Text(s) => write!(f, "\"{s}\""),
            Value::Asset(s) => write!(f, "asset:{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_numbers() {
        assert_eq!(Value::Float(0.0).as_bool(), Some(false));
        assert_eq!(Value::Float(0.3).as_bool(), Some(true));
        assert_eq!(Value::Int(1).as_bool(), Some(true));
        assert_eq!(Value::Text("x".into()).as_bool(), None);
    }

    #[test]
    fn serde_uses_tagged_layout() {
        let json = serde_json::to_value(Value::Float(1.5)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "float", "data": 1.5 }));
        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, Value::Float(1.5));
    }
}
