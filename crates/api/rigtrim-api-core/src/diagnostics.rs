//! Structured diagnostics accumulated during a pass.
//!
//! Every recoverable failure mode emits exactly one [`Diagnostic`] carrying a
//! stable code string, a severity and the objects it concerns. Subjects are
//! ordered most specific first (behavior before node, node before asset) so a
//! host report can point at the exact offending object.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{BehaviorId, Entity, NodeId};

/// Stable diagnostic codes.
pub mod codes {
    pub const UNKNOWN_MOTION_NODE: &str = "unknown-motion-node";
    pub const UNKNOWN_BEHAVIOR_TYPE: &str = "unknown-behavior-type";
    pub const EMPTY_MOTION_SLOT: &str = "empty-motion-slot";
    pub const INVALID_BLEND_TYPE: &str = "invalid-blend-type";
    pub const MISSING_CLIP: &str = "missing-clip";
    pub const MISSING_CONTROLLER: &str = "missing-controller";
    pub const PARSER_INHERITANCE_CYCLE: &str = "parser-inheritance-cycle";
    pub const INVALID_SYNCED_LAYER: &str = "invalid-synced-layer";
    pub const NODE_REMOVED: &str = "node-removed";
    pub const BEHAVIOR_REMOVED: &str = "behavior-removed";
    pub const NODE_FLATTENED: &str = "node-flattened";
    pub const BEHAVIOR_TOGGLED: &str = "behavior-toggled";
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Object a diagnostic is attributed to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Subject {
    Behavior(BehaviorId),
    Node(NodeId),
    Asset(String),
}

impl From<Entity> for Subject {
    fn from(entity: Entity) -> Self {
        match entity {
            Entity::Node(id) => Subject::Node(id),
            Entity::Behavior(id) => Subject::Behavior(id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity,
            message: message.into(),
            subjects: Vec::new(),
        }
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Most specific subject, if any.
    pub fn primary_subject(&self) -> Option<&Subject> {
        self.subjects.first()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.severity, self.code, self.message)
    }
}

/// Accumulator for diagnostics; mirrors each entry to the `log` facade.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => log::info!("{diagnostic}"),
            Severity::Warning => log::warn!("{diagnostic}"),
            Severity::Error => log::error!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, code: &str, message: impl Into<String>, subjects: Vec<Subject>) {
        self.push(Diagnostic {
            subjects,
            ..Diagnostic::new(Severity::Info, code, message)
        });
    }

    pub fn warning(&mut self, code: &str, message: impl Into<String>, subjects: Vec<Subject>) {
        self.push(Diagnostic {
            subjects,
            ..Diagnostic::new(Severity::Warning, code, message)
        });
    }

    pub fn error(&mut self, code: &str, message: impl Into<String>, subjects: Vec<Subject>) {
        self.push(Diagnostic {
            subjects,
            ..Diagnostic::new(Severity::Error, code, message)
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.code == code)
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    /// Drop entries below `min`.
    pub fn retain_at_least(&mut self, min: Severity) {
        self.entries.retain(|d| d.severity >= min);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_code_and_severity() {
        let mut diags = Diagnostics::new();
        diags.warning(codes::UNKNOWN_BEHAVIOR_TYPE, "x", vec![Subject::Behavior(BehaviorId(3))]);
        diags.info(codes::NODE_REMOVED, "y", vec![Subject::Node(NodeId(1))]);
        assert_eq!(diags.with_code(codes::UNKNOWN_BEHAVIOR_TYPE).count(), 1);
        assert!(!diags.has_errors());

        diags.retain_at_least(Severity::Warning);
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags.iter().next().and_then(Diagnostic::primary_subject),
            Some(&Subject::Behavior(BehaviorId(3)))
        );
    }
}
