//! rigtrim-api-core: ids, values, paths and diagnostics shared by every rigtrim crate.

pub mod diagnostics;
pub mod ids;
pub mod json;
pub mod path;
pub mod value;

pub use diagnostics::{Diagnostic, Diagnostics, Severity, Subject};
pub use ids::{BehaviorId, Entity, IdAllocator, NodeId};
pub use path::{NodePath, PathError, PropertyPath};
pub use value::{Value, ValueKind};
