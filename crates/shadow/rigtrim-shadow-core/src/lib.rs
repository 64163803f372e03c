//! rigtrim shadow core
//!
//! Keeps an identity-preserving copy of the scene hierarchy next to the real
//! one while passes restructure it, then compiles the difference into a
//! [`MappingTable`] that animation rebinding can query.

pub mod error;
pub mod graph;
pub mod groups;
pub mod mapping;

pub use error::ShadowError;
pub use graph::{PropertyRenames, ShadowBehaviorId, ShadowGraph, ShadowNodeId};
pub use groups::MergeGroups;
pub use mapping::{BindingMapping, ComponentMapping, MappingTable};
