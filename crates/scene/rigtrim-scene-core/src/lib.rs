//! rigtrim-scene-core
//!
//! The live scene graph the optimizer reads and rewrites: a tree of
//! [`SceneNode`]s, each owning a node-defining `Transform` plus any number of
//! typed [`BehaviorInstance`]s. Entities live in an arena addressed by stable
//! ids that are never reused.

pub mod behavior;
pub mod document;
pub mod scene;

pub use behavior::{props, BehaviorInstance, BehaviorType, PropertyValue};
pub use document::{BehaviorDocument, NodeDocument, SceneDocument};
pub use rigtrim_api_core::{BehaviorId, Entity, NodeId, NodePath, Value};
pub use scene::{SceneError, SceneGraph, SceneNode};
