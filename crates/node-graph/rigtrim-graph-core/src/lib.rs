//! rigtrim graph core
//!
//! Builds the dependency graph of a scene (what each node and behavior needs
//! to have any effect), marks what is reachable from active entrypoints, and
//! plans the sweep and toggle rewrites that follow from it.

pub mod builder;
mod builtin;
pub mod reachability;
pub mod registry;
pub mod toggle;
pub mod types;

pub use builder::DependencyGraphBuilder;
pub use reachability::{ActivenessMap, LivenessSet, Reachability, SweepPlan};
pub use registry::{ParseContext, Parser, ParserRegistry};
pub use toggle::{TogglePlanner, ToggleRewrite};
pub use types::{DependencyEdge, DependencyGraph, DependencyKind};
