//! rigtrim animation core
//!
//! Motion-graph data model (controllers, layers, state machines, blend trees,
//! clips) and the analyzer that turns it into a [`ModificationSummary`]: for
//! every animated `(entity, property)` pair, whether the value is always
//! constant, sometimes constant, or variable at runtime.

pub mod analyzer;
pub mod binding;
pub mod config;
pub mod data;
pub mod modification;
pub mod summary;

// Re-exports for the optimizer passes
pub use analyzer::{AnalysisError, Analyzer};
pub use binding::{SceneResolver, TargetResolver};
pub use config::AnalyzerConfig;
pub use data::{
    BindingTarget, BlendKind, Clip, Controller, Curve, CurveBinding, Keyframe, Layer,
    LayerBlending, Motion, MotionLibrary, ObjectKeyframe, OverrideTable, SlotKind, State,
    StateBehavior, StateMachine,
};
pub use modification::{LayerApplication, ModificationSet, PropertyModification};
pub use summary::{
    behavior_activeness, behavior_self_activeness, node_activeness, node_self_activeness,
    Activeness, ModificationSummary,
};
