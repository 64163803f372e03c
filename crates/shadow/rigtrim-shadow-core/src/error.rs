use thiserror::Error;

/// Conditions that abort the whole optimization pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShadowError {
    #[error("merge groups depend on each other in a cycle: {}", .groups.join(", "))]
    CircularDependency { groups: Vec<String> },
    #[error("unknown merge group '{0}'")]
    UnknownGroup(String),
}
