use thiserror::Error;

/// Errors raised while building an aspect configuration.
///
/// These are programmer mistakes and surface at construction time, before
/// any request is served.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unique_name must not be empty")]
    EmptyUniqueName,

    #[error("ttl must be -1 (never expire) or 1..={limit} seconds, got {got}")]
    TtlOutOfRange { got: i64, limit: i64 },

    #[error("tags must not contain empty strings")]
    EmptyTag,
}

/// Errors raised while binding a wrapped operation's runtime arguments.
///
/// Binding failures mean the argument type does not describe a named
/// parameter set; they propagate to the caller instead of being swallowed
/// like store failures.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("failed to serialize cache arguments: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cache arguments must serialize to a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}

/// A store interaction failed because the backend is unreachable.
///
/// The aspects treat this as "cache unusable for this call" and fall
/// through to the wrapped operation; it never crosses into business logic.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(reason: impl std::fmt::Display) -> Self {
        Self::Unavailable(reason.to_string())
    }
}
