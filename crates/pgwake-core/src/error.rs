//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration parsing.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while turning raw configuration into typed values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown resource kind in target template: {0}")]
    UnknownKind(String),

    #[error("target template must contain {{base}}: {0}")]
    MissingPlaceholder(String),

    #[error("at least one scale target template is required")]
    NoTargets,

    #[error("invalid watch scope: {0}")]
    InvalidScope(String),
}
