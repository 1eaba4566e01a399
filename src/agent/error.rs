//! Generation error types

use thiserror::Error;

/// Failure of a single generation call
///
/// The `Display` form is the human-readable cause embedded in degraded
/// stage outputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Quota exceeded: {0}")]
    Quota(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Empty response from generator")]
    EmptyResponse,

    #[error("Internal error: {0}")]
    Internal(String),
}
