//! Error types for provider configuration and pfSense API operations.
//!
//! # Design
//! Configuration problems and API problems are separate enums because they
//! surface at different times: `ConfigError` aborts provider initialization
//! before any request is built, while `ApiError` comes back from individual
//! resource operations. `NotFound` gets a dedicated variant because resource
//! reads distinguish "the object is gone" from "the server misbehaved".

use crate::auth::AuthKind;

/// Errors raised while resolving a `ProviderSettings` into a `ProviderConfig`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The `url` setting is not a bare HTTP/HTTPS origin.
    #[error("\"url\" must be a bare HTTP/HTTPS origin, got {value:?}: {reason}")]
    InvalidEndpoint { value: String, reason: &'static str },

    /// An auth setting was given without the setting it must be paired with.
    #[error("{missing} is required when {present} is provided")]
    MissingCredential {
        present: &'static str,
        missing: &'static str,
    },

    /// More than one authentication mode was configured.
    #[error("only one form of authentication should be provided, got {}", join_kinds(.modes))]
    AmbiguousAuth { modes: Vec<AuthKind> },

    /// TLS verification was demanded for a plain-HTTP endpoint.
    #[error("cannot enforce TLS for url {url}")]
    TlsPolicyConflict { url: String },

    #[error("timeout must be at least one second")]
    InvalidTimeout,

    /// An environment variable held a value of the wrong type.
    #[error("invalid value {value:?} for {key}")]
    InvalidSetting { key: &'static str, value: String },

    /// The settings file could not be read or parsed.
    #[error("failed to load provider settings: {0}")]
    Load(String),
}

fn join_kinds(modes: &[AuthKind]) -> String {
    modes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors returned by `PfSenseClient` parse methods and by transports.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404, or a filtered read matched nothing.
    #[error("resource not found")]
    NotFound,

    /// The server rejected the configured credentials (401/403).
    #[error("authentication rejected (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// Any other unexpected status. `message` is the envelope message when
    /// the body could be decoded, the raw body otherwise.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// A declared resource failed local validation before any request.
    #[error("invalid resource: {0}")]
    Validation(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request never produced a response (DNS, TLS, timeout...).
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Whether repeating the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::HttpError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
