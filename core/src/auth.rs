//! Authentication mode resolution.
//!
//! pfSense's REST API accepts three mutually exclusive credential styles.
//! The provider never asks which one to use: it infers the mode from which
//! settings are present and refuses configurations that name more than one.
//!
//! | present setting   | mode    | required companion  |
//! |-------------------|---------|---------------------|
//! | `jwt_token`       | JWT     | none                |
//! | `user`            | Local   | `password`          |
//! | `api_client_id`   | Token   | `api_client_token`  |
//!
//! Empty strings count as absent.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

use crate::error::ConfigError;

/// Credential-free label for an `AuthMode`, safe to log and to embed in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    None,
    Local,
    Jwt,
    Token,
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthKind::None => "none",
            AuthKind::Local => "local",
            AuthKind::Jwt => "jwt",
            AuthKind::Token => "token",
        })
    }
}

/// The single resolved authentication mechanism, with its credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// No credentials; the server decides whether anonymous access is allowed.
    None,
    Local { user: String, password: String },
    Jwt { token: String },
    Token { client_id: String, client_token: String },
}

impl AuthMode {
    pub fn kind(&self) -> AuthKind {
        match self {
            AuthMode::None => AuthKind::None,
            AuthMode::Local { .. } => AuthKind::Local,
            AuthMode::Jwt { .. } => AuthKind::Jwt,
            AuthMode::Token { .. } => AuthKind::Token,
        }
    }

    /// Value of the `Authorization` header for this mode, if any.
    pub fn authorization_header(&self) -> Option<String> {
        match self {
            AuthMode::None => None,
            AuthMode::Local { user, password } => {
                Some(format!("Basic {}", STANDARD.encode(format!("{user}:{password}"))))
            }
            AuthMode::Jwt { token } => Some(format!("Bearer {token}")),
            AuthMode::Token {
                client_id,
                client_token,
            } => Some(format!("{client_id} {client_token}")),
        }
    }
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::None => f.write_str("None"),
            AuthMode::Local { user, .. } => f
                .debug_struct("Local")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            AuthMode::Jwt { .. } => f.debug_struct("Jwt").field("token", &"<redacted>").finish(),
            AuthMode::Token { client_id, .. } => f
                .debug_struct("Token")
                .field("client_id", client_id)
                .field("client_token", &"<redacted>")
                .finish(),
        }
    }
}

/// The optional auth settings as the user supplied them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthSettings {
    pub user: Option<String>,
    pub password: Option<String>,
    pub jwt_token: Option<String>,
    pub api_client_id: Option<String>,
    pub api_client_token: Option<String>,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AuthSettings")
            .field("user", &self.user)
            .field("password", &secret(&self.password))
            .field("jwt_token", &secret(&self.jwt_token))
            .field("api_client_id", &self.api_client_id)
            .field("api_client_token", &secret(&self.api_client_token))
            .finish()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Derive the one authentication mode implied by `settings`.
///
/// Missing companions are reported before ambiguity, in the order JWT,
/// local, token.
pub fn resolve_auth(settings: &AuthSettings) -> Result<AuthMode, ConfigError> {
    let mut candidates = Vec::with_capacity(1);

    if let Some(token) = present(&settings.jwt_token) {
        candidates.push(AuthMode::Jwt {
            token: token.to_string(),
        });
    }

    if let Some(user) = present(&settings.user) {
        let password = present(&settings.password).ok_or(ConfigError::MissingCredential {
            present: "user",
            missing: "password",
        })?;
        candidates.push(AuthMode::Local {
            user: user.to_string(),
            password: password.to_string(),
        });
    } else if present(&settings.password).is_some() {
        warn!("password is set without user; ignoring it");
    }

    if let Some(client_id) = present(&settings.api_client_id) {
        let client_token =
            present(&settings.api_client_token).ok_or(ConfigError::MissingCredential {
                present: "api_client_id",
                missing: "api_client_token",
            })?;
        candidates.push(AuthMode::Token {
            client_id: client_id.to_string(),
            client_token: client_token.to_string(),
        });
    } else if present(&settings.api_client_token).is_some() {
        warn!("api_client_token is set without api_client_id; ignoring it");
    }

    if candidates.len() > 1 {
        return Err(ConfigError::AmbiguousAuth {
            modes: candidates.iter().map(AuthMode::kind).collect(),
        });
    }
    Ok(candidates.pop().unwrap_or(AuthMode::None))
}
