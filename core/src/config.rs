//! Provider settings and their resolution into an immutable `ProviderConfig`.
//!
//! # Design
//! `ProviderSettings` is what the user wrote: every field optional, read from
//! TOML and topped up from `PFSENSE_*` environment variables. `resolve` runs
//! the validate-then-construct pipeline once (endpoint, TLS policy, auth,
//! timeout) and either returns a `ProviderConfig` or the first error. The
//! resolved config has no setters; share it behind an `Arc`.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::auth::{resolve_auth, AuthMode, AuthSettings};
use crate::endpoint::{validate_endpoint, Endpoint};
use crate::error::ConfigError;
use crate::tls::resolve_skip_tls;

/// Request timeout applied when `timeout` is not configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

pub const ENV_URL: &str = "PFSENSE_URL";
pub const ENV_USER: &str = "PFSENSE_USER";
pub const ENV_PASSWORD: &str = "PFSENSE_PASSWORD";
pub const ENV_JWT_TOKEN: &str = "PFSENSE_JWT_TOKEN";
pub const ENV_API_CLIENT_ID: &str = "PFSENSE_API_CLIENT_ID";
pub const ENV_API_CLIENT_TOKEN: &str = "PFSENSE_API_CLIENT_TOKEN";
pub const ENV_SKIP_TLS: &str = "PFSENSE_SKIP_TLS";
pub const ENV_TIMEOUT: &str = "PFSENSE_TIMEOUT";

/// Raw provider settings, as written in the provider block.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// Required, but may be supplied through `PFSENSE_URL`.
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub jwt_token: Option<String>,
    pub api_client_id: Option<String>,
    pub api_client_token: Option<String>,
    pub skip_tls: Option<bool>,
    /// Seconds.
    pub timeout: Option<u64>,
}

impl ProviderSettings {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Load(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Fill every unset field from `lookup(PFSENSE_*)`. Values already set
    /// win over the environment.
    pub fn with_env_fallback<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fill(&mut self.url, &lookup, ENV_URL);
        fill(&mut self.user, &lookup, ENV_USER);
        fill(&mut self.password, &lookup, ENV_PASSWORD);
        fill(&mut self.jwt_token, &lookup, ENV_JWT_TOKEN);
        fill(&mut self.api_client_id, &lookup, ENV_API_CLIENT_ID);
        fill(&mut self.api_client_token, &lookup, ENV_API_CLIENT_TOKEN);

        if self.skip_tls.is_none() {
            if let Some(raw) = lookup(ENV_SKIP_TLS) {
                self.skip_tls = Some(parse_bool(&raw).ok_or(ConfigError::InvalidSetting {
                    key: ENV_SKIP_TLS,
                    value: raw.clone(),
                })?);
            }
        }
        if self.timeout.is_none() {
            if let Some(raw) = lookup(ENV_TIMEOUT) {
                self.timeout = Some(raw.trim().parse().map_err(|_| ConfigError::InvalidSetting {
                    key: ENV_TIMEOUT,
                    value: raw.clone(),
                })?);
            }
        }
        Ok(self)
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            user: self.user.clone(),
            password: self.password.clone(),
            jwt_token: self.jwt_token.clone(),
            api_client_id: self.api_client_id.clone(),
            api_client_token: self.api_client_token.clone(),
        }
    }

    /// Validate every setting and build the immutable `ProviderConfig`.
    pub fn resolve(&self) -> Result<ProviderConfig, ConfigError> {
        let url = self.url.as_deref().ok_or(ConfigError::InvalidEndpoint {
            value: String::new(),
            reason: "url is required",
        })?;
        let endpoint = validate_endpoint(url)?;
        let skip_tls_verify = resolve_skip_tls(&endpoint, self.skip_tls)?;
        let auth = resolve_auth(&self.auth_settings())?;
        let timeout_secs = self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let config = ProviderConfig {
            endpoint,
            auth,
            skip_tls_verify,
            request_timeout: Duration::from_secs(timeout_secs),
        };
        debug!(
            endpoint = %config.endpoint,
            auth = %config.auth.kind(),
            skip_tls = config.skip_tls_verify,
            timeout_secs,
            "resolved provider config"
        );
        Ok(config)
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("url", &self.url)
            .field("auth", &self.auth_settings())
            .field("skip_tls", &self.skip_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn fill<F>(slot: &mut Option<String>, lookup: &F, key: &str)
where
    F: Fn(&str) -> Option<String>,
{
    if slot.is_none() {
        *slot = lookup(key);
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Fully resolved provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    endpoint: Endpoint,
    auth: AuthMode,
    skip_tls_verify: bool,
    request_timeout: Duration,
}

impl ProviderConfig {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn auth(&self) -> &AuthMode {
        &self.auth
    }

    pub fn skip_tls_verify(&self) -> bool {
        self.skip_tls_verify
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// One line per setting, credentials omitted.
impl fmt::Display for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "endpoint: {}", self.endpoint)?;
        writeln!(f, "auth:     {}", self.auth.kind())?;
        writeln!(f, "skip_tls: {}", self.skip_tls_verify)?;
        write!(f, "timeout:  {}s", self.request_timeout.as_secs())
    }
}
