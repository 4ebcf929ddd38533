//! Validation of the configured pfSense origin.
//!
//! The provider talks to exactly one origin. Anything after the authority
//! (path, query, fragment) would be silently dropped or mangled when API
//! paths are joined onto it, so such values are rejected up front.

use url::Url;

use crate::error::ConfigError;

/// URL scheme of a validated endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

/// A validated `http://` or `https://` origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    scheme: Scheme,
    raw: String,
}

impl Endpoint {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        validate_endpoint(value)
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The endpoint exactly as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed origin. Its path is always `/`.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Check that `value` is an absolute `http`/`https` URL with a host and no
/// path, query or fragment.
pub fn validate_endpoint(value: &str) -> Result<Endpoint, ConfigError> {
    let invalid = |reason: &'static str| ConfigError::InvalidEndpoint {
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value).map_err(|_| invalid("not an absolute URL"))?;
    let scheme = match url.scheme() {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        _ => return Err(invalid("scheme must be http or https")),
    };
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() {
        return Err(invalid("must not contain a query"));
    }
    if url.fragment().is_some() {
        return Err(invalid("must not contain a fragment"));
    }
    // `Url` normalizes an absent path to "/", so look at the raw authority
    // section to tell "https://fw" from "https://fw/".
    let raw_has_path = value
        .trim()
        .split_once("://")
        .is_some_and(|(_, rest)| rest.contains('/'));
    if url.path() != "/" || raw_has_path {
        return Err(invalid("must not contain a path"));
    }

    Ok(Endpoint {
        url,
        scheme,
        raw: value.trim().to_string(),
    })
}
