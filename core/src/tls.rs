//! TLS verification policy.
//!
//! | scheme | `skip_tls` | skip verification |
//! |--------|------------|-------------------|
//! | https  | unset      | no                |
//! | https  | set        | as given          |
//! | http   | unset      | yes               |
//! | http   | `true`     | yes               |
//! | http   | `false`    | error             |

use crate::endpoint::{Endpoint, Scheme};
use crate::error::ConfigError;

/// Compute whether certificate verification is skipped for `endpoint`.
///
/// Asking to verify certificates on a plain-HTTP endpoint is a
/// `TlsPolicyConflict`: there is no certificate to verify.
pub fn resolve_skip_tls(endpoint: &Endpoint, skip_tls: Option<bool>) -> Result<bool, ConfigError> {
    match (endpoint.scheme(), skip_tls) {
        (Scheme::Https, None) => Ok(false),
        (Scheme::Https, Some(skip)) => Ok(skip),
        (Scheme::Http, None | Some(true)) => Ok(true),
        (Scheme::Http, Some(false)) => Err(ConfigError::TlsPolicyConflict {
            url: endpoint.as_str().to_string(),
        }),
    }
}
