//! Configuration resolution and API client core for the pfSense provider.
//!
//! # Overview
//! Turns the provider settings (`url`, credentials, `skip_tls`, `timeout`)
//! into an immutable `ProviderConfig`, builds a `PfSenseClient` handle from
//! it, and maps firewall aliases and DHCP static mappings onto the pfSense
//! REST API.
//!
//! # Design
//! - Resolution is a single validate-then-construct pass: endpoint, TLS
//!   policy, auth mode, timeout. The first failure aborts it.
//! - `PfSenseClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network; a `Transport` runs the round-trip.
//! - `Provider` pairs the two and implements declarative apply/delete.

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod resource;
pub mod tls;
pub mod transport;
pub mod types;

pub use auth::{resolve_auth, AuthKind, AuthMode, AuthSettings};
pub use client::PfSenseClient;
pub use config::{ProviderConfig, ProviderSettings, DEFAULT_TIMEOUT_SECS};
pub use endpoint::{validate_endpoint, Endpoint, Scheme};
pub use error::{ApiError, ConfigError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use resource::{plan_alias, plan_static_mapping, Outcome, Plan, Provider};
pub use tls::resolve_skip_tls;
pub use transport::{Transport, UreqTransport};
pub use types::{AliasType, ApiEnvelope, FirewallAlias, StaticMapping};
