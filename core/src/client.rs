//! Request builder and response parser for the pfSense REST API.
//!
//! # Design
//! `PfSenseClient` is the handle every resource operation receives. It holds
//! the shared `ProviderConfig` and the pre-joined resource URLs, and carries
//! no mutable state between calls. Each CRUD operation is split into a
//! `build_*` method that produces an `HttpRequest` (with the auth header for
//! the resolved mode) and a `parse_*` method that consumes an
//! `HttpResponse`. A `Transport` executes the round-trip in between.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::ProviderConfig;
use crate::error::{ApiError, ConfigError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AliasRecord, AliasUpdate, ApiEnvelope, FirewallAlias, StaticMapping};

pub const API_PREFIX: &str = "api/v1/";
pub const ALIAS_PATH: &str = "firewall/alias";
pub const STATIC_MAPPING_PATH: &str = "services/dhcpd/static_mapping";

/// Configured, cloneable handle to one pfSense instance.
#[derive(Debug, Clone)]
pub struct PfSenseClient {
    config: Arc<ProviderConfig>,
    alias_url: Url,
    static_mapping_url: Url,
}

impl PfSenseClient {
    /// Build the client handle. Performs no I/O.
    pub fn new(config: Arc<ProviderConfig>) -> Result<Self, ConfigError> {
        let join = |path: &str| {
            config
                .endpoint()
                .url()
                .join(API_PREFIX)
                .and_then(|base| base.join(path))
                .map_err(|_| ConfigError::InvalidEndpoint {
                    value: config.endpoint().as_str().to_string(),
                    reason: "cannot derive API URL",
                })
        };
        let alias_url = join(ALIAS_PATH)?;
        let static_mapping_url = join(STATIC_MAPPING_PATH)?;
        Ok(Self {
            config,
            alias_url,
            static_mapping_url,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn request(&self, method: HttpMethod, base: &Url, query: &[(&str, &str)], body: Option<String>) -> HttpRequest {
        let mut url = base.clone();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let mut headers = Vec::with_capacity(2);
        if let Some(value) = self.config.auth().authorization_header() {
            headers.push(("authorization".to_string(), value));
        }
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        }
    }

    fn json_request<T: Serialize>(&self, method: HttpMethod, base: &Url, payload: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(self.request(method, base, &[], Some(body)))
    }

    // -- firewall aliases ---------------------------------------------------

    pub fn build_list_aliases(&self) -> HttpRequest {
        self.request(HttpMethod::Get, &self.alias_url, &[], None)
    }

    pub fn build_get_alias(&self, name: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &self.alias_url, &[("name", name)], None)
    }

    pub fn build_create_alias(&self, alias: &FirewallAlias) -> Result<HttpRequest, ApiError> {
        alias.validate()?;
        self.json_request(HttpMethod::Post, &self.alias_url, alias)
    }

    /// Replace the alias currently named `current_name` with `alias`, which
    /// may carry a new name.
    pub fn build_update_alias(&self, current_name: &str, alias: &FirewallAlias) -> Result<HttpRequest, ApiError> {
        alias.validate()?;
        let payload = AliasUpdate {
            id: current_name,
            alias,
        };
        self.json_request(HttpMethod::Put, &self.alias_url, &payload)
    }

    pub fn build_delete_alias(&self, name: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &self.alias_url, &[("id", name)], None)
    }

    pub fn parse_list_aliases(&self, response: HttpResponse) -> Result<Vec<FirewallAlias>, ApiError> {
        let records: Vec<AliasRecord> = decode(response)?;
        Ok(records.into_iter().map(FirewallAlias::from).collect())
    }

    /// A filtered read that matched nothing is `NotFound`.
    pub fn parse_get_alias(&self, response: HttpResponse) -> Result<FirewallAlias, ApiError> {
        let records: Vec<AliasRecord> = decode(response)?;
        records
            .into_iter()
            .next()
            .map(FirewallAlias::from)
            .ok_or(ApiError::NotFound)
    }

    pub fn parse_create_alias(&self, response: HttpResponse) -> Result<FirewallAlias, ApiError> {
        decode::<AliasRecord>(response).map(FirewallAlias::from)
    }

    pub fn parse_update_alias(&self, response: HttpResponse) -> Result<FirewallAlias, ApiError> {
        decode::<AliasRecord>(response).map(FirewallAlias::from)
    }

    pub fn parse_delete_alias(&self, response: HttpResponse) -> Result<(), ApiError> {
        decode::<serde_json::Value>(response).map(|_| ())
    }

    // -- DHCP static mappings -----------------------------------------------

    pub fn build_list_static_mappings(&self, interface: &str) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &self.static_mapping_url,
            &[("interface", interface)],
            None,
        )
    }

    pub fn build_create_static_mapping(&self, mapping: &StaticMapping) -> Result<HttpRequest, ApiError> {
        mapping.validate()?;
        let mut payload = mapping.clone();
        payload.id = None;
        self.json_request(HttpMethod::Post, &self.static_mapping_url, &payload)
    }

    /// `mapping.id` selects the lease to replace and must be set.
    pub fn build_update_static_mapping(&self, mapping: &StaticMapping) -> Result<HttpRequest, ApiError> {
        mapping.validate()?;
        if mapping.id.is_none() {
            return Err(ApiError::Validation(
                "static mapping update requires an id".to_string(),
            ));
        }
        self.json_request(HttpMethod::Put, &self.static_mapping_url, mapping)
    }

    pub fn build_delete_static_mapping(&self, interface: &str, id: u32) -> HttpRequest {
        let id = id.to_string();
        self.request(
            HttpMethod::Delete,
            &self.static_mapping_url,
            &[("interface", interface), ("id", id.as_str())],
            None,
        )
    }

    pub fn parse_list_static_mappings(&self, response: HttpResponse) -> Result<Vec<StaticMapping>, ApiError> {
        decode(response)
    }

    pub fn parse_create_static_mapping(&self, response: HttpResponse) -> Result<StaticMapping, ApiError> {
        decode(response)
    }

    pub fn parse_update_static_mapping(&self, response: HttpResponse) -> Result<StaticMapping, ApiError> {
        decode(response)
    }

    pub fn parse_delete_static_mapping(&self, response: HttpResponse) -> Result<(), ApiError> {
        decode::<serde_json::Value>(response).map(|_| ())
    }
}

/// Check the status and unwrap the envelope's `data`.
fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    let envelope: ApiEnvelope<T> =
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))?;
    Ok(envelope.data)
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&response.body)
        .map(|envelope| envelope.message)
        .unwrap_or_else(|_| response.body.clone());
    match response.status {
        404 => Err(ApiError::NotFound),
        401 | 403 => Err(ApiError::Unauthorized {
            status: response.status,
            message,
        }),
        status => Err(ApiError::HttpError { status, message }),
    }
}
