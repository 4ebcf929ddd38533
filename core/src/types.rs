//! Resource DTOs for the pfSense REST API.
//!
//! # Design
//! The API is asymmetric for aliases: requests carry `address` and `detail`
//! as JSON arrays, responses flatten them into a space-separated and a
//! `||`-separated string. `FirewallAlias` is the list form used everywhere in
//! this crate; `AliasRecord` only exists to decode responses.
//!
//! Every response is wrapped in `ApiEnvelope`.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Longest alias name pfSense accepts.
pub const MAX_ALIAS_NAME_LEN: usize = 31;

/// The response wrapper used by every pfSense REST endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: String,
    pub code: u16,
    #[serde(rename = "return")]
    pub return_code: i64,
    pub message: String,
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasType {
    Host,
    Network,
    Port,
    Url,
    Urltable,
    UrltablePorts,
}

impl std::fmt::Display for AliasType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AliasType::Host => "host",
            AliasType::Network => "network",
            AliasType::Port => "port",
            AliasType::Url => "url",
            AliasType::Urltable => "urltable",
            AliasType::UrltablePorts => "urltable_ports",
        })
    }
}

/// A firewall alias in list form. Responses decode through `AliasRecord`,
/// so unknown keys here are always a typo in a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FirewallAlias {
    pub name: String,
    #[serde(rename = "type")]
    pub alias_type: AliasType,
    #[serde(default)]
    pub descr: String,
    #[serde(default)]
    pub address: Vec<String>,
    #[serde(default)]
    pub detail: Vec<String>,
}

impl FirewallAlias {
    /// Check the constraints pfSense enforces on create/update.
    pub fn validate(&self) -> Result<(), ApiError> {
        let name = &self.name;
        if name.is_empty() || name.len() > MAX_ALIAS_NAME_LEN {
            return Err(ApiError::Validation(format!(
                "alias name {name:?} must be 1 to {MAX_ALIAS_NAME_LEN} characters"
            )));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ApiError::Validation(format!(
                "alias name {name:?} may only contain letters, digits and underscores"
            )));
        }
        if name.chars().all(|c| c.is_ascii_digit()) {
            return Err(ApiError::Validation(format!(
                "alias name {name:?} must not be purely numeric"
            )));
        }
        if self.detail.len() > self.address.len() {
            return Err(ApiError::Validation(format!(
                "alias {name:?} has more detail entries than addresses"
            )));
        }
        if let Some(bad) = self.address.iter().find(|a| a.is_empty() || a.contains(char::is_whitespace)) {
            return Err(ApiError::Validation(format!(
                "alias {name:?} address {bad:?} must be non-empty and contain no whitespace"
            )));
        }
        if let Some(bad) = self.detail.iter().find(|d| d.contains("||")) {
            return Err(ApiError::Validation(format!(
                "alias {name:?} detail {bad:?} must not contain \"||\""
            )));
        }
        Ok(())
    }

    /// The alias with trailing empty `detail` entries dropped. pfSense joins
    /// details with `||`, so `[""]` is stored as `""` and reads back as `[]`.
    pub fn normalized(&self) -> FirewallAlias {
        let mut alias = self.clone();
        trim_empty_details(&mut alias.detail);
        alias
    }
}

fn trim_empty_details(detail: &mut Vec<String>) {
    while detail.last().is_some_and(|d| d.is_empty()) {
        detail.pop();
    }
}

/// Alias as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct AliasRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub alias_type: AliasType,
    #[serde(default)]
    pub descr: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub detail: String,
}

impl From<AliasRecord> for FirewallAlias {
    fn from(record: AliasRecord) -> Self {
        let mut detail: Vec<String> = record.detail.split("||").map(str::to_string).collect();
        trim_empty_details(&mut detail);
        FirewallAlias {
            name: record.name,
            alias_type: record.alias_type,
            descr: record.descr,
            address: record.address.split_whitespace().map(str::to_string).collect(),
            detail,
        }
    }
}

/// Body of an alias update. `id` is the alias's current name.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AliasUpdate<'a> {
    pub id: &'a str,
    #[serde(flatten)]
    pub alias: &'a FirewallAlias,
}

/// A DHCP server static lease on one interface.
///
/// `id` is the mapping's index within its interface and is assigned by the
/// server; it shifts when an earlier mapping is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMapping {
    pub interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub mac: String,
    #[serde(default)]
    pub ipaddr: String,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub descr: String,
}

impl StaticMapping {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.interface.is_empty() {
            return Err(ApiError::Validation("static mapping interface must be set".into()));
        }
        if !is_mac(&self.mac) {
            return Err(ApiError::Validation(format!(
                "static mapping mac {:?} must be six colon-separated hex octets",
                self.mac
            )));
        }
        if !self.ipaddr.is_empty() && self.ipaddr.parse::<std::net::Ipv4Addr>().is_err() {
            return Err(ApiError::Validation(format!(
                "static mapping ipaddr {:?} is not an IPv4 address",
                self.ipaddr
            )));
        }
        Ok(())
    }

    /// Whether `other` describes the same lease (interface and MAC).
    pub fn same_lease(&self, other: &StaticMapping) -> bool {
        self.interface == other.interface && self.mac.eq_ignore_ascii_case(&other.mac)
    }
}

fn is_mac(value: &str) -> bool {
    let octets: Vec<&str> = value.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}
