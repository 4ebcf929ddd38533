//! Declarative resource operations.
//!
//! # Design
//! A `Provider` is one configured pfSense instance: the shared client handle
//! plus a transport. Resource methods read the current remote state, `plan_*`
//! decides what has to change, and the matching build/execute/parse sequence
//! is run. Planning is pure so it can be tested without a server.
//!
//! Aliases are identified by name. Static mappings are identified by
//! interface and MAC because their numeric id is positional.

use std::sync::Arc;

use tracing::info;

use crate::client::PfSenseClient;
use crate::config::{ProviderConfig, ProviderSettings};
use crate::error::{ApiError, ConfigError};
use crate::transport::{Transport, UreqTransport};
use crate::types::{FirewallAlias, StaticMapping};

/// What applying a declared resource has to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan<T> {
    Create(T),
    Update { current: T, desired: T },
    Unchanged(T),
}

/// What applying or deleting a resource did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    Deleted,
    /// Delete of a resource that no longer exists.
    Absent,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Outcome::Created => "created",
            Outcome::Updated => "updated",
            Outcome::Unchanged => "unchanged",
            Outcome::Deleted => "deleted",
            Outcome::Absent => "absent",
        })
    }
}

/// Plan `desired` against the alias of the same name. Both sides are
/// compared in normalized form.
pub fn plan_alias(desired: &FirewallAlias, current: Option<FirewallAlias>) -> Plan<FirewallAlias> {
    let desired = desired.normalized();
    match current.map(|c| c.normalized()) {
        None => Plan::Create(desired),
        Some(current) if current == desired => Plan::Unchanged(current),
        Some(current) => Plan::Update { current, desired },
    }
}

/// Plan `desired` against the mappings currently on its interface. The
/// planned update carries the existing mapping's id.
pub fn plan_static_mapping(desired: &StaticMapping, existing: &[StaticMapping]) -> Plan<StaticMapping> {
    let Some(current) = existing.iter().find(|m| m.same_lease(desired)) else {
        return Plan::Create(desired.clone());
    };
    let mut target = desired.clone();
    target.id = current.id;
    target.mac = current.mac.clone();
    if target == *current {
        Plan::Unchanged(current.clone())
    } else {
        Plan::Update {
            current: current.clone(),
            desired: target,
        }
    }
}

/// A configured provider instance.
#[derive(Debug, Clone)]
pub struct Provider<T> {
    client: PfSenseClient,
    transport: T,
}

impl Provider<UreqTransport> {
    /// Resolve `settings` and build the client and HTTP transport.
    pub fn configure(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        let config = Arc::new(settings.resolve()?);
        let transport = UreqTransport::new(&config);
        Ok(Self {
            client: PfSenseClient::new(config)?,
            transport,
        })
    }
}

impl<T: Transport> Provider<T> {
    pub fn with_transport(client: PfSenseClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &PfSenseClient {
        &self.client
    }

    pub fn config(&self) -> &ProviderConfig {
        self.client.config()
    }

    pub fn list_aliases(&self) -> Result<Vec<FirewallAlias>, ApiError> {
        let response = self.transport.execute(&self.client.build_list_aliases())?;
        self.client.parse_list_aliases(response)
    }

    /// `Ok(None)` when no alias has that name.
    pub fn read_alias(&self, name: &str) -> Result<Option<FirewallAlias>, ApiError> {
        let response = self.transport.execute(&self.client.build_get_alias(name))?;
        match self.client.parse_get_alias(response) {
            Ok(alias) => Ok(Some(alias)),
            Err(ApiError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn apply_alias(&self, desired: &FirewallAlias) -> Result<Outcome, ApiError> {
        desired.validate()?;
        match plan_alias(desired, self.read_alias(&desired.name)?) {
            Plan::Unchanged(_) => Ok(Outcome::Unchanged),
            Plan::Create(alias) => {
                let response = self.transport.execute(&self.client.build_create_alias(&alias)?)?;
                self.client.parse_create_alias(response)?;
                info!(alias = %alias.name, "created firewall alias");
                Ok(Outcome::Created)
            }
            Plan::Update { current, desired } => {
                let request = self.client.build_update_alias(&current.name, &desired)?;
                let response = self.transport.execute(&request)?;
                self.client.parse_update_alias(response)?;
                info!(alias = %desired.name, "updated firewall alias");
                Ok(Outcome::Updated)
            }
        }
    }

    pub fn delete_alias(&self, name: &str) -> Result<Outcome, ApiError> {
        let response = self.transport.execute(&self.client.build_delete_alias(name))?;
        match self.client.parse_delete_alias(response) {
            Ok(()) => {
                info!(alias = %name, "deleted firewall alias");
                Ok(Outcome::Deleted)
            }
            Err(ApiError::NotFound) => Ok(Outcome::Absent),
            Err(e) => Err(e),
        }
    }

    pub fn list_static_mappings(&self, interface: &str) -> Result<Vec<StaticMapping>, ApiError> {
        let response = self
            .transport
            .execute(&self.client.build_list_static_mappings(interface))?;
        self.client.parse_list_static_mappings(response)
    }

    pub fn apply_static_mapping(&self, desired: &StaticMapping) -> Result<Outcome, ApiError> {
        desired.validate()?;
        let existing = self.list_static_mappings(&desired.interface)?;
        match plan_static_mapping(desired, &existing) {
            Plan::Unchanged(_) => Ok(Outcome::Unchanged),
            Plan::Create(mapping) => {
                let request = self.client.build_create_static_mapping(&mapping)?;
                let response = self.transport.execute(&request)?;
                self.client.parse_create_static_mapping(response)?;
                info!(interface = %mapping.interface, mac = %mapping.mac, "created static mapping");
                Ok(Outcome::Created)
            }
            Plan::Update { desired, .. } => {
                let request = self.client.build_update_static_mapping(&desired)?;
                let response = self.transport.execute(&request)?;
                self.client.parse_update_static_mapping(response)?;
                info!(interface = %desired.interface, mac = %desired.mac, "updated static mapping");
                Ok(Outcome::Updated)
            }
        }
    }

    pub fn delete_static_mapping(&self, interface: &str, id: u32) -> Result<Outcome, ApiError> {
        let request = self.client.build_delete_static_mapping(interface, id);
        let response = self.transport.execute(&request)?;
        match self.client.parse_delete_static_mapping(response) {
            Ok(()) => {
                info!(%interface, id, "deleted static mapping");
                Ok(Outcome::Deleted)
            }
            Err(ApiError::NotFound) => Ok(Outcome::Absent),
            Err(e) => Err(e),
        }
    }

    /// Delete the lease for `mac` on `interface`, looking up its current id.
    pub fn delete_static_mapping_by_mac(&self, interface: &str, mac: &str) -> Result<Outcome, ApiError> {
        let existing = self.list_static_mappings(interface)?;
        match existing
            .iter()
            .find(|m| m.mac.eq_ignore_ascii_case(mac))
            .and_then(|m| m.id)
        {
            Some(id) => self.delete_static_mapping(interface, id),
            None => Ok(Outcome::Absent),
        }
    }
}
