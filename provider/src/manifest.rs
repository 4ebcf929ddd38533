//! Declared resources for `apply`.
//!
//! ```toml
//! [[alias]]
//! name = "dns_servers"
//! type = "host"
//! address = ["1.1.1.1", "1.0.0.1"]
//!
//! [[dhcp_static_mapping]]
//! interface = "lan"
//! mac = "00:11:22:33:44:55"
//! ipaddr = "192.168.1.50"
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use pfsense_core::{FirewallAlias, StaticMapping};
use serde::Deserialize;

#[derive(Debug, Default)]
pub struct Manifest {
    pub alias: Vec<FirewallAlias>,
    pub dhcp_static_mapping: Vec<StaticMapping>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    alias: Vec<FirewallAlias>,
    #[serde(default)]
    dhcp_static_mapping: Vec<DeclaredMapping>,
}

/// `StaticMapping` as written in a manifest. Unlike the API form it rejects
/// unknown keys, so a typo cannot blank a field on apply.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeclaredMapping {
    interface: String,
    id: Option<u32>,
    mac: String,
    #[serde(default)]
    ipaddr: String,
    #[serde(default)]
    cid: String,
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    descr: String,
}

impl From<DeclaredMapping> for StaticMapping {
    fn from(m: DeclaredMapping) -> Self {
        StaticMapping {
            interface: m.interface,
            id: m.id,
            mac: m.mac,
            ipaddr: m.ipaddr,
            cid: m.cid,
            hostname: m.hostname,
            domain: m.domain,
            descr: m.descr,
        }
    }
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid manifest {}", path.display()))
    }

    fn parse(raw: &str) -> Result<Self> {
        let raw: RawManifest = toml::from_str(raw)?;
        let manifest = Manifest {
            alias: raw.alias,
            dhcp_static_mapping: raw.dhcp_static_mapping.into_iter().map(StaticMapping::from).collect(),
        };
        manifest.check()?;
        Ok(manifest)
    }

    /// Reject declarations pfSense would refuse or that would fight each
    /// other on apply.
    fn check(&self) -> Result<()> {
        for (i, alias) in self.alias.iter().enumerate() {
            alias.validate()?;
            if self.alias[..i].iter().any(|a| a.name == alias.name) {
                bail!("alias {:?} is declared more than once", alias.name);
            }
        }
        for (i, mapping) in self.dhcp_static_mapping.iter().enumerate() {
            if mapping.id.is_some() {
                bail!("static mapping {} must not set id; it is assigned by pfSense", mapping.mac);
            }
            mapping.validate()?;
            if self.dhcp_static_mapping[..i].iter().any(|m| m.same_lease(mapping)) {
                bail!(
                    "static mapping {} on {} is declared more than once",
                    mapping.mac,
                    mapping.interface
                );
            }
        }
        Ok(())
    }
}
