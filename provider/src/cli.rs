use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(name = "pfsense-provider")]
#[command(about = "Manage pfSense firewall aliases and DHCP static mappings")]
pub struct Cli {
    /// Provider settings file. Defaults to ./pfsense.toml when present;
    /// PFSENSE_* environment variables fill any unset value.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Resolve the provider settings and print the result without secrets.
    Check,
    /// Inspect or remove firewall aliases.
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },
    /// Inspect or remove DHCP static mappings.
    Dhcp {
        #[command(subcommand)]
        action: DhcpAction,
    },
    /// Create or update every resource declared in a manifest.
    Apply(ApplyArgs),
}

#[derive(clap::Subcommand, Debug)]
pub enum AliasAction {
    List,
    Get { name: String },
    Delete { name: String },
}

#[derive(clap::Subcommand, Debug)]
pub enum DhcpAction {
    List {
        #[arg(long)]
        interface: String,
    },
    Delete {
        #[arg(long)]
        interface: String,
        #[arg(long, conflicts_with = "mac", required_unless_present = "mac")]
        id: Option<u32>,
        #[arg(long)]
        mac: Option<String>,
    },
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// TOML file with `[[alias]]` and `[[dhcp_static_mapping]]` tables.
    pub manifest: PathBuf,
    /// Print the plan without changing anything.
    #[arg(long)]
    pub dry_run: bool,
}
