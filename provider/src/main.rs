use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use pfsense_core::{
    plan_alias, plan_static_mapping, Plan, Provider, ProviderSettings, UreqTransport,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod manifest;

use cli::{AliasAction, ApplyArgs, Cli, Command, DhcpAction};
use manifest::Manifest;

const DEFAULT_CONFIG: &str = "pfsense.toml";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;
    match cli.command {
        Command::Check => run_check(&settings),
        Command::Alias { action } => run_alias(&configure(&settings)?, action),
        Command::Dhcp { action } => run_dhcp(&configure(&settings)?, action),
        Command::Apply(args) => run_apply(&configure(&settings)?, args),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// File settings (explicit path, or `pfsense.toml` if it exists) topped up
/// from the environment.
fn load_settings(path: Option<&Path>) -> Result<ProviderSettings> {
    let from_file = match path {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()),
    };
    let settings = match from_file {
        Some(path) => {
            debug!(path = %path.display(), "loading provider settings");
            ProviderSettings::load(&path)?
        }
        None => ProviderSettings::default(),
    };
    settings
        .with_env_fallback(|key| std::env::var(key).ok())
        .context("failed to read provider settings from the environment")
}

fn configure(settings: &ProviderSettings) -> Result<Provider<UreqTransport>> {
    Provider::configure(settings).context("invalid provider configuration")
}

fn run_check(settings: &ProviderSettings) -> Result<()> {
    let config = settings.resolve().context("invalid provider configuration")?;
    println!("{config}");
    Ok(())
}

fn run_alias(provider: &Provider<UreqTransport>, action: AliasAction) -> Result<()> {
    match action {
        AliasAction::List => {
            for alias in provider.list_aliases().context("failed to list aliases")? {
                println!("{}\t{}\t{}", alias.name, alias.alias_type, alias.address.join(" "));
            }
        }
        AliasAction::Get { name } => {
            let alias = provider
                .read_alias(&name)
                .with_context(|| format!("failed to read alias {name}"))?
                .with_context(|| format!("alias {name} does not exist"))?;
            println!("{}", serde_json::to_string_pretty(&alias)?);
        }
        AliasAction::Delete { name } => {
            let outcome = provider
                .delete_alias(&name)
                .with_context(|| format!("failed to delete alias {name}"))?;
            println!("alias {name}: {outcome}");
        }
    }
    Ok(())
}

fn run_dhcp(provider: &Provider<UreqTransport>, action: DhcpAction) -> Result<()> {
    match action {
        DhcpAction::List { interface } => {
            let mappings = provider
                .list_static_mappings(&interface)
                .with_context(|| format!("failed to list static mappings on {interface}"))?;
            for m in mappings {
                let id = m.id.map(|id| id.to_string()).unwrap_or_default();
                println!("{id}\t{}\t{}\t{}", m.mac, m.ipaddr, m.hostname);
            }
        }
        DhcpAction::Delete { interface, id, mac } => {
            let outcome = match (id, mac) {
                (Some(id), _) => provider.delete_static_mapping(&interface, id),
                (None, Some(mac)) => provider.delete_static_mapping_by_mac(&interface, &mac),
                (None, None) => anyhow::bail!("either --id or --mac is required"),
            }
            .with_context(|| format!("failed to delete static mapping on {interface}"))?;
            println!("static mapping on {interface}: {outcome}");
        }
    }
    Ok(())
}

fn run_apply(provider: &Provider<UreqTransport>, args: ApplyArgs) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;

    for alias in &manifest.alias {
        let label = format!("alias {}", alias.name);
        if args.dry_run {
            let current = provider
                .read_alias(&alias.name)
                .with_context(|| format!("failed to read {label}"))?;
            println!("{label}: {}", describe(&plan_alias(alias, current)));
        } else {
            let outcome = provider
                .apply_alias(alias)
                .with_context(|| format!("failed to apply {label}"))?;
            println!("{label}: {outcome}");
        }
    }

    for mapping in &manifest.dhcp_static_mapping {
        let label = format!("static mapping {} on {}", mapping.mac, mapping.interface);
        if args.dry_run {
            let existing = provider
                .list_static_mappings(&mapping.interface)
                .with_context(|| format!("failed to read {label}"))?;
            println!("{label}: {}", describe(&plan_static_mapping(mapping, &existing)));
        } else {
            let outcome = provider
                .apply_static_mapping(mapping)
                .with_context(|| format!("failed to apply {label}"))?;
            println!("{label}: {outcome}");
        }
    }
    Ok(())
}

fn describe<T>(plan: &Plan<T>) -> &'static str {
    match plan {
        Plan::Create(_) => "would create",
        Plan::Update { .. } => "would update",
        Plan::Unchanged(_) => "unchanged",
    }
}
