use assert_cmd::Command;
use tempfile::TempDir;

/// Every variable `ProviderSettings` falls back to.
pub const ENV_KEYS: [&str; 8] = [
    "PFSENSE_URL",
    "PFSENSE_USER",
    "PFSENSE_PASSWORD",
    "PFSENSE_JWT_TOKEN",
    "PFSENSE_API_CLIENT_ID",
    "PFSENSE_API_CLIENT_TOKEN",
    "PFSENSE_SKIP_TLS",
    "PFSENSE_TIMEOUT",
];

/// Command running in `dir` with no PFSENSE_* variables set.
pub fn provider_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pfsense-provider"));
    cmd.current_dir(dir.path());
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd
}
