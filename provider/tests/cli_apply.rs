//! Drive the binary against the mock pfSense API over real HTTP.

use std::net::SocketAddr;

mod common;

use common::provider_cmd;
use mock_pfsense::MockAuth;
use predicates::prelude::*;
use tempfile::TempDir;

const MANIFEST: &str = r#"
[[alias]]
name = "dns_servers"
type = "host"
descr = "upstream resolvers"
address = ["1.1.1.1", "1.0.0.1"]
detail = ["cloudflare", "cloudflare secondary"]

[[alias]]
name = "mail_ports"
type = "port"
address = ["25", "465", "587"]

[[dhcp_static_mapping]]
interface = "lan"
mac = "00:11:22:33:44:55"
ipaddr = "192.168.1.50"
hostname = "printer"
"#;

fn start_mock(auth: MockAuth) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_pfsense::run(listener, auth).await
        })
        .unwrap();
    });

    addr
}

/// A working directory with `pfsense.toml` pointing at `addr` and the
/// manifest above.
fn workspace(addr: SocketAddr, token: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("pfsense.toml"),
        format!("url = \"http://{addr}\"\napi_client_id = \"terraform\"\napi_client_token = \"{token}\"\n"),
    )
    .unwrap();
    std::fs::write(dir.path().join("resources.toml"), MANIFEST).unwrap();
    dir
}

fn token_auth() -> MockAuth {
    MockAuth::ClientToken {
        client_id: "terraform".into(),
        client_token: "s3cret".into(),
    }
}

#[test]
fn apply_then_reapply_is_idempotent() {
    let addr = start_mock(token_auth());
    let dir = workspace(addr, "s3cret");

    provider_cmd(&dir)
        .args(["apply", "resources.toml", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alias dns_servers: would create"))
        .stdout(predicate::str::contains("static mapping 00:11:22:33:44:55 on lan: would create"));

    provider_cmd(&dir)
        .args(["apply", "resources.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alias dns_servers: created"))
        .stdout(predicate::str::contains("alias mail_ports: created"))
        .stdout(predicate::str::contains("static mapping 00:11:22:33:44:55 on lan: created"));

    provider_cmd(&dir)
        .args(["apply", "resources.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alias dns_servers: unchanged"))
        .stdout(predicate::str::contains("on lan: unchanged"))
        .stdout(predicate::str::contains("created").not());

    provider_cmd(&dir)
        .args(["alias", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dns_servers\thost\t1.1.1.1 1.0.0.1"))
        .stdout(predicate::str::contains("mail_ports\tport\t25 465 587"));

    provider_cmd(&dir)
        .args(["alias", "get", "dns_servers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"cloudflare secondary\""));

    provider_cmd(&dir)
        .args(["dhcp", "list", "--interface", "lan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0\t00:11:22:33:44:55\t192.168.1.50\tprinter"));
}

#[test]
fn delete_commands_report_outcome() {
    let addr = start_mock(token_auth());
    let dir = workspace(addr, "s3cret");

    provider_cmd(&dir).args(["apply", "resources.toml"]).assert().success();

    provider_cmd(&dir)
        .args(["alias", "delete", "mail_ports"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alias mail_ports: deleted"));

    provider_cmd(&dir)
        .args(["alias", "delete", "mail_ports"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alias mail_ports: absent"));

    provider_cmd(&dir)
        .args(["alias", "get", "mail_ports"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));

    provider_cmd(&dir)
        .args(["dhcp", "delete", "--interface", "lan", "--mac", "00:11:22:33:44:55"])
        .assert()
        .success()
        .stdout(predicate::str::contains("static mapping on lan: deleted"));
}

#[test]
fn wrong_token_fails_with_auth_error() {
    let addr = start_mock(token_auth());
    let dir = workspace(addr, "wrong");

    provider_cmd(&dir)
        .args(["alias", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("authentication rejected (HTTP 401)"));
}

#[test]
fn dry_run_rejects_invalid_alias() {
    let addr = start_mock(token_auth());
    let dir = workspace(addr, "s3cret");
    std::fs::write(
        dir.path().join("bad.toml"),
        "[[alias]]\nname = \"bad-name\"\ntype = \"host\"\naddress = [\"10.0.0.1\"]\n",
    )
    .unwrap();

    provider_cmd(&dir)
        .args(["apply", "bad.toml", "--dry-run"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("would create").not())
        .stderr(predicate::str::contains("may only contain letters, digits and underscores"));
}

#[test]
fn misspelled_field_leaves_live_alias_alone() {
    let addr = start_mock(token_auth());
    let dir = workspace(addr, "s3cret");
    provider_cmd(&dir).args(["apply", "resources.toml"]).assert().success();

    std::fs::write(
        dir.path().join("typo.toml"),
        "[[alias]]\nname = \"dns_servers\"\ntype = \"host\"\nadress = [\"1.1.1.1\"]\n",
    )
    .unwrap();
    provider_cmd(&dir)
        .args(["apply", "typo.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown field `adress`"));

    provider_cmd(&dir)
        .args(["alias", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dns_servers\thost\t1.1.1.1 1.0.0.1"));
}
