//! Resource lifecycle tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every resource
//! operation through `Provider`, i.e. the real `UreqTransport` configured
//! from resolved settings. Covers request building, auth headers and
//! response parsing end-to-end.

use std::net::SocketAddr;

use mock_pfsense::MockAuth;
use pfsense_core::{
    AliasType, ApiError, AuthKind, FirewallAlias, Outcome, Provider, ProviderSettings, StaticMapping,
};

/// Start the mock server on a random port with `auth` and return its address.
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

fn basic_auth() -> MockAuth {
    MockAuth::Basic {
        user: "admin".into(),
        password: "pfsense".into(),
    }
}

fn local_settings(addr: SocketAddr, password: &str) -> ProviderSettings {
    ProviderSettings {
        url: Some(format!("http://{addr}")),
        user: Some("admin".into()),
        password: Some(password.into()),
        ..Default::default()
    }
}

fn dns_alias(addresses: &[&str]) -> FirewallAlias {
    FirewallAlias {
        name: "dns_servers".into(),
        alias_type: AliasType::Host,
        descr: "upstream resolvers".into(),
        address: addresses.iter().map(|a| a.to_string()).collect(),
        detail: vec!["cloudflare".into()],
    }
}

#[test]
fn alias_lifecycle() {
    let addr = start_mock(basic_auth());
    let provider = Provider::configure(&local_settings(addr, "pfsense")).unwrap();
    assert_eq!(provider.config().auth().kind(), AuthKind::Local);
    assert!(provider.config().skip_tls_verify());

    // Step 1: nothing there yet.
    assert!(provider.list_aliases().unwrap().is_empty());
    assert_eq!(provider.read_alias("dns_servers").unwrap(), None);

    // Step 2: create, then apply again without changes.
    let desired = dns_alias(&["1.1.1.1"]);
    assert_eq!(provider.apply_alias(&desired).unwrap(), Outcome::Created);
    assert_eq!(provider.apply_alias(&desired).unwrap(), Outcome::Unchanged);
    assert_eq!(provider.read_alias("dns_servers").unwrap(), Some(desired));

    // Step 3: drift is corrected with an update.
    let widened = dns_alias(&["1.1.1.1", "1.0.0.1"]);
    assert_eq!(provider.apply_alias(&widened).unwrap(), Outcome::Updated);
    let fetched = provider.read_alias("dns_servers").unwrap().unwrap();
    assert_eq!(fetched.address, vec!["1.1.1.1", "1.0.0.1"]);
    assert_eq!(fetched.detail, vec!["cloudflare"]);

    // Step 4: delete twice.
    assert_eq!(provider.delete_alias("dns_servers").unwrap(), Outcome::Deleted);
    assert_eq!(provider.delete_alias("dns_servers").unwrap(), Outcome::Absent);
    assert!(provider.list_aliases().unwrap().is_empty());
}

#[test]
fn alias_with_blank_detail_converges() {
    let addr = start_mock(basic_auth());
    let provider = Provider::configure(&local_settings(addr, "pfsense")).unwrap();

    let mut desired = dns_alias(&["1.1.1.1"]);
    desired.detail = vec![String::new()];
    assert_eq!(provider.apply_alias(&desired).unwrap(), Outcome::Created);
    assert_eq!(provider.apply_alias(&desired).unwrap(), Outcome::Unchanged);
    assert_eq!(provider.apply_alias(&desired).unwrap(), Outcome::Unchanged);
}

#[test]
fn static_mapping_lifecycle() {
    let addr = start_mock(MockAuth::Bearer("eyJ.test".into()));
    let settings = ProviderSettings {
        url: Some(format!("http://{addr}")),
        jwt_token: Some("eyJ.test".into()),
        timeout: Some(2),
        ..Default::default()
    };
    let provider = Provider::configure(&settings).unwrap();

    let printer = StaticMapping {
        interface: "lan".into(),
        id: None,
        mac: "00:11:22:33:44:55".into(),
        ipaddr: "192.168.1.50".into(),
        cid: String::new(),
        hostname: "printer".into(),
        domain: "home.arpa".into(),
        descr: String::new(),
    };
    let nas = StaticMapping {
        mac: "66:77:88:99:AA:BB".into(),
        ipaddr: "192.168.1.60".into(),
        hostname: "nas".into(),
        ..printer.clone()
    };

    assert_eq!(provider.apply_static_mapping(&printer).unwrap(), Outcome::Created);
    assert_eq!(provider.apply_static_mapping(&nas).unwrap(), Outcome::Created);
    assert_eq!(provider.apply_static_mapping(&printer).unwrap(), Outcome::Unchanged);

    // Move the NAS; matching is by MAC regardless of case.
    let moved = StaticMapping {
        mac: "66:77:88:99:aa:bb".into(),
        ipaddr: "192.168.1.61".into(),
        ..nas.clone()
    };
    assert_eq!(provider.apply_static_mapping(&moved).unwrap(), Outcome::Updated);

    let listed = provider.list_static_mappings("lan").unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].ipaddr, "192.168.1.61");
    assert_eq!(listed[1].id, Some(1));

    // Deleting the printer shifts the NAS down to id 0.
    assert_eq!(
        provider.delete_static_mapping_by_mac("lan", "00:11:22:33:44:55").unwrap(),
        Outcome::Deleted
    );
    let listed = provider.list_static_mappings("lan").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].hostname, "nas");
    assert_eq!(listed[0].id, Some(0));

    assert_eq!(provider.delete_static_mapping("lan", 5).unwrap(), Outcome::Absent);
    assert!(provider.list_static_mappings("opt1").unwrap().is_empty());
}

#[test]
fn wrong_credentials_are_unauthorized() {
    let addr = start_mock(basic_auth());
    let provider = Provider::configure(&local_settings(addr, "wrong")).unwrap();
    match provider.list_aliases().unwrap_err() {
        ApiError::Unauthorized { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Authentication failed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unreachable_server_is_transport_error() {
    // Bind and drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let settings = ProviderSettings {
        url: Some(format!("http://{addr}")),
        timeout: Some(1),
        ..Default::default()
    };
    let provider = Provider::configure(&settings).unwrap();
    let err = provider.list_aliases().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.is_retryable());
}
