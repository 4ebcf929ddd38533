//! In-memory emulation of the pfSense REST API subset the provider uses.
//!
//! Serves firewall aliases and DHCP static mappings under `/api/v1/`, wraps
//! every reply in the pfSense envelope, and checks the `Authorization`
//! header against one configured credential. Types are defined here
//! independently of `pfsense-core` so integration tests catch drift.

use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

/// The credential the mock expects on every request.
#[derive(Clone, Debug, Default)]
pub enum MockAuth {
    #[default]
    Anonymous,
    Basic { user: String, password: String },
    Bearer(String),
    ClientToken { client_id: String, client_token: String },
}

impl MockAuth {
    fn expected_header(&self) -> Option<String> {
        match self {
            MockAuth::Anonymous => None,
            MockAuth::Basic { user, password } => {
                Some(format!("Basic {}", STANDARD.encode(format!("{user}:{password}"))))
            }
            MockAuth::Bearer(token) => Some(format!("Bearer {token}")),
            MockAuth::ClientToken {
                client_id,
                client_token,
            } => Some(format!("{client_id} {client_token}")),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub alias_type: String,
    pub descr: String,
    pub address: String,
    pub detail: String,
}

#[derive(Deserialize)]
pub struct AliasInput {
    pub name: String,
    #[serde(rename = "type")]
    pub alias_type: String,
    #[serde(default)]
    pub descr: String,
    #[serde(default)]
    pub address: Vec<String>,
    #[serde(default)]
    pub detail: Vec<String>,
}

impl From<AliasInput> for AliasRecord {
    fn from(input: AliasInput) -> Self {
        AliasRecord {
            name: input.name,
            alias_type: input.alias_type,
            descr: input.descr,
            address: input.address.join(" "),
            detail: input.detail.join("||"),
        }
    }
}

#[derive(Deserialize)]
pub struct AliasUpdate {
    pub id: String,
    #[serde(flatten)]
    pub alias: AliasInput,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaticMapping {
    pub interface: String,
    #[serde(default)]
    pub id: Option<usize>,
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

#[derive(Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub code: u16,
    #[serde(rename = "return")]
    pub return_code: i64,
    pub message: String,
    pub data: T,
}

#[derive(Default)]
pub struct Store {
    aliases: BTreeMap<String, AliasRecord>,
    mappings: BTreeMap<String, Vec<StaticMapping>>,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    auth: Arc<MockAuth>,
}

fn reply<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    let envelope = Envelope {
        status: if status.is_success() { "ok" } else { "error" },
        code: status.as_u16(),
        return_code: if status.is_success() { 0 } else { 1 },
        message: message.to_string(),
        data,
    };
    (status, Json(envelope)).into_response()
}

fn ok<T: Serialize>(data: T) -> Response {
    reply(StatusCode::OK, "Success", data)
}

fn fail(status: StatusCode, message: &str) -> Response {
    reply(status, message, Vec::<()>::new())
}

pub fn app(auth: MockAuth) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        auth: Arc::new(auth),
    };
    Router::new()
        .route(
            "/api/v1/firewall/alias",
            get(list_aliases)
                .post(create_alias)
                .put(update_alias)
                .delete(delete_alias),
        )
        .route(
            "/api/v1/services/dhcpd/static_mapping",
            get(list_mappings)
                .post(create_mapping)
                .put(update_mapping)
                .delete(delete_mapping),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener, auth: MockAuth) -> Result<(), std::io::Error> {
    axum::serve(listener, app(auth)).await
}

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(expected) = state.auth.expected_header() {
        let given = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if given != Some(expected.as_str()) {
            debug!(uri = %request.uri(), "rejecting request with bad credentials");
            return fail(StatusCode::UNAUTHORIZED, "Authentication failed");
        }
    }
    next.run(request).await
}

// --- firewall aliases ---

async fn list_aliases(
    State(state): State<AppState>,
    Query(filter): Query<HashMap<String, String>>,
) -> Response {
    let store = state.db.read().await;
    let aliases: Vec<AliasRecord> = store
        .aliases
        .values()
        .filter(|a| filter.get("name").map_or(true, |name| &a.name == name))
        .cloned()
        .collect();
    ok(aliases)
}

async fn create_alias(State(state): State<AppState>, Json(input): Json<AliasInput>) -> Response {
    if input.name.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "Alias name required");
    }
    let mut store = state.db.write().await;
    if store.aliases.contains_key(&input.name) {
        return fail(StatusCode::BAD_REQUEST, "Alias name already in use");
    }
    let record = AliasRecord::from(input);
    store.aliases.insert(record.name.clone(), record.clone());
    ok(record)
}

async fn update_alias(State(state): State<AppState>, Json(input): Json<AliasUpdate>) -> Response {
    let mut store = state.db.write().await;
    if !store.aliases.contains_key(&input.id) {
        return fail(StatusCode::NOT_FOUND, "Alias does not exist");
    }
    if input.alias.name != input.id && store.aliases.contains_key(&input.alias.name) {
        return fail(StatusCode::BAD_REQUEST, "Alias name already in use");
    }
    store.aliases.remove(&input.id);
    let record = AliasRecord::from(input.alias);
    store.aliases.insert(record.name.clone(), record.clone());
    ok(record)
}

#[derive(Deserialize)]
struct AliasId {
    id: String,
}

async fn delete_alias(State(state): State<AppState>, Query(query): Query<AliasId>) -> Response {
    let mut store = state.db.write().await;
    match store.aliases.remove(&query.id) {
        Some(record) => ok(record),
        None => fail(StatusCode::NOT_FOUND, "Alias does not exist"),
    }
}

// --- DHCP static mappings ---

#[derive(Deserialize)]
struct InterfaceQuery {
    interface: String,
}

/// Mapping ids are positions within the interface's list.
fn numbered(interface: &str, mappings: &[StaticMapping]) -> Vec<StaticMapping> {
    mappings
        .iter()
        .enumerate()
        .map(|(id, m)| StaticMapping {
            interface: interface.to_string(),
            id: Some(id),
            ..m.clone()
        })
        .collect()
}

async fn list_mappings(State(state): State<AppState>, Query(query): Query<InterfaceQuery>) -> Response {
    let store = state.db.read().await;
    let mappings = store
        .mappings
        .get(&query.interface)
        .map(|list| numbered(&query.interface, list))
        .unwrap_or_default();
    ok(mappings)
}

async fn create_mapping(State(state): State<AppState>, Json(input): Json<StaticMapping>) -> Response {
    let mut store = state.db.write().await;
    let list = store.mappings.entry(input.interface.clone()).or_default();
    if list.iter().any(|m| m.mac.eq_ignore_ascii_case(&input.mac)) {
        return fail(StatusCode::BAD_REQUEST, "MAC address already in use");
    }
    list.push(StaticMapping { id: None, ..input });
    let id = list.len() - 1;
    ok(StaticMapping {
        id: Some(id),
        ..list[id].clone()
    })
}

async fn update_mapping(State(state): State<AppState>, Json(input): Json<StaticMapping>) -> Response {
    let mut store = state.db.write().await;
    let Some(id) = input.id else {
        return fail(StatusCode::BAD_REQUEST, "Static mapping id required");
    };
    let Some(slot) = store
        .mappings
        .get_mut(&input.interface)
        .and_then(|list| list.get_mut(id))
    else {
        return fail(StatusCode::NOT_FOUND, "Static mapping does not exist");
    };
    *slot = StaticMapping { id: None, ..input };
    ok(StaticMapping {
        id: Some(id),
        ..slot.clone()
    })
}

#[derive(Deserialize)]
struct MappingId {
    interface: String,
    id: usize,
}

async fn delete_mapping(State(state): State<AppState>, Query(query): Query<MappingId>) -> Response {
    let mut store = state.db.write().await;
    match store.mappings.get_mut(&query.interface) {
        Some(list) if query.id < list.len() => {
            let removed = list.remove(query.id);
            ok(StaticMapping {
                id: Some(query.id),
                ..removed
            })
        }
        _ => fail(StatusCode::NOT_FOUND, "Static mapping does not exist"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_input_flattens_lists() {
        let input: AliasInput = serde_json::from_str(
            r#"{"name":"web","type":"host","address":["10.0.0.1","10.0.0.2"],"detail":["a","b"]}"#,
        )
        .unwrap();
        let record = AliasRecord::from(input);
        assert_eq!(record.address, "10.0.0.1 10.0.0.2");
        assert_eq!(record.detail, "a||b");
        assert_eq!(record.descr, "");
    }

    #[test]
    fn alias_update_reads_id_and_fields() {
        let update: AliasUpdate =
            serde_json::from_str(r#"{"id":"old","name":"new","type":"network"}"#).unwrap();
        assert_eq!(update.id, "old");
        assert_eq!(update.alias.name, "new");
        assert!(update.alias.address.is_empty());
    }

    #[test]
    fn expected_headers() {
        assert_eq!(MockAuth::Anonymous.expected_header(), None);
        assert_eq!(
            MockAuth::Bearer("t".into()).expected_header().as_deref(),
            Some("Bearer t")
        );
        assert_eq!(
            MockAuth::Basic {
                user: "admin".into(),
                password: "pfsense".into()
            }
            .expected_header()
            .as_deref(),
            Some("Basic YWRtaW46cGZzZW5zZQ==")
        );
    }

    #[test]
    fn numbered_assigns_positions() {
        let m = StaticMapping {
            interface: "lan".into(),
            id: None,
            mac: "00:11:22:33:44:55".into(),
            ipaddr: String::new(),
            cid: String::new(),
            hostname: String::new(),
            domain: String::new(),
            descr: String::new(),
        };
        let list = numbered("lan", &[m.clone(), m]);
        assert_eq!(list[0].id, Some(0));
        assert_eq!(list[1].id, Some(1));
    }
}
