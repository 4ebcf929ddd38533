use mock_pfsense::MockAuth;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pick the credential the server demands from `MOCK_JWT`,
/// `MOCK_USER` + `MOCK_PASSWORD`, or `MOCK_CLIENT_ID` + `MOCK_CLIENT_TOKEN`,
/// checked in that order. With none set it accepts anonymous requests.
fn auth_from_env(var: impl Fn(&str) -> Option<String>) -> MockAuth {
    if let Some(token) = var("MOCK_JWT") {
        return MockAuth::Bearer(token);
    }
    if let (Some(user), Some(password)) = (var("MOCK_USER"), var("MOCK_PASSWORD")) {
        return MockAuth::Basic { user, password };
    }
    match (var("MOCK_CLIENT_ID"), var("MOCK_CLIENT_TOKEN")) {
        (Some(client_id), Some(client_token)) => MockAuth::ClientToken {
            client_id,
            client_token,
        },
        _ => MockAuth::Anonymous,
    }
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    let auth = auth_from_env(|key| std::env::var(key).ok());
    info!(%addr, anonymous = matches!(auth, MockAuth::Anonymous), "mock pfSense API listening");
    mock_pfsense::run(listener, auth).await
}
