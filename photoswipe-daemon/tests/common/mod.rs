//! Shared fixtures for daemon integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::time::{sleep, Duration};
use wiremock::MockServer;

use photoswipe_daemon::config::{LibrarySection, ProviderSection};
use photoswipe_daemon::{start_server, ApiState, DaemonConfig, ServerHandle};

/// Detect whether the sandbox allows binding Unix sockets. Skip tests if not.
pub fn can_bind_unix_socket() -> bool {
    let path = std::env::temp_dir().join(format!(
        "photoswipe-socket-permission-check-{}.sock",
        std::process::id()
    ));
    let _ = fs::remove_file(&path);
    let result = std::os::unix::net::UnixListener::bind(&path);
    let ok = result.is_ok();
    let _ = fs::remove_file(&path);
    ok
}

/// A configuration rooted in `temp_dir` that talks to `library`.
///
/// Without a mock server the endpoints point at an unroutable address.
pub fn test_config(temp_dir: &TempDir, library: Option<&MockServer>) -> DaemonConfig {
    let base = library
        .map(|server| server.uri())
        .unwrap_or_else(|| "http://127.0.0.1:9".to_string());

    DaemonConfig {
        socket_path: temp_dir.path().join("test.sock"),
        data_dir: temp_dir.path().join("data"),
        provider: ProviderSection {
            token_url: format!("{}/token", base),
            ..ProviderSection::default()
        },
        library: LibrarySection {
            api_base: format!("{}/v1", base),
            request_timeout_secs: 5,
            ..LibrarySection::default()
        },
        ..DaemonConfig::default()
    }
}

/// Helper to set up a test server with unique temp directory and socket path.
/// Returns the temp directory (which must be kept alive), socket path, and server handle.
pub async fn setup_test_server(library: Option<&MockServer>) -> (TempDir, PathBuf, ServerHandle) {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(&temp_dir, library);

    let state = ApiState::from_config(&config).unwrap();
    let handle = start_server(&config.socket_path, state).await.unwrap();

    // Give the server time to start accepting connections
    sleep(Duration::from_millis(100)).await;

    (temp_dir, config.socket_path, handle)
}

/// Helper to send raw JSON-RPC request and get raw response.
/// Creates a fresh connection for each request to avoid stream state issues.
pub async fn send_raw_request(
    socket_path: &Path,
    request: &str,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut stream = UnixStream::connect(socket_path).await?;
    stream.write_all(request.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.flush().await?;

    let (reader, _writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut response_str = String::new();
    reader.read_line(&mut response_str).await?;

    Ok(serde_json::from_str(&response_str)?)
}

/// Call `method` with named `params` and return the whole response object.
pub async fn rpc(socket_path: &Path, method: &str, params: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1,
    });
    send_raw_request(socket_path, &request.to_string())
        .await
        .expect("RPC round trip failed")
}

/// Call `method` and return its result, panicking on an error response.
pub async fn rpc_ok(socket_path: &Path, method: &str, params: Value) -> Value {
    let response = rpc(socket_path, method, params).await;
    if let Some(error) = response.get("error") {
        panic!("{} failed: {}", method, error);
    }
    response["result"].clone()
}

/// Call `method` and return its error object, panicking on success.
pub async fn rpc_err(socket_path: &Path, method: &str, params: Value) -> Value {
    let response = rpc(socket_path, method, params).await;
    match response.get("error") {
        Some(error) => error.clone(),
        None => panic!("{} unexpectedly succeeded: {}", method, response),
    }
}

/// Open a session whose access token is valid for an hour.
pub async fn open_session(socket_path: &Path, owner: &str) -> String {
    let expiry = chrono::Utc::now() + chrono::Duration::hours(1);
    let result = rpc_ok(
        socket_path,
        "open_session",
        json!({
            "owner": owner,
            "credentials": {
                "access_token": "valid-access-token",
                "refresh_token": "test-refresh-token",
                "client_id": "test-client-id",
                "client_secret": "test-client-secret",
                "expiry": expiry,
            }
        }),
    )
    .await;
    result["session"].as_str().unwrap().to_string()
}
