//! JSON-RPC server implementation with Unix socket support.
//!
//! Requests and responses are newline-delimited JSON-RPC 2.0 objects.

use super::handlers::{internal_error, ApiState, PhotoSwipeApiImpl, PhotoSwipeApiServer};
use super::types::{
    DeleteBindingParams, GetMediaParams, OpenSessionParams, PerformActionParams,
    SaveBindingParams, SessionParams,
};
use anyhow::{Context, Result};
use jsonrpsee::types::{ErrorCode, ErrorObject, ErrorObjectOwned};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Handle to a running RPC server
pub struct ServerHandle {
    shutdown: Arc<Mutex<Option<tokio::sync::mpsc::Sender<()>>>>,
    join_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

/// Start the JSON-RPC server on a Unix socket.
///
/// # Parameters
///
/// - `socket_path`: Path to the Unix socket file
/// - `state`: API state shared across handlers
///
/// # Returns
///
/// A handle to the running server that can be used to stop it.
pub async fn start_server(socket_path: &Path, state: ApiState) -> Result<ServerHandle> {
    // Remove existing socket if present
    if socket_path.exists() {
        warn!("Removing existing socket at {:?}", socket_path);
        std::fs::remove_file(socket_path)
            .with_context(|| format!("Failed to remove existing socket at {:?}", socket_path))?;
    }

    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create socket directory {:?}", parent))?;
    }

    info!("Starting JSON-RPC server on {:?}", socket_path);

    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("Failed to bind Unix socket at {:?}", socket_path))?;

    let api = Arc::new(PhotoSwipeApiImpl::new(state));

    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);

    let server_task: JoinHandle<()> = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = rx.recv() => {
                    debug!("Server shutdown signal received");
                    break;
                }
                result = listener.accept() => {
                    match result {
                        Ok((stream, _addr)) => {
                            let api = api.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, api).await {
                                    warn!("Connection handler error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            warn!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }
    });

    info!("JSON-RPC server started and listening");

    Ok(ServerHandle {
        shutdown: Arc::new(Mutex::new(Some(tx))),
        join_handle: Arc::new(Mutex::new(Some(server_task))),
    })
}

/// Handle a single connection
async fn handle_connection(mut stream: UnixStream, api: Arc<PhotoSwipeApiImpl>) -> Result<()> {
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;

        if n == 0 {
            // Connection closed
            break;
        }

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(&line) {
            Ok(request) => process_request(request, &api).await,
            Err(e) => serde_json::json!({
                "jsonrpc": "2.0",
                "error": {
                    "code": ErrorCode::ParseError.code(),
                    "message": format!("Parse error: {}", e)
                },
                "id": null
            }),
        };

        writer.write_all(response.to_string().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Process a JSON-RPC request
async fn process_request(request: Value, api: &PhotoSwipeApiImpl) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let Some(method) = request.get("method").and_then(|m| m.as_str()) else {
        return serde_json::json!({
            "jsonrpc": "2.0",
            "error": {
                "code": ErrorCode::InvalidRequest.code(),
                "message": "Invalid Request: missing method"
            },
            "id": id
        });
    };

    debug!("Received request: {}", method);

    let params = request
        .get("params")
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    match call(method, params, api).await {
        Ok(value) => serde_json::json!({
            "jsonrpc": "2.0",
            "result": value,
            "id": id
        }),
        Err(error) => serde_json::json!({
            "jsonrpc": "2.0",
            "error": error,
            "id": id
        }),
    }
}

/// Route a method call to its handler.
async fn call(
    method: &str,
    params: Value,
    api: &PhotoSwipeApiImpl,
) -> Result<Value, ErrorObjectOwned> {
    match method {
        "open_session" => {
            let p: OpenSessionParams = parse_params(params)?;
            to_result(api.open_session(p.owner, p.credentials).await?)
        }
        "close_session" => {
            let p: SessionParams = parse_params(params)?;
            to_result(api.close_session(p.session).await?)
        }
        "credential_status" => {
            let p: SessionParams = parse_params(params)?;
            to_result(api.credential_status(p.session).await?)
        }
        "perform_action" => {
            let p: PerformActionParams = parse_params(params)?;
            to_result(api.perform_action(p.session, p.request).await?)
        }
        "get_media" => {
            let p: GetMediaParams = parse_params(params)?;
            api.get_media(p.session, p.media_ids).await
        }
        "get_settings" => {
            let p: SessionParams = parse_params(params)?;
            to_result(api.get_settings(p.session).await?)
        }
        "save_binding" => {
            let p: SaveBindingParams = parse_params(params)?;
            to_result(api.save_binding(p.session, p.binding).await?)
        }
        "delete_binding" => {
            let p: DeleteBindingParams = parse_params(params)?;
            to_result(api.delete_binding(p.session, p.id).await?)
        }
        _ => Err(ErrorObject::owned(
            ErrorCode::MethodNotFound.code(),
            "Method not found",
            None::<()>,
        )),
    }
}

/// Named params only; positional arrays are rejected.
fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, ErrorObjectOwned> {
    serde_json::from_value(params).map_err(|e| {
        ErrorObject::owned(
            ErrorCode::InvalidParams.code(),
            format!("Invalid params: {}", e),
            None::<()>,
        )
    })
}

fn to_result<T: Serialize>(response: T) -> Result<Value, ErrorObjectOwned> {
    serde_json::to_value(response).map_err(internal_error)
}

impl ServerHandle {
    /// Stop the server
    pub async fn stop(&self) -> Result<()> {
        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(()).await;
        }

        if let Some(handle) = self.join_handle.lock().await.take() {
            // If the task panicked, surface the error
            handle.await?;
        }

        Ok(())
    }

    /// Wait for the server to stop
    pub async fn stopped(&self) {
        // No-op: stop() already awaits the join handle.
    }
}
