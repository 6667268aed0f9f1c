//! JSON-RPC API for daemon IPC.
//!
//! This module provides the JSON-RPC interface the PhotoSwipe front end
//! talks to over the daemon's Unix socket.

pub mod handlers;
pub mod server;
pub mod types;

pub use handlers::{error_object, ApiState, PhotoSwipeApiImpl, PhotoSwipeApiServer};
pub use server::{start_server, ServerHandle};
pub use types::*;
