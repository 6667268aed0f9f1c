//! API request/response types for the daemon JSON-RPC interface.
//!
//! Every method takes named params. All methods except `open_session`
//! carry the `session` id returned by `open_session`.

use chrono::{DateTime, Utc};
use photoswipe_core::{AlbumReference, Binding, CredentialState, RawActionRequest};
use serde::{Deserialize, Serialize};

/// Token set handed over after the authorization-code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsParams {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    /// When the access token lapses. Omit if the provider did not say.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    /// Granted scopes. Defaults to the provider's scopes.
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSessionParams {
    /// Stable id of the authenticated user.
    pub owner: String,
    pub credentials: CredentialsParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSessionResponse {
    pub session: String,
}

/// Params of every method that needs nothing but a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParams {
    pub session: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialStatusResponse {
    pub state: CredentialState,
    /// Access token expiry (ISO 8601), if known.
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformActionParams {
    pub session: String,
    pub request: RawActionRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMediaParams {
    pub session: String,
    pub media_ids: Vec<String>,
}

/// A key binding as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingParams {
    pub key: String,
    pub action: String,
    #[serde(default)]
    pub album_id: Option<String>,
    #[serde(default)]
    pub album_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveBindingParams {
    pub session: String,
    pub binding: BindingParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBindingParams {
    pub session: String,
    pub id: String,
}

/// A stored key binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingInfo {
    pub id: String,
    pub key: String,
    pub action: String,
    pub album_id: Option<String>,
    pub album_name: Option<String>,
}

impl From<Binding> for BindingInfo {
    fn from(binding: Binding) -> Self {
        Self {
            id: binding.id.to_string(),
            key: binding.key,
            action: binding.action.to_string(),
            album_id: binding.album_id,
            album_name: binding.album_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub bindings: Vec<BindingInfo>,
    /// Albums the user can bind keys to. Empty when listing failed.
    pub albums: Vec<AlbumReference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveBindingResponse {
    pub success: bool,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
