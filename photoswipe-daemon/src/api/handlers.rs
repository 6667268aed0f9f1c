//! JSON-RPC API handlers for the daemon.

use super::types::{
    BindingInfo, BindingParams, CredentialStatusResponse, CredentialsParams, OpenSessionResponse,
    SaveBindingResponse, SettingsResponse, SuccessResponse,
};
use crate::config::DaemonConfig;
use anyhow::{Context, Result};
use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::{ErrorCode, ErrorObject, ErrorObjectOwned};
use photoswipe_core::{
    ActionDispatcher, ActionOutcome, AlbumResolver, AuthorizedClient, Binding, BindingAction,
    BindingStore, CredentialStore, ErrorKind, LibraryEndpoints, MediaFetcher, MemoryStore,
    OwnerId, PhotoSwipeError, ProviderConfig, RawActionRequest, SessionId,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// JSON-RPC error codes for the application error kinds.
pub const AUTH_ERROR_CODE: i32 = -32001;
pub const UPSTREAM_ERROR_CODE: i32 = -32002;
pub const NOT_FOUND_ERROR_CODE: i32 = -32004;

/// State shared across RPC handlers.
pub struct ApiState {
    /// Per-session credentials, held in memory for the daemon's lifetime
    pub credentials: Arc<CredentialStore>,
    /// Provider that issued the credentials handed to `open_session`
    pub provider: ProviderConfig,
    /// Persistent key bindings
    pub bindings: Arc<BindingStore>,
    /// Album title resolution shared by every session
    pub resolver: Arc<AlbumResolver>,
    pub dispatcher: ActionDispatcher,
    pub fetcher: MediaFetcher,
    pub endpoints: LibraryEndpoints,
    http: reqwest::Client,
}

impl ApiState {
    /// Build the API state described by `config`.
    pub fn from_config(config: &DaemonConfig) -> Result<Self> {
        let provider = config.provider_config();
        let credentials = CredentialStore::with_expiry_buffer(
            Arc::new(MemoryStore::new()),
            provider.clone(),
            config.expiry_buffer()?,
        );

        let bindings_path = config.bindings_path();
        let bindings = BindingStore::load_from_path(bindings_path.clone())
            .with_context(|| format!("Failed to load bindings from {:?}", bindings_path))?;

        let endpoints = LibraryEndpoints::new(&config.library.api_base)
            .context("Invalid library API base URL")?;

        let resolver = Arc::new(AlbumResolver::with_page_size(config.library.album_page_size));
        let dispatcher = ActionDispatcher::new(resolver.clone())
            .with_trash_album_title(&config.library.trash_album_title);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.library.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            credentials: Arc::new(credentials),
            provider,
            bindings: Arc::new(bindings),
            resolver,
            dispatcher,
            fetcher: MediaFetcher::new(),
            endpoints,
            http,
        })
    }

    /// Session guard: resolve the owner of `session` or fail with an
    /// authentication error before anything else runs.
    pub async fn require_session(&self, session: &SessionId) -> Result<OwnerId, PhotoSwipeError> {
        self.credentials.owner(session).await
    }

    /// A library client acting for `session`.
    pub fn client_for(&self, session: SessionId) -> AuthorizedClient {
        AuthorizedClient::new(
            self.credentials.clone(),
            session,
            self.http.clone(),
            self.endpoints.clone(),
        )
    }
}

/// JSON-RPC API trait definition.
#[rpc(server)]
pub trait PhotoSwipeApi {
    /// Start a session for `owner` with a freshly issued token set.
    ///
    /// # Returns
    ///
    /// The session id every other method takes.
    #[method(name = "open_session", param_kind = map)]
    async fn open_session(
        &self,
        owner: String,
        credentials: CredentialsParams,
    ) -> RpcResult<OpenSessionResponse>;

    /// End a session and forget its credential.
    #[method(name = "close_session", param_kind = map)]
    async fn close_session(&self, session: String) -> RpcResult<SuccessResponse>;

    /// Report where the session's credential sits in its lifecycle.
    #[method(name = "credential_status", param_kind = map)]
    async fn credential_status(&self, session: String) -> RpcResult<CredentialStatusResponse>;

    /// Trash a media item or move it into an album.
    ///
    /// # Parameters
    ///
    /// - `request`: `{ action, mediaId, albumId? }` with `action` one of
    ///   `"trash"` or `"album"`
    #[method(name = "perform_action", param_kind = map)]
    async fn perform_action(
        &self,
        session: String,
        request: RawActionRequest,
    ) -> RpcResult<ActionOutcome>;

    /// Fetch metadata for up to 50 media items.
    ///
    /// # Returns
    ///
    /// The library's batch-get body, unmodified.
    #[method(name = "get_media", param_kind = map)]
    async fn get_media(
        &self,
        session: String,
        media_ids: Vec<String>,
    ) -> RpcResult<serde_json::Value>;

    /// The caller's key bindings and the albums available to bind.
    #[method(name = "get_settings", param_kind = map)]
    async fn get_settings(&self, session: String) -> RpcResult<SettingsResponse>;

    /// Save a new key binding for the caller.
    #[method(name = "save_binding", param_kind = map)]
    async fn save_binding(
        &self,
        session: String,
        binding: BindingParams,
    ) -> RpcResult<SaveBindingResponse>;

    /// Delete one of the caller's key bindings.
    #[method(name = "delete_binding", param_kind = map)]
    async fn delete_binding(&self, session: String, id: String) -> RpcResult<SuccessResponse>;
}

/// Implementation of the PhotoSwipe API.
pub struct PhotoSwipeApiImpl {
    state: ApiState,
}

impl PhotoSwipeApiImpl {
    /// Create a new API implementation with the given state.
    pub fn new(state: ApiState) -> Self {
        Self { state }
    }

    async fn guard(&self, session: String) -> Result<(SessionId, OwnerId), ErrorObjectOwned> {
        let session = SessionId::new(session);
        let owner = self
            .state
            .require_session(&session)
            .await
            .map_err(error_object)?;
        Ok((session, owner))
    }
}

#[async_trait::async_trait]
impl PhotoSwipeApiServer for PhotoSwipeApiImpl {
    async fn open_session(
        &self,
        owner: String,
        credentials: CredentialsParams,
    ) -> RpcResult<OpenSessionResponse> {
        info!("RPC: open_session(owner: {})", owner);

        if owner.trim().is_empty() {
            return Err(error_object(PhotoSwipeError::validation(
                "missing parameter: owner is required",
            )));
        }

        let mut bundle = self
            .state
            .provider
            .new_bundle(
                credentials.access_token,
                credentials.client_id,
                credentials.client_secret,
            )
            .map_err(error_object)?;
        if let Some(refresh_token) = credentials.refresh_token {
            bundle = bundle.with_refresh_token(refresh_token);
        }
        if let Some(expiry) = credentials.expiry {
            bundle = bundle.with_expiry(expiry);
        }
        if let Some(scopes) = credentials.scopes {
            bundle = bundle.with_scopes(scopes);
        }

        let session = self
            .state
            .credentials
            .open(OwnerId::new(owner), bundle)
            .await
            .map_err(error_object)?;

        Ok(OpenSessionResponse {
            session: session.to_string(),
        })
    }

    async fn close_session(&self, session: String) -> RpcResult<SuccessResponse> {
        info!("RPC: close_session({})", session);

        let (session, _) = self.guard(session).await?;
        self.state
            .credentials
            .clear(&session)
            .await
            .map_err(error_object)?;
        Ok(SuccessResponse::ok())
    }

    async fn credential_status(&self, session: String) -> RpcResult<CredentialStatusResponse> {
        debug!("RPC: credential_status({})", session);

        let (session, _) = self.guard(session).await?;
        let state = self
            .state
            .credentials
            .state(&session)
            .await
            .map_err(error_object)?;
        let bundle = self
            .state
            .credentials
            .get(&session)
            .await
            .map_err(error_object)?;

        Ok(CredentialStatusResponse {
            state,
            expires_at: bundle.expiry.map(|dt| dt.to_rfc3339()),
        })
    }

    async fn perform_action(
        &self,
        session: String,
        request: RawActionRequest,
    ) -> RpcResult<ActionOutcome> {
        info!(
            "RPC: perform_action({}, action: {:?}, media: {:?})",
            session, request.action, request.media_id
        );

        let (session, _) = self.guard(session).await?;
        let client = self.state.client_for(session);
        self.state
            .dispatcher
            .dispatch(&client, request)
            .await
            .map_err(error_object)
    }

    async fn get_media(
        &self,
        session: String,
        media_ids: Vec<String>,
    ) -> RpcResult<serde_json::Value> {
        debug!("RPC: get_media({}, {} ids)", session, media_ids.len());

        let (session, _) = self.guard(session).await?;
        let client = self.state.client_for(session);
        self.state
            .fetcher
            .batch_get(&client, &media_ids)
            .await
            .map_err(error_object)
    }

    async fn get_settings(&self, session: String) -> RpcResult<SettingsResponse> {
        debug!("RPC: get_settings({})", session);

        let (session, owner) = self.guard(session).await?;
        let bindings = self
            .state
            .bindings
            .list(&owner)
            .map_err(|e| error_object(e.into()))?;

        let client = self.state.client_for(session);
        let albums = match self.state.resolver.list_albums(&client).await {
            Ok(albums) => albums,
            Err(e) => {
                warn!("Could not list albums for settings of {}: {}", owner, e);
                Vec::new()
            }
        };

        Ok(SettingsResponse {
            bindings: bindings.into_iter().map(BindingInfo::from).collect(),
            albums,
        })
    }

    async fn save_binding(
        &self,
        session: String,
        binding: BindingParams,
    ) -> RpcResult<SaveBindingResponse> {
        info!("RPC: save_binding({}, key: {:?})", session, binding.key);

        let (_, owner) = self.guard(session).await?;

        let action = match binding.action.as_str() {
            "trash" => BindingAction::Trash,
            "album" => BindingAction::Album,
            _ => {
                return Err(error_object(PhotoSwipeError::validation("invalid action")));
            }
        };

        let mut new_binding = Binding::new(owner, binding.key, action);
        if action == BindingAction::Album {
            if let Some(album_id) = binding.album_id {
                new_binding = new_binding.with_album(album_id, binding.album_name);
            }
        }
        let id = new_binding.id;

        self.state
            .bindings
            .put(new_binding)
            .map_err(|e| error_object(e.into()))?;

        Ok(SaveBindingResponse {
            success: true,
            id: id.to_string(),
        })
    }

    async fn delete_binding(&self, session: String, id: String) -> RpcResult<SuccessResponse> {
        info!("RPC: delete_binding({}, {})", session, id);

        let (_, owner) = self.guard(session).await?;
        let id = Uuid::parse_str(&id).map_err(|_| {
            error_object(PhotoSwipeError::not_found(format!("binding {} not found", id)))
        })?;

        self.state
            .bindings
            .delete(&owner, id)
            .map_err(|e| error_object(e.into()))?;
        Ok(SuccessResponse::ok())
    }
}

/// Render an application error as a JSON-RPC error object whose `data` is
/// the `{ error, httpStatus }` envelope.
pub fn error_object(err: PhotoSwipeError) -> ErrorObjectOwned {
    let code = match err.kind() {
        ErrorKind::Validation => ErrorCode::InvalidParams.code(),
        ErrorKind::Auth => AUTH_ERROR_CODE,
        ErrorKind::Upstream => UPSTREAM_ERROR_CODE,
        ErrorKind::NotFound => NOT_FOUND_ERROR_CODE,
        ErrorKind::Internal => ErrorCode::InternalError.code(),
    };

    match err.kind() {
        ErrorKind::Internal | ErrorKind::Upstream => warn!("RPC failed: {}", err),
        _ => debug!("RPC rejected: {}", err),
    }

    ErrorObject::owned(code, err.to_string(), Some(err.envelope()))
}

pub(crate) fn internal_error<E: std::fmt::Display>(err: E) -> ErrorObjectOwned {
    ErrorObject::owned(
        ErrorCode::InternalError.code(),
        format!("{}", err),
        None::<()>,
    )
}
