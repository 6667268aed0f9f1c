//! Session credential lifecycle.
//!
//! [`CredentialStore`] owns every session's [`CredentialBundle`]. It decides
//! when a bundle needs refreshing, performs the refresh and writes the result
//! back to session storage before handing it out.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use photoswipe_core::{CredentialStore, MemoryStore, OwnerId, ProviderConfig};
//!
//! let provider = ProviderConfig::google();
//! let credentials = CredentialStore::new(Arc::new(MemoryStore::new()), provider.clone());
//!
//! let bundle = provider
//!     .new_bundle("ya29.access", "client-id", "client-secret")?
//!     .with_refresh_token("1//refresh");
//! let session = credentials.open(OwnerId::new("1234"), bundle).await?;
//!
//! let usable = credentials.ensure_valid(&session).await?;
//! println!("Access token: {}", usable.access_token.expose());
//! # Ok(())
//! # }
//! ```

use chrono::Duration;
use std::sync::Arc;

use crate::{
    credential::{CredentialBundle, CredentialState, SessionRecord},
    error::{AuthError, PhotoSwipeError, Result},
    locks::KeyedLocks,
    model::{OwnerId, SessionId},
    provider::{refresh_grant, ProviderConfig},
    store::{Secret, SessionStore},
};

/// Default expiry buffer in minutes.
///
/// Tokens are considered expired if they expire within this many minutes.
const DEFAULT_EXPIRY_BUFFER_MINUTES: i64 = 5;

/// Holds, validates and refreshes per-session credentials.
///
/// Refreshes are single-flight per session: concurrent callers that find the
/// same expired bundle wait for one refresh and then share its result.
pub struct CredentialStore {
    store: Arc<dyn SessionStore>,
    provider: ProviderConfig,
    expiry_buffer: Duration,
    refresh_guards: KeyedLocks<SessionId>,
}

impl CredentialStore {
    /// Create a credential store with the default expiry buffer of 5 minutes.
    pub fn new(store: Arc<dyn SessionStore>, provider: ProviderConfig) -> Self {
        Self::with_expiry_buffer(
            store,
            provider,
            Duration::minutes(DEFAULT_EXPIRY_BUFFER_MINUTES),
        )
    }

    /// Create a credential store with a custom expiry buffer.
    pub fn with_expiry_buffer(
        store: Arc<dyn SessionStore>,
        provider: ProviderConfig,
        expiry_buffer: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            expiry_buffer,
            refresh_guards: KeyedLocks::new(),
        }
    }

    /// Get the storage key for a session.
    fn session_key(session: &SessionId) -> String {
        format!("photoswipe/session/{}", session.as_str())
    }

    async fn load(&self, session: &SessionId) -> Result<Option<SessionRecord>> {
        let Some(raw) = self.store.get(&Self::session_key(session)).await? else {
            return Ok(None);
        };
        let record = serde_json::from_str(raw.expose()).map_err(crate::store::StoreError::from)?;
        Ok(Some(record))
    }

    async fn load_required(&self, session: &SessionId) -> Result<SessionRecord> {
        self.load(session)
            .await?
            .ok_or_else(|| AuthError::NoSession.into())
    }

    async fn save(&self, session: &SessionId, record: &SessionRecord) -> Result<()> {
        let raw = serde_json::to_string(record).map_err(crate::store::StoreError::from)?;
        self.store
            .set(&Self::session_key(session), &Secret::new(raw))
            .await?;
        Ok(())
    }

    /// Start a session for `owner` with a freshly issued bundle.
    pub async fn open(&self, owner: OwnerId, bundle: CredentialBundle) -> Result<SessionId> {
        if bundle.access_token.is_empty() {
            return Err(PhotoSwipeError::validation(
                "credential bundle has an empty access token",
            ));
        }

        let session = SessionId::generate();
        self.save(&session, &SessionRecord::new(owner, bundle)).await?;

        tracing::info!("Opened session {}", session);
        Ok(session)
    }

    /// The current bundle for `session`, without refreshing it.
    pub async fn get(&self, session: &SessionId) -> Result<CredentialBundle> {
        Ok(self.load_required(session).await?.credentials)
    }

    /// The user `session` acts for.
    pub async fn owner(&self, session: &SessionId) -> Result<OwnerId> {
        Ok(self.load_required(session).await?.owner)
    }

    /// Where the session's credential sits in its lifecycle.
    pub async fn state(&self, session: &SessionId) -> Result<CredentialState> {
        let record = self.load_required(session).await?;
        if self.refresh_guards.is_locked(session) {
            return Ok(CredentialState::Refreshing);
        }
        Ok(record.credentials.state(self.expiry_buffer))
    }

    /// Return a bundle that is usable right now, refreshing it if needed.
    ///
    /// A refreshed bundle is persisted before it is returned. Fails with
    /// [`AuthError`] when the session is missing, cannot be refreshed, or the
    /// refresh is rejected.
    pub async fn ensure_valid(&self, session: &SessionId) -> Result<CredentialBundle> {
        let record = self.load_required(session).await?;
        if record.credentials.state(self.expiry_buffer) == CredentialState::Valid {
            tracing::debug!("Using stored access token for session {}", session);
            return Ok(record.credentials);
        }

        let _guard = self.refresh_guards.lock(session).await;

        // Another request may have refreshed while we waited for the guard.
        let SessionRecord {
            owner,
            credentials,
            opened_at,
        } = self.load_required(session).await?;

        let refresh_token = match credentials.state(self.expiry_buffer) {
            CredentialState::Valid => {
                tracing::debug!("Session {} was refreshed by a concurrent request", session);
                return Ok(credentials);
            }
            CredentialState::Unrefreshable => {
                tracing::warn!(
                    "Access token expired for session {} and no refresh token is available",
                    session
                );
                return Err(AuthError::Unrefreshable.into());
            }
            CredentialState::Expired | CredentialState::Refreshing => credentials
                .usable_refresh_token()
                .cloned()
                .ok_or(AuthError::Unrefreshable)?,
        };

        tracing::info!("Access token expired for session {}, attempting refresh", session);

        let refreshed = match refresh_grant(&self.provider, &credentials, &refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                tracing::error!("Failed to refresh token for session {}: {}", session, e);
                return Err(e.into());
            }
        };

        let record = SessionRecord {
            owner,
            credentials: refreshed.apply_to(credentials),
            opened_at,
        };
        self.save(session, &record).await?;

        tracing::info!("Successfully refreshed access token for session {}", session);
        Ok(record.credentials)
    }

    /// End `session` and forget its credential.
    ///
    /// Waits for an in-flight refresh of the session to finish, so a refresh
    /// cannot write the record back after it has been deleted.
    pub async fn clear(&self, session: &SessionId) -> Result<()> {
        let _guard = self.refresh_guards.lock(session).await;
        self.store.delete(&Self::session_key(session)).await?;
        tracing::info!("Cleared session {}", session);
        Ok(())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("provider", &self.provider.id)
            .field("expiry_buffer", &self.expiry_buffer)
            .finish()
    }
}
