//! Authorized access to the photo library API.
//!
//! This module provides:
//! - [`LibraryEndpoints`] - URLs of the library operations PhotoSwipe uses
//! - [`AuthorizedClient`] - Issues calls on behalf of one session

use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::{
    credential_store::CredentialStore,
    error::{AuthError, PhotoSwipeError, Result},
    model::SessionId,
};

/// Base URL of the Google Photos Library API.
pub const GOOGLE_PHOTOS_API: &str = "https://photoslibrary.googleapis.com/v1";

/// URLs of the library operations, relative to a configurable API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEndpoints {
    api_base: Url,
}

impl LibraryEndpoints {
    /// Build endpoints under `api_base` (e.g. `https://photoslibrary.googleapis.com/v1`).
    pub fn new(api_base: &str) -> Result<Self> {
        let api_base = Url::parse(api_base).map_err(|e| PhotoSwipeError::Config {
            message: format!("invalid library API base {:?}: {}", api_base, e),
        })?;
        if api_base.cannot_be_a_base() {
            return Err(PhotoSwipeError::Config {
                message: format!("library API base {} cannot hold paths", api_base),
            });
        }
        Ok(Self { api_base })
    }

    /// Endpoints of the public Google Photos Library API.
    pub fn google_photos() -> Result<Self> {
        Self::new(GOOGLE_PHOTOS_API)
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| PhotoSwipeError::Config {
                message: format!("library API base {} cannot hold paths", self.api_base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET albums?pageSize=..&pageToken=..`
    pub fn list_albums(&self, page_size: u32, page_token: Option<&str>) -> Result<Url> {
        let mut url = self.endpoint(&["albums"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &page_size.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        Ok(url)
    }

    /// `POST albums`
    pub fn create_album(&self) -> Result<Url> {
        self.endpoint(&["albums"])
    }

    /// `POST albums/{id}:batchAddMediaItems`
    pub fn batch_add_media(&self, album_id: &str) -> Result<Url> {
        self.endpoint(&["albums", &format!("{}:batchAddMediaItems", album_id)])
    }

    /// `GET mediaItems:batchGet?mediaItemIds=..` (one pair per id)
    pub fn batch_get_media(&self, media_ids: &[String]) -> Result<Url> {
        let mut url = self.endpoint(&["mediaItems:batchGet"])?;
        {
            let mut query = url.query_pairs_mut();
            for id in media_ids {
                query.append_pair("mediaItemIds", id);
            }
        }
        Ok(url)
    }
}

/// Issues library API calls with a session's current access token.
///
/// Every call goes through [`CredentialStore::ensure_valid`] first, so an
/// expired token is refreshed before the request leaves. Calls are never
/// retried.
#[derive(Clone)]
pub struct AuthorizedClient {
    credentials: Arc<CredentialStore>,
    session: SessionId,
    http: reqwest::Client,
    endpoints: LibraryEndpoints,
}

impl AuthorizedClient {
    pub fn new(
        credentials: Arc<CredentialStore>,
        session: SessionId,
        http: reqwest::Client,
        endpoints: LibraryEndpoints,
    ) -> Self {
        Self {
            credentials,
            session,
            http,
            endpoints,
        }
    }

    /// The session this client acts for.
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn endpoints(&self) -> &LibraryEndpoints {
        &self.endpoints
    }

    /// Issue `method url` with an optional JSON body.
    ///
    /// Returns the parsed 2xx body (`Value::Null` when empty). A 401 becomes
    /// [`AuthError::Revoked`]; any other non-2xx becomes
    /// [`PhotoSwipeError::Upstream`] carrying the external status, message
    /// and body.
    pub async fn request(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        let bundle = self.credentials.ensure_valid(&self.session).await?;

        tracing::debug!("{} {} (session {})", method, url.path(), self.session);

        let mut builder = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(bundle.access_token.expose());
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| PhotoSwipeError::Network {
            message: format!("{} {}: {}", method, url.path(), e),
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| PhotoSwipeError::Network {
            message: format!("reading response of {} {}: {}", method, url.path(), e),
        })?;

        if status == StatusCode::UNAUTHORIZED {
            let message = upstream_message(&text)
                .unwrap_or_else(|| "request had invalid authentication credentials".to_string());
            tracing::warn!(
                "Library API rejected the credential of session {}: {}",
                self.session,
                message
            );
            return Err(AuthError::Revoked { message }.into());
        }

        if !status.is_success() {
            let message = upstream_message(&text)
                .unwrap_or_else(|| format!("library API returned HTTP {}", status.as_u16()));
            tracing::warn!(
                "{} {} failed with {}: {}",
                method,
                url.path(),
                status.as_u16(),
                message
            );
            return Err(PhotoSwipeError::Upstream {
                status: status.as_u16(),
                message,
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| PhotoSwipeError::Upstream {
            status: StatusCode::BAD_GATEWAY.as_u16(),
            message: format!("library API returned malformed JSON: {}", e),
            body: text,
        })
    }

    pub async fn get(&self, url: Url) -> Result<Value> {
        self.request(Method::GET, url, None).await
    }

    pub async fn post(&self, url: Url, body: &Value) -> Result<Value> {
        self.request(Method::POST, url, Some(body)).await
    }
}

impl std::fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("session", &self.session)
            .field("api_base", &self.endpoints.api_base.as_str())
            .finish()
    }
}

/// Pull a human-readable message out of an API error body.
///
/// Understands Google's `{"error": {"message": ..}}` and the OAuth-style
/// `{"error": "..", "error_description": ".."}` shapes.
fn upstream_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    if let Some(message) = error.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }
    let code = error.as_str()?;
    match value.get("error_description").and_then(Value::as_str) {
        Some(description) => Some(format!("{}: {}", code, description)),
        None => Some(code.to_string()),
    }
}
