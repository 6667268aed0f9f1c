//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use photoswipe_core::{
    AlbumReference, AuthorizedClient, CredentialBundle, CredentialStore, LibraryEndpoints,
    MemoryStore, OwnerId, ProviderConfig, SessionId,
};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, Respond, ResponseTemplate,
};

/// Helper to create a provider whose token endpoint lives on the mock server.
pub fn test_provider(server: &MockServer) -> ProviderConfig {
    ProviderConfig::new("test-provider", "Test Provider")
        .with_auth_url("https://example.com/auth")
        .with_token_url(format!("{}/token", server.uri()))
        .with_scopes(vec!["photoslibrary".to_string()])
}

/// A bundle that stays valid for an hour.
pub fn valid_bundle(provider: &ProviderConfig) -> CredentialBundle {
    provider
        .new_bundle("valid-access-token", "test-client-id", "test-client-secret")
        .unwrap()
        .with_refresh_token("test-refresh-token")
        .with_expiry(Utc::now() + chrono::Duration::hours(1))
}

/// A bundle that expired an hour ago.
pub fn expired_bundle(provider: &ProviderConfig) -> CredentialBundle {
    provider
        .new_bundle("expired-access-token", "test-client-id", "test-client-secret")
        .unwrap()
        .with_expiry(Utc::now() - chrono::Duration::hours(1))
}

/// Helper to open a session against the mock server.
pub async fn setup_session(
    server: &MockServer,
    bundle: CredentialBundle,
) -> (Arc<CredentialStore>, SessionId, AuthorizedClient) {
    let provider = test_provider(server);
    let credentials = Arc::new(CredentialStore::new(Arc::new(MemoryStore::new()), provider));
    let session = credentials
        .open(OwnerId::new("owner-1"), bundle)
        .await
        .unwrap();

    let endpoints = LibraryEndpoints::new(&format!("{}/v1", server.uri())).unwrap();
    let client = AuthorizedClient::new(
        credentials.clone(),
        session.clone(),
        reqwest::Client::new(),
        endpoints,
    );
    (credentials, session, client)
}

/// Token endpoint response for a successful refresh.
pub fn token_response(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3600
    })
}

/// In-memory album library served over the mock server.
///
/// Listings are paginated with the offset as page token; creations append.
#[derive(Clone, Default)]
pub struct FakeLibrary {
    albums: Arc<Mutex<Vec<AlbumReference>>>,
    create_delay: Duration,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_albums(titles: &[&str]) -> Self {
        let library = Self::new();
        {
            let mut albums = library.albums.lock();
            for title in titles {
                let id = format!("album-{}", albums.len() + 1);
                albums.push(AlbumReference {
                    id,
                    title: title.to_string(),
                });
            }
        }
        library
    }

    /// Hold every create response for `delay`.
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn albums(&self) -> Vec<AlbumReference> {
        self.albums.lock().clone()
    }

    pub fn count_titled(&self, title: &str) -> usize {
        self.albums.lock().iter().filter(|a| a.title == title).count()
    }

    pub async fn mount(&self, server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/albums"))
            .respond_with(AlbumListing(self.clone()))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/albums"))
            .respond_with(AlbumCreation(self.clone()))
            .mount(server)
            .await;
    }
}

struct AlbumListing(FakeLibrary);

impl Respond for AlbumListing {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let query = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };
        let page_size: usize = query("pageSize")
            .and_then(|v| v.parse().ok())
            .unwrap_or(50);
        let offset: usize = query("pageToken")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let albums = self.0.albums.lock();
        let page: Vec<_> = albums.iter().skip(offset).take(page_size).cloned().collect();
        let mut body = json!({ "albums": page });
        if offset + page_size < albums.len() {
            body["nextPageToken"] = json!((offset + page_size).to_string());
        }
        ResponseTemplate::new(200).set_body_json(body)
    }
}

struct AlbumCreation(FakeLibrary);

impl Respond for AlbumCreation {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let title = body["album"]["title"].as_str().unwrap_or_default().to_string();

        let mut albums = self.0.albums.lock();
        let album = AlbumReference {
            id: format!("album-{}", albums.len() + 1),
            title,
        };
        albums.push(album.clone());

        ResponseTemplate::new(200)
            .set_body_json(json!({ "id": album.id, "title": album.title }))
            .set_delay(self.0.create_delay)
    }
}
