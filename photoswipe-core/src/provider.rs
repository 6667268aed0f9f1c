//! Identity provider configuration and the refresh grant.
//!
//! This module provides:
//! - [`ProviderConfig`] - Endpoints and scopes of the identity provider
//! - [`refresh_grant`] - Exchanges a refresh token for a new access token
//!
//! The authorization-code exchange happens elsewhere; this crate only ever
//! performs `grant_type=refresh_token`.

use chrono::{DateTime, Utc};
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthUrl, ClientId, ClientSecret,
    RefreshToken, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::credential::CredentialBundle;
use crate::error::{AuthError, PhotoSwipeError};
use crate::store::Secret;

/// Configuration for the identity provider.
///
/// # Example
///
/// ```
/// use photoswipe_core::provider::ProviderConfig;
///
/// let google = ProviderConfig::google();
/// assert_eq!(google.token_url, "https://oauth2.googleapis.com/token");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Unique identifier for the provider (e.g., "google").
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// OAuth authorization endpoint URL.
    pub auth_url: String,

    /// OAuth token endpoint URL.
    pub token_url: String,

    /// Scopes requested when a user authorizes.
    pub default_scopes: Vec<String>,
}

impl ProviderConfig {
    /// Create a new provider configuration.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            auth_url: String::new(),
            token_url: String::new(),
            default_scopes: Vec::new(),
        }
    }

    /// Google accounts with Photos Library access.
    pub fn google() -> Self {
        Self::new("google", "Google")
            .with_auth_url("https://accounts.google.com/o/oauth2/auth")
            .with_token_url("https://oauth2.googleapis.com/token")
            .with_scopes(vec![
                "https://www.googleapis.com/auth/photoslibrary".to_string(),
                "https://www.googleapis.com/auth/photoslibrary.sharing".to_string(),
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ])
    }

    /// Set the authorization URL.
    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    /// Set the token URL.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Set the default scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Start a credential bundle issued by this provider.
    pub fn new_bundle(
        &self,
        access_token: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<CredentialBundle, PhotoSwipeError> {
        let token_endpoint = Url::parse(&self.token_url).map_err(|e| PhotoSwipeError::Config {
            message: format!("invalid token URL for {}: {}", self.id, e),
        })?;
        Ok(
            CredentialBundle::new(access_token, token_endpoint, client_id, client_secret)
                .with_scopes(self.default_scopes.iter().cloned()),
        )
    }
}

/// Result of a successful refresh grant.
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub access_token: Secret,
    pub expiry: Option<DateTime<Utc>>,
    /// Present only when the provider rotated the refresh token.
    pub refresh_token: Option<Secret>,
    /// Present only when the provider reported granted scopes.
    pub scopes: Option<Vec<String>>,
}

impl RefreshedToken {
    /// Fold the refresh result into the bundle it was obtained for.
    ///
    /// The old refresh token survives unless a new one was issued.
    pub fn apply_to(self, mut bundle: CredentialBundle) -> CredentialBundle {
        bundle.access_token = self.access_token;
        bundle.expiry = self.expiry;
        if let Some(refresh_token) = self.refresh_token.filter(|t| !t.is_empty()) {
            bundle.refresh_token = Some(refresh_token);
        }
        if let Some(scopes) = self.scopes {
            bundle.scopes = scopes.into_iter().collect();
        }
        bundle
    }
}

fn create_oauth_client(
    provider: &ProviderConfig,
    bundle: &CredentialBundle,
) -> Result<BasicClient, AuthError> {
    let auth_url =
        AuthUrl::new(provider.auth_url.clone()).map_err(|e| AuthError::RefreshFailed {
            message: format!("invalid auth URL: {}", e),
        })?;

    let token_url = TokenUrl::new(bundle.token_endpoint.to_string()).map_err(|e| {
        AuthError::RefreshFailed {
            message: format!("invalid token URL: {}", e),
        }
    })?;

    Ok(BasicClient::new(
        ClientId::new(bundle.client_id.clone()),
        Some(ClientSecret::new(bundle.client_secret.expose().to_string())),
        auth_url,
        Some(token_url),
    ))
}

/// Exchange `refresh_token` for a new access token at the bundle's token
/// endpoint.
pub async fn refresh_grant(
    provider: &ProviderConfig,
    bundle: &CredentialBundle,
    refresh_token: &Secret,
) -> Result<RefreshedToken, AuthError> {
    let client = create_oauth_client(provider, bundle)?;

    let token_response = client
        .exchange_refresh_token(&RefreshToken::new(refresh_token.expose().to_string()))
        .request_async(async_http_client)
        .await
        .map_err(|e| AuthError::RefreshFailed {
            message: e.to_string(),
        })?;

    let access_token = token_response.access_token().secret().to_string();
    if access_token.is_empty() {
        return Err(AuthError::RefreshFailed {
            message: "token endpoint returned an empty access token".to_string(),
        });
    }

    let expiry = match token_response.expires_in() {
        Some(duration) => {
            let lifetime =
                chrono::Duration::from_std(duration).map_err(|e| AuthError::RefreshFailed {
                    message: format!("invalid expiration duration: {}", e),
                })?;
            Some(Utc::now() + lifetime)
        }
        None => None,
    };

    Ok(RefreshedToken {
        access_token: Secret::new(access_token),
        expiry,
        refresh_token: token_response
            .refresh_token()
            .map(|t| Secret::new(t.secret().to_string())),
        scopes: token_response
            .scopes()
            .map(|s| s.iter().map(|scope| scope.to_string()).collect()),
    })
}
