//! Delegated-authorization credentials.
//!
//! This module provides:
//! - [`CredentialBundle`] - The token set a session acts with
//! - [`CredentialState`] - Where a session's credential sits in its lifecycle
//! - [`SessionRecord`] - What session storage holds per session

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

use crate::model::OwnerId;
use crate::store::Secret;

/// A delegated-authorization token set.
///
/// Produced by the authorization-code exchange and replaced on every
/// successful refresh. Only [`CredentialStore`](crate::CredentialStore)
/// replaces a stored bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    pub access_token: Secret,

    /// Long-lived refresh token. Empty strings are treated as absent.
    #[serde(default)]
    pub refresh_token: Option<Secret>,

    /// Identity provider endpoint used for the refresh grant.
    pub token_endpoint: Url,

    pub client_id: String,

    pub client_secret: Secret,

    #[serde(default)]
    pub scopes: BTreeSet<String>,

    /// When the access token lapses. `None` means the provider did not say.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl CredentialBundle {
    /// Create a bundle with no refresh token, scopes or expiry.
    pub fn new(
        access_token: impl Into<String>,
        token_endpoint: Url,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            access_token: Secret::new(access_token),
            refresh_token: None,
            token_endpoint,
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret),
            scopes: BTreeSet::new(),
            expiry: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(Secret::new(refresh_token));
        self
    }

    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// The refresh token, if one is present and non-empty.
    pub fn usable_refresh_token(&self) -> Option<&Secret> {
        self.refresh_token.as_ref().filter(|t| !t.is_empty())
    }

    /// Whether the access token lapses within `buffer` from now.
    ///
    /// A bundle without an expiry never counts as expired.
    pub fn expires_within(&self, buffer: Duration) -> bool {
        self.expiry.is_some_and(|exp| exp <= Utc::now() + buffer)
    }

    /// Lifecycle state ignoring any refresh in flight.
    pub fn state(&self, buffer: Duration) -> CredentialState {
        if self.access_token.is_empty() {
            // An empty access token is never Valid.
            return match self.usable_refresh_token() {
                Some(_) => CredentialState::Expired,
                None => CredentialState::Unrefreshable,
            };
        }
        if !self.expires_within(buffer) {
            CredentialState::Valid
        } else if self.usable_refresh_token().is_some() {
            CredentialState::Expired
        } else {
            CredentialState::Unrefreshable
        }
    }
}

/// Lifecycle state of a session's credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialState {
    /// Usable as is.
    Valid,
    /// Expired, but a refresh token is available.
    Expired,
    /// A refresh for this session is in flight.
    Refreshing,
    /// Expired with no way to refresh; the user must authorize again.
    Unrefreshable,
}

/// Everything session storage holds for one session.
///
/// Persisted as a single JSON document so a write-back replaces all of it or
/// none of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub owner: OwnerId,
    pub credentials: CredentialBundle,
    pub opened_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(owner: OwnerId, credentials: CredentialBundle) -> Self {
        Self {
            owner,
            credentials,
            opened_at: Utc::now(),
        }
    }
}
