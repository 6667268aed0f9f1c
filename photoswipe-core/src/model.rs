//! Domain model types for PhotoSwipe.
//!
//! This module defines the core types used throughout PhotoSwipe:
//! - [`SessionId`] / [`OwnerId`] - Who is acting, and for which user
//! - [`ActionRequest`] - A validated one-click action
//! - [`AlbumReference`] - An album as reported by the library API
//! - [`Binding`] - A user-defined key binding

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::PhotoSwipeError;

/// Identifier for a signed-in session.
///
/// Session ids are opaque random values handed to the caller when a session
/// is opened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session id from an existing value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random session id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the session id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of the user a session acts for.
///
/// This is the identity provider's subject identifier (`sub`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// An album as listed or created by the library API.
///
/// Fetched fresh on every resolve and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumReference {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Action request exactly as submitted by a client.
///
/// Every field is optional here; [`ActionRequest::try_from`] decides what is
/// acceptable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawActionRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub media_id: Option<String>,
    #[serde(default)]
    pub album_id: Option<String>,
}

/// What to do with a media item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move the item into the well-known trash album.
    Trash,
    /// Move the item into an explicit album.
    MoveToAlbum { album_id: String },
}

/// A validated action request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: Action,
    pub media_id: String,
}

impl ActionRequest {
    pub fn trash(media_id: impl Into<String>) -> Self {
        Self {
            action: Action::Trash,
            media_id: media_id.into(),
        }
    }

    pub fn move_to_album(media_id: impl Into<String>, album_id: impl Into<String>) -> Self {
        Self {
            action: Action::MoveToAlbum {
                album_id: album_id.into(),
            },
            media_id: media_id.into(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<RawActionRequest> for ActionRequest {
    type Error = PhotoSwipeError;

    fn try_from(raw: RawActionRequest) -> Result<Self, Self::Error> {
        let (Some(action), Some(media_id)) = (non_empty(raw.action), non_empty(raw.media_id))
        else {
            return Err(PhotoSwipeError::validation(
                "missing parameter: action and mediaId are required",
            ));
        };

        match action.as_str() {
            "trash" => Ok(Self::trash(media_id)),
            "album" => {
                let album_id = non_empty(raw.album_id).ok_or_else(|| {
                    PhotoSwipeError::validation(
                        "missing parameter: albumId is required when action is \"album\"",
                    )
                })?;
                Ok(Self::move_to_album(media_id, album_id))
            }
            _ => Err(PhotoSwipeError::validation("invalid action")),
        }
    }
}

/// Successful action result: `{ "success": true }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
}

impl ActionOutcome {
    pub fn succeeded() -> Self {
        Self { success: true }
    }
}

/// The action a key binding triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingAction {
    Trash,
    Album,
}

impl BindingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trash => "trash",
            Self::Album => "album",
        }
    }
}

impl fmt::Display for BindingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Longest key name a binding may use.
pub const MAX_BINDING_KEY_LEN: usize = 20;

/// A user-defined mapping from an input key to an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub id: Uuid,

    /// The user this binding belongs to.
    pub owner: OwnerId,

    /// Key name as reported by the browser (e.g. `"Delete"`, `"a"`).
    pub key: String,

    pub action: BindingAction,

    /// Target album for [`BindingAction::Album`].
    #[serde(default)]
    pub album_id: Option<String>,

    /// Album title at the time the binding was saved, for display only.
    #[serde(default)]
    pub album_name: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Binding {
    /// Create a new binding with a fresh id.
    pub fn new(owner: OwnerId, key: impl Into<String>, action: BindingAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            key: key.into(),
            action,
            album_id: None,
            album_name: None,
            created_at: Utc::now(),
        }
    }

    /// Point the binding at an album.
    pub fn with_album(mut self, album_id: impl Into<String>, album_name: Option<String>) -> Self {
        self.album_id = Some(album_id.into());
        self.album_name = album_name;
        self
    }

    /// Check that the binding can be stored.
    pub fn validate(&self) -> Result<(), PhotoSwipeError> {
        if self.key.trim().is_empty() {
            return Err(PhotoSwipeError::validation("missing parameter: key is required"));
        }
        if self.key.chars().count() > MAX_BINDING_KEY_LEN {
            return Err(PhotoSwipeError::validation(format!(
                "key must be at most {} characters",
                MAX_BINDING_KEY_LEN
            )));
        }
        if self.action == BindingAction::Album
            && self.album_id.as_deref().is_none_or(|id| id.trim().is_empty())
        {
            return Err(PhotoSwipeError::validation(
                "missing parameter: album_id is required when action is \"album\"",
            ));
        }
        Ok(())
    }
}
