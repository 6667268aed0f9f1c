//! One-click action dispatch.
//!
//! [`ActionDispatcher`] validates an incoming action request and routes it:
//! `trash` resolves the well-known trash album by title, `album` moves into
//! the album id supplied by the caller. Validation always completes before
//! any external call, including a credential refresh.

use std::sync::Arc;

use crate::{
    album::AlbumResolver,
    client::AuthorizedClient,
    error::Result,
    media::MediaMover,
    model::{Action, ActionOutcome, ActionRequest, RawActionRequest},
};

/// Title of the album trashed items are moved into.
pub const DEFAULT_TRASH_ALBUM_TITLE: &str = "PhotoSwipe Trash";

/// Validates and performs action requests.
///
/// Holds no per-request state; one dispatcher serves every session.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    resolver: Arc<AlbumResolver>,
    mover: MediaMover,
    trash_album_title: String,
}

impl ActionDispatcher {
    pub fn new(resolver: Arc<AlbumResolver>) -> Self {
        Self {
            resolver,
            mover: MediaMover::new(),
            trash_album_title: DEFAULT_TRASH_ALBUM_TITLE.to_string(),
        }
    }

    /// Use a different trash album title.
    pub fn with_trash_album_title(mut self, title: impl Into<String>) -> Self {
        self.trash_album_title = title.into();
        self
    }

    pub fn trash_album_title(&self) -> &str {
        &self.trash_album_title
    }

    /// Validate a client-submitted request and perform it.
    pub async fn dispatch(
        &self,
        client: &AuthorizedClient,
        raw: RawActionRequest,
    ) -> Result<ActionOutcome> {
        let request = ActionRequest::try_from(raw)?;
        self.perform(client, &request).await
    }

    /// Perform an already validated request.
    pub async fn perform(
        &self,
        client: &AuthorizedClient,
        request: &ActionRequest,
    ) -> Result<ActionOutcome> {
        let album_id = match &request.action {
            Action::Trash => {
                let trash = self
                    .resolver
                    .resolve_or_create(client, &self.trash_album_title)
                    .await?;
                tracing::debug!("Trashing {} into album {}", request.media_id, trash.id);
                trash.id
            }
            Action::MoveToAlbum { album_id } => album_id.clone(),
        };

        self.mover
            .move_item(client, &request.media_id, &album_id)
            .await?;
        Ok(ActionOutcome::succeeded())
    }
}
