//! Media item mutations and lookups.

use serde_json::{json, Value};

use crate::{
    client::AuthorizedClient,
    error::{PhotoSwipeError, Result},
};

/// Most media ids the library accepts in one batch-get.
pub const MAX_BATCH_GET: usize = 50;

/// Moves single media items into albums.
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaMover;

impl MediaMover {
    pub fn new() -> Self {
        Self
    }

    /// Add `media_id` to `album_id` with a single-item `batchAddMediaItems`.
    ///
    /// Only a 2xx counts as success. The batch call's partial-success
    /// semantics are opaque, so any failure is returned with the external
    /// body attached verbatim.
    pub async fn move_item(
        &self,
        client: &AuthorizedClient,
        media_id: &str,
        album_id: &str,
    ) -> Result<()> {
        let url = client.endpoints().batch_add_media(album_id)?;
        let payload = json!({ "mediaItemIds": [media_id] });

        match client.post(url, &payload).await {
            Ok(_) => {
                tracing::info!("Moved media item {} into album {}", media_id, album_id);
                Ok(())
            }
            Err(PhotoSwipeError::Upstream {
                status,
                message,
                body,
            }) => {
                let detail = if body.trim().is_empty() { &message } else { &body };
                let message = format!("could not move media item into album: {}", detail);
                Err(PhotoSwipeError::Upstream {
                    status,
                    message,
                    body,
                })
            }
            Err(other) => Err(other),
        }
    }
}

/// Fetches media item metadata in batches.
#[derive(Debug, Default, Clone, Copy)]
pub struct MediaFetcher;

impl MediaFetcher {
    pub fn new() -> Self {
        Self
    }

    /// Forward up to 50 ids to `mediaItems:batchGet` and return the external
    /// JSON body untouched.
    pub async fn batch_get(&self, client: &AuthorizedClient, media_ids: &[String]) -> Result<Value> {
        if media_ids.is_empty() || media_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(PhotoSwipeError::validation(
                "missing parameter: mediaIds is required",
            ));
        }
        if media_ids.len() > MAX_BATCH_GET {
            return Err(PhotoSwipeError::validation(format!(
                "at most {} mediaIds may be requested at once",
                MAX_BATCH_GET
            )));
        }

        let url = client.endpoints().batch_get_media(media_ids)?;
        client.get(url).await
    }
}
