//! Album title resolution.
//!
//! [`AlbumResolver`] turns a human-readable album title into the album's
//! stable id, creating the album the first time the title is used. Results
//! are never cached: an album deleted on the library side is simply created
//! again on the next resolve.

use serde::Deserialize;
use serde_json::json;

use crate::{
    client::AuthorizedClient,
    error::{PhotoSwipeError, Result},
    locks::KeyedLocks,
    model::{AlbumReference, SessionId},
};

/// Default number of albums requested per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page size the library API accepts for album listings.
pub const MAX_PAGE_SIZE: u32 = 50;

/// One page of `GET albums`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlbumPage {
    #[serde(default)]
    albums: Vec<AlbumReference>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Maps album titles to album ids.
///
/// `resolve_or_create` runs list-then-create inside a critical section keyed
/// by (session, title), so two concurrent resolves of the same title in one
/// session cannot both create an album.
#[derive(Debug)]
pub struct AlbumResolver {
    page_size: u32,
    guards: KeyedLocks<(SessionId, String)>,
}

impl AlbumResolver {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Use `page_size` albums per listing page, clamped to `1..=50`.
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            guards: KeyedLocks::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn fetch_page(
        &self,
        client: &AuthorizedClient,
        page_token: Option<&str>,
    ) -> Result<AlbumPage> {
        let url = client.endpoints().list_albums(self.page_size, page_token)?;
        let body = client.get(url).await?;
        if body.is_null() {
            return Ok(AlbumPage::default());
        }
        serde_json::from_value(body).map_err(|e| PhotoSwipeError::Upstream {
            status: 502,
            message: format!("unexpected album listing: {}", e),
            body: String::new(),
        })
    }

    /// Walk every listing page, stopping early when `visit` returns `true`
    /// for an album. Returns that album, if any.
    async fn scan(
        &self,
        client: &AuthorizedClient,
        mut visit: impl FnMut(&AlbumReference) -> bool,
    ) -> Result<Option<AlbumReference>> {
        let mut page_token: Option<String> = None;
        loop {
            let page = self.fetch_page(client, page_token.as_deref()).await?;
            if let Some(found) = page.albums.into_iter().find(|album| visit(album)) {
                return Ok(Some(found));
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    return Err(PhotoSwipeError::Upstream {
                        status: 502,
                        message: format!("album listing repeated page token {:?}", next),
                        body: String::new(),
                    });
                }
                Some(next) => page_token = Some(next),
                None => return Ok(None),
            }
        }
    }

    /// Find the first album whose title is exactly `title`.
    ///
    /// `Ok(None)` means every page was searched; a failed listing is an error.
    pub async fn find(
        &self,
        client: &AuthorizedClient,
        title: &str,
    ) -> Result<Option<AlbumReference>> {
        self.scan(client, |album| album.title == title).await
    }

    /// Every album the session can see, across all pages.
    pub async fn list_albums(&self, client: &AuthorizedClient) -> Result<Vec<AlbumReference>> {
        let mut albums = Vec::new();
        self.scan(client, |album| {
            albums.push(album.clone());
            false
        })
        .await?;
        Ok(albums)
    }

    /// Create an album titled `title`.
    pub async fn create(&self, client: &AuthorizedClient, title: &str) -> Result<AlbumReference> {
        let url = client.endpoints().create_album()?;
        let body = client.post(url, &json!({ "album": { "title": title } })).await?;
        let album: AlbumReference =
            serde_json::from_value(body).map_err(|e| PhotoSwipeError::Upstream {
                status: 502,
                message: format!("unexpected album creation response: {}", e),
                body: String::new(),
            })?;

        tracing::info!(
            "Created album {:?} ({}) for session {}",
            album.title,
            album.id,
            client.session()
        );
        Ok(album)
    }

    /// Return the album titled `title`, creating it if none exists.
    pub async fn resolve_or_create(
        &self,
        client: &AuthorizedClient,
        title: &str,
    ) -> Result<AlbumReference> {
        if title.trim().is_empty() {
            return Err(PhotoSwipeError::validation("album title must not be empty"));
        }

        let _guard = self
            .guards
            .lock(&(client.session().clone(), title.to_string()))
            .await;

        if let Some(album) = self.find(client, title).await? {
            tracing::debug!("Resolved album {:?} to {}", title, album.id);
            return Ok(album);
        }

        tracing::info!("No album titled {:?}, creating it", title);
        self.create(client, title).await
    }
}

impl Default for AlbumResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(AlbumResolver::with_page_size(0).page_size(), 1);
        assert_eq!(AlbumResolver::with_page_size(20).page_size(), 20);
        assert_eq!(AlbumResolver::with_page_size(500).page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_album_page_parsing() {
        let page: AlbumPage = serde_json::from_value(json!({
            "albums": [{ "id": "a1", "title": "Trips" }],
            "nextPageToken": "CkYKQ"
        }))
        .unwrap();
        assert_eq!(page.albums.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("CkYKQ"));

        let empty: AlbumPage = serde_json::from_value(json!({})).unwrap();
        assert!(empty.albums.is_empty());
        assert!(empty.next_page_token.is_none());
    }
}
