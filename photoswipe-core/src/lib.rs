//! # PhotoSwipe Core
//!
//! Core library behind the PhotoSwipe one-click photo triage daemon.
//!
//! This crate provides:
//! - A credential lifecycle manager that refreshes OAuth access tokens once per session
//! - An authorized HTTP client for the photo library API
//! - Album resolution by title with create-if-missing, safe under concurrency
//! - Media moves and batch lookups
//! - Action dispatch for `trash` and `album` requests
//! - A disk-backed store for per-user key bindings
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use photoswipe_core::{
//!     ActionDispatcher, AlbumResolver, AuthorizedClient, CredentialStore, LibraryEndpoints,
//!     MemoryStore, OwnerId, ProviderConfig, RawActionRequest,
//! };
//!
//! let provider = ProviderConfig::google();
//! let credentials = Arc::new(CredentialStore::new(Arc::new(MemoryStore::new()), provider.clone()));
//! let bundle = provider.new_bundle("ya29...", "client-id", "client-secret")?.with_refresh_token("1//...");
//! let session = credentials.open(OwnerId::new("1234"), bundle).await?;
//!
//! let client = AuthorizedClient::new(credentials, session, reqwest::Client::new(), LibraryEndpoints::google_photos()?);
//! let dispatcher = ActionDispatcher::new(Arc::new(AlbumResolver::new()));
//! dispatcher
//!     .dispatch(&client, RawActionRequest { action: Some("trash".into()), media_id: Some("m1".into()), album_id: None })
//!     .await?;
//! ```

pub mod album;
pub mod binding_store;
pub mod client;
pub mod credential;
pub mod credential_store;
pub mod dispatch;
pub mod error;
pub mod locks;
pub mod media;
pub mod model;
pub mod provider;
pub mod store;

// Re-export commonly used types at crate root
pub use model::{
    Action,
    ActionOutcome,
    ActionRequest,
    AlbumReference,
    Binding,
    BindingAction,
    OwnerId,
    RawActionRequest,
    SessionId,
};

pub use store::{
    MemoryStore,
    Secret,
    SessionStore,
    StoreError,
};

pub use error::{
    AuthError,
    ErrorEnvelope,
    ErrorKind,
    PhotoSwipeError,
};

pub use credential::{
    CredentialBundle,
    CredentialState,
    SessionRecord,
};

pub use provider::{
    ProviderConfig,
    RefreshedToken,
};

pub use credential_store::CredentialStore;

pub use client::{
    AuthorizedClient,
    LibraryEndpoints,
};

pub use album::AlbumResolver;

pub use media::{
    MediaFetcher,
    MediaMover,
};

pub use dispatch::ActionDispatcher;

pub use binding_store::{
    BindingStore,
    BindingStoreError,
};
