//! Key binding persistence.
//!
//! This module provides disk-backed storage for users' key bindings using
//! JSON serialization. Every binding belongs to exactly one owner, and every
//! lookup, replacement and deletion is scoped to that owner.
//!
//! # Example
//!
//! ```rust,ignore
//! use photoswipe_core::binding_store::BindingStore;
//! use photoswipe_core::{Binding, BindingAction, OwnerId};
//!
//! let store = BindingStore::load_from_path("/var/lib/photoswipe/bindings.json".into())?;
//! let binding = Binding::new(OwnerId::new("1234"), "Delete", BindingAction::Trash);
//! store.put(binding)?;
//! ```

use crate::error::PhotoSwipeError;
use crate::model::{Binding, OwnerId};
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use uuid::Uuid;

/// Error type for binding store operations.
#[derive(Debug, Error)]
pub enum BindingStoreError {
    /// The binding does not exist or belongs to another owner.
    #[error("binding {id} not found or not owned by the caller")]
    NotFound { id: Uuid },

    /// The binding failed validation.
    #[error("{message}")]
    Invalid { message: String },

    /// I/O error reading or writing the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal lock poisoning error.
    #[error("internal lock error: {message}")]
    LockError { message: String },
}

impl From<BindingStoreError> for PhotoSwipeError {
    fn from(err: BindingStoreError) -> Self {
        match err {
            BindingStoreError::NotFound { .. } => PhotoSwipeError::not_found(err.to_string()),
            BindingStoreError::Invalid { message } => PhotoSwipeError::Validation { message },
            BindingStoreError::Json(e) => PhotoSwipeError::Store(StoreError::from(e)),
            other => PhotoSwipeError::Store(StoreError::BackendError {
                message: other.to_string(),
            }),
        }
    }
}

/// Internal storage format for bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BindingStoreData {
    /// Version of the store format (for future migrations).
    version: u32,

    /// All stored bindings, across owners.
    bindings: Vec<Binding>,
}

impl Default for BindingStoreData {
    fn default() -> Self {
        Self {
            version: 1,
            bindings: Vec::new(),
        }
    }
}

/// Disk-backed key binding store.
///
/// # Thread Safety
///
/// This implementation uses interior mutability via `RwLock` and is safe to
/// share across threads via `Arc`.
pub struct BindingStore {
    /// Path to the bindings JSON file.
    path: PathBuf,

    /// In-memory copy of the file.
    data: Arc<RwLock<BindingStoreData>>,
}

impl BindingStore {
    /// Load the binding store from a specific path.
    ///
    /// Creates parent directories if they don't exist; the file itself is
    /// written on the first mutation.
    pub fn load_from_path(path: PathBuf) -> Result<Self, BindingStoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BindingStoreData::default()
        };

        Ok(Self {
            path,
            data: Arc::new(RwLock::new(data)),
        })
    }

    /// Write `data` to disk.
    fn save(&self, data: &BindingStoreData) -> Result<(), BindingStoreError> {
        let contents = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, contents)?;

        Ok(())
    }

    /// Apply `change` to a copy of the document and keep it only once it is on disk.
    fn update<T>(
        &self,
        change: impl FnOnce(&mut BindingStoreData) -> Result<T, BindingStoreError>,
    ) -> Result<T, BindingStoreError> {
        let mut data = self.data.write().map_err(|e| BindingStoreError::LockError {
            message: format!("write lock poisoned: {}", e),
        })?;

        let mut next = data.clone();
        let result = change(&mut next)?;
        self.save(&next)?;
        *data = next;

        Ok(result)
    }

    /// All bindings of `owner`, oldest first.
    pub fn list(&self, owner: &OwnerId) -> Result<Vec<Binding>, BindingStoreError> {
        let data = self.data.read().map_err(|e| BindingStoreError::LockError {
            message: format!("read lock poisoned: {}", e),
        })?;

        let mut bindings: Vec<Binding> = data
            .bindings
            .iter()
            .filter(|b| &b.owner == owner)
            .cloned()
            .collect();
        bindings.sort_by_key(|b| b.created_at);
        Ok(bindings)
    }

    /// Get one of `owner`'s bindings.
    pub fn get(&self, owner: &OwnerId, id: Uuid) -> Result<Binding, BindingStoreError> {
        let data = self.data.read().map_err(|e| BindingStoreError::LockError {
            message: format!("read lock poisoned: {}", e),
        })?;

        data.bindings
            .iter()
            .find(|b| b.id == id && &b.owner == owner)
            .cloned()
            .ok_or(BindingStoreError::NotFound { id })
    }

    /// Insert a binding, or replace the owner's binding with the same id.
    ///
    /// A binding whose id belongs to another owner is reported as not found.
    pub fn put(&self, binding: Binding) -> Result<(), BindingStoreError> {
        binding
            .validate()
            .map_err(|e| BindingStoreError::Invalid {
                message: e.to_string(),
            })?;

        self.update(|data| {
            match data.bindings.iter_mut().find(|b| b.id == binding.id) {
                Some(existing) if existing.owner != binding.owner => {
                    return Err(BindingStoreError::NotFound { id: binding.id });
                }
                Some(existing) => *existing = binding,
                None => data.bindings.push(binding),
            }
            Ok(())
        })
    }

    /// Delete one of `owner`'s bindings.
    pub fn delete(&self, owner: &OwnerId, id: Uuid) -> Result<(), BindingStoreError> {
        self.update(|data| {
            let initial_len = data.bindings.len();
            data.bindings.retain(|b| b.id != id || &b.owner != owner);

            if data.bindings.len() == initial_len {
                return Err(BindingStoreError::NotFound { id });
            }
            Ok(())
        })
    }

    /// Delete every binding of `owner`. Returns how many were removed.
    pub fn delete_all(&self, owner: &OwnerId) -> Result<usize, BindingStoreError> {
        let present = self.list(owner)?.len();
        if present == 0 {
            return Ok(0);
        }

        self.update(|data| {
            let initial_len = data.bindings.len();
            data.bindings.retain(|b| &b.owner != owner);
            Ok(initial_len - data.bindings.len())
        })
    }

    /// Get the storage path for this store.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
