//! Offline snapshot persistence

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{Address, Cart, Favorite, Order};

use crate::{ClientError, ClientResult};

const SNAPSHOT_FILE: &str = "snapshot.json";

/// Locally persisted store state
///
/// The server-owned sections hold the collections last fetched while
/// authenticated. The guest section holds the purely local cart and
/// favorites used before login; it survives logins and session expiry
/// unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub cart: Option<Cart>,
    #[serde(default)]
    pub favorites: Vec<Favorite>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub guest: GuestSection,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Local-only data for unauthenticated use
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestSection {
    #[serde(default)]
    pub cart: Option<Cart>,
    #[serde(default)]
    pub favorites: Vec<Favorite>,
}

/// Reads and writes the snapshot file under a cache directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(SNAPSHOT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last snapshot
    ///
    /// A missing or unreadable file yields an empty snapshot; hydration
    /// never fails on cache problems.
    pub fn load(&self) -> Snapshot {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Snapshot::default(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Discarding corrupt snapshot"
                );
                Snapshot::default()
            }
        }
    }

    /// Persist a snapshot, creating the cache directory if needed
    pub fn save(&self, snapshot: &Snapshot) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Cache(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        fs::write(&self.path, bytes)
            .map_err(|e| ClientError::Cache(format!("Failed to write {}: {}", self.path.display(), e)))
    }

    /// Delete the snapshot file if present
    pub fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Cache(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::CartItem;
    use tempfile::TempDir;

    fn sample_cart() -> Cart {
        Cart {
            id: Some("cart:c1".to_string()),
            user: "user:u1".to_string(),
            items: vec![CartItem {
                product_id: "product:p1".to_string(),
                name: "Conch Shell".to_string(),
                image: String::new(),
                price: 500.0,
                quantity: 2,
            }],
            updated_at: None,
        }
    }

    #[test]
    fn test_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());

        let snapshot = Snapshot {
            cart: Some(sample_cart()),
            saved_at: Some(Utc::now()),
            ..Default::default()
        };
        store.save(&snapshot).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.cart.unwrap().items[0].quantity, 2);
        assert!(loaded.saved_at.is_some());
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());

        let loaded = store.load();
        assert!(loaded.cart.is_none());
        assert!(loaded.favorites.is_empty());
        assert!(loaded.guest.cart.is_none());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        std::fs::write(store.path(), b"{not json at all").unwrap();

        let loaded = store.load();
        assert!(loaded.cart.is_none());
        assert!(loaded.orders.is_empty());
    }

    #[test]
    fn test_guest_section_survives_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());

        let snapshot = Snapshot {
            guest: GuestSection {
                cart: Some(sample_cart()),
                favorites: Vec::new(),
            },
            ..Default::default()
        };
        store.save(&snapshot).unwrap();

        let loaded = store.load();
        assert!(loaded.cart.is_none());
        assert_eq!(loaded.guest.cart.unwrap().items.len(), 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());

        store.save(&Snapshot::default()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
    }
}
