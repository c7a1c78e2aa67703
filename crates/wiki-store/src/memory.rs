use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use wiki_types::{BlobKey, ETag};

use crate::blob::{StoredBlob, WriteCondition};
use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. All blobs are held in memory behind a
/// `RwLock`; conditional writes check and insert under the write lock.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobKey, StoredBlob>>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    fn read_map(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<BlobKey, StoredBlob>>> {
        self.blobs
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write_map(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<BlobKey, StoredBlob>>> {
        self.blobs
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.read_map().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A stored key that `key` would nest under or cover.
fn conflicting_key(map: &HashMap<BlobKey, StoredBlob>, key: &BlobKey) -> Option<BlobKey> {
    if let Some(ancestor) = key.ancestors().find(|a| map.contains_key(a)) {
        return Some(ancestor);
    }
    let nested = format!("{key}/");
    map.keys()
        .filter(|k| k.as_str().starts_with(&nested))
        .min()
        .cloned()
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn read(&self, key: &BlobKey) -> StoreResult<Option<StoredBlob>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn write_if(
        &self,
        key: &BlobKey,
        data: &[u8],
        condition: WriteCondition,
    ) -> StoreResult<ETag> {
        let mut map = self.write_map()?;
        if let Some(existing) = conflicting_key(&map, key) {
            return Err(StoreError::KeyConflict {
                key: key.clone(),
                existing,
            });
        }
        condition.check(key, map.get(key).map(|b| b.etag))?;
        let blob = StoredBlob::new(key.clone(), data.to_vec());
        let etag = blob.etag;
        debug!(key = %key, etag = %etag.short_hex(), size = blob.size(), "blob written");
        map.insert(key.clone(), blob);
        Ok(etag)
    }

    fn exists(&self, key: &BlobKey) -> StoreResult<bool> {
        Ok(self.read_map()?.contains_key(key))
    }

    fn list(&self, prefix: &str) -> StoreResult<Vec<BlobKey>> {
        let map = self.read_map()?;
        let mut keys: Vec<BlobKey> = map
            .keys()
            .filter(|k| k.as_str().starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn delete(&self, key: &BlobKey) -> StoreResult<bool> {
        Ok(self.write_map()?.remove(key).is_some())
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
