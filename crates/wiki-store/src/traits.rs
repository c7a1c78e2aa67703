use wiki_types::{BlobKey, ETag};

use crate::blob::{StoredBlob, WriteCondition};
use crate::error::StoreResult;

/// One container of named blobs.
///
/// All implementations must satisfy these invariants:
/// - A missing blob is `Ok(None)` on read and `Ok(false)` on exists/delete.
/// - `write_if` checks its condition and writes as one atomic step with
///   respect to other writers using the same store handle.
/// - The returned [`ETag`] of a write equals the tag a later read of the same
///   bytes reports.
/// - Keys form a tree: no blob's key is a `/`-prefix of another's. A write
///   that would break this fails with
///   [`StoreError::KeyConflict`](crate::StoreError); reading such a key is
///   `Ok(None)`.
/// - All I/O errors are propagated, never silently ignored.
pub trait BlobStore: Send + Sync {
    /// Read a blob by key.
    ///
    /// Returns `Ok(None)` if the blob does not exist.
    fn read(&self, key: &BlobKey) -> StoreResult<Option<StoredBlob>>;

    /// Write a blob if `condition` holds for the current version.
    ///
    /// Fails with [`StoreError::PreconditionFailed`](crate::StoreError) when
    /// it does not.
    fn write_if(
        &self,
        key: &BlobKey,
        data: &[u8],
        condition: WriteCondition,
    ) -> StoreResult<ETag>;

    /// Check whether a blob exists.
    fn exists(&self, key: &BlobKey) -> StoreResult<bool>;

    /// All keys starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> StoreResult<Vec<BlobKey>>;

    /// Delete a blob. Returns `true` if it existed.
    fn delete(&self, key: &BlobKey) -> StoreResult<bool>;

    /// Unconditional write.
    fn write(&self, key: &BlobKey, data: &[u8]) -> StoreResult<ETag> {
        self.write_if(key, data, WriteCondition::Any)
    }

    /// Read a blob and decode it as UTF-8 text.
    fn read_text(&self, key: &BlobKey) -> StoreResult<Option<String>> {
        self.read(key)?.map(StoredBlob::into_text).transpose()
    }
}
