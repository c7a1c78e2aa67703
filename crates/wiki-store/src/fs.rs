//! Filesystem-backed blob store.
//!
//! Each blob is one file at `<root>/<key>`; `/` in a key becomes a directory
//! separator. Writes go to a temporary file in the target directory that is
//! then renamed over the destination, so readers never see a torn blob.
//! Temporary files are dot-prefixed, which no valid [`BlobKey`] can be, and
//! are skipped by [`BlobStore::list`].
//!
//! A file cannot also be a directory, so a key is refused with
//! [`StoreError::KeyConflict`] when a blob exists at one of its ancestors or
//! below it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;
use wiki_types::{BlobKey, ETag};

use crate::blob::{StoredBlob, WriteCondition};
use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// Blob store rooted at a directory.
///
/// Conditional writes are serialized through an in-process mutex. Two
/// processes sharing one root can still interleave between the check and
/// the rename.
pub struct FsBlobStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsBlobStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened filesystem blob store");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &BlobKey) -> PathBuf {
        key.as_str()
            .split('/')
            .fold(self.root.clone(), |path, component| path.join(component))
    }

    /// The nearest-to-root ancestor of `key` stored as a blob.
    fn blob_ancestor(&self, key: &BlobKey) -> Option<BlobKey> {
        key.ancestors().find(|a| self.path_for(a).is_file())
    }

    /// Whether a failed access to `key` just means there is no such blob: the
    /// path is a directory, or runs through a blob file.
    fn is_not_a_blob(&self, key: &BlobKey, path: &Path) -> bool {
        path.is_dir() || self.blob_ancestor(key).is_some()
    }

    /// A blob that writing `key` would nest under or cover.
    fn conflicting_key(&self, key: &BlobKey) -> StoreResult<Option<BlobKey>> {
        if let Some(ancestor) = self.blob_ancestor(key) {
            return Ok(Some(ancestor));
        }
        let path = self.path_for(key);
        if !path.is_dir() {
            return Ok(None);
        }
        if let Some(nested) = self.walk_keys(&path)?.into_iter().min() {
            return Ok(Some(nested));
        }
        // Only empty directories left behind by deleted blobs.
        fs::remove_dir_all(&path)?;
        Ok(None)
    }

    /// Keys of all blob files below `dir`.
    fn walk_keys(&self, dir: &Path) -> StoreResult<Vec<BlobKey>> {
        let mut keys = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1) {
            let entry = entry.map_err(|e| {
                StoreError::Io(
                    e.into_io_error()
                        .unwrap_or_else(|| io::Error::other("directory walk failed")),
                )
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(key) = self.key_for(entry.path())? {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn key_for(&self, path: &Path) -> StoreResult<Option<BlobKey>> {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return Ok(None);
        };
        let mut parts = Vec::new();
        for component in relative.components() {
            let Some(part) = component.as_os_str().to_str() else {
                return Ok(None);
            };
            if part.starts_with('.') {
                return Ok(None);
            }
            parts.push(part);
        }
        Ok(Some(BlobKey::new(parts.join("/"))?))
    }
}

impl BlobStore for FsBlobStore {
    fn read(&self, key: &BlobKey) -> StoreResult<Option<StoredBlob>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(data) => Ok(Some(StoredBlob::new(key.clone(), data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(_) if self.is_not_a_blob(key, &path) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_if(
        &self,
        key: &BlobKey,
        data: &[u8],
        condition: WriteCondition,
    ) -> StoreResult<ETag> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))?;

        if let Some(existing) = self.conflicting_key(key)? {
            return Err(StoreError::KeyConflict {
                key: key.clone(),
                existing,
            });
        }
        let path = self.path_for(key);
        if condition != WriteCondition::Any {
            let current = self.read(key)?.map(|b| b.etag);
            condition.check(key, current)?;
        }

        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        let blob = StoredBlob::new(key.clone(), data.to_vec());
        debug!(key = %key, etag = %blob.etag.short_hex(), size = data.len(), "blob written");
        Ok(blob.etag)
    }

    fn exists(&self, key: &BlobKey) -> StoreResult<bool> {
        Ok(self.path_for(key).is_file())
    }

    fn list(&self, prefix: &str) -> StoreResult<Vec<BlobKey>> {
        let mut keys = self.walk_keys(&self.root)?;
        keys.retain(|key| key.as_str().starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn delete(&self, key: &BlobKey) -> StoreResult<bool> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(_) if self.is_not_a_blob(key, &path) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for FsBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBlobStore")
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(name: &str) -> BlobKey {
        BlobKey::new(name).unwrap()
    }

    fn open() -> (TempDir, FsBlobStore) {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::open(dir.path().join("pages")).unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_root() {
        let (dir, store) = open();
        assert!(dir.path().join("pages").is_dir());
        assert_eq!(store.root(), dir.path().join("pages"));
    }

    #[test]
    fn write_then_read_reports_same_etag() {
        let (_dir, store) = open();
        let etag = store.write(&key("White Oak"), b"<p>white</p>").unwrap();
        let blob = store.read(&key("White Oak")).unwrap().unwrap();
        assert_eq!(blob.data, b"<p>white</p>");
        assert_eq!(blob.etag, etag);
    }

    #[test]
    fn missing_blob_is_none() {
        let (_dir, store) = open();
        assert!(store.read(&key("nope")).unwrap().is_none());
        assert!(!store.exists(&key("nope")).unwrap());
        assert!(!store.delete(&key("nope")).unwrap());
    }

    #[test]
    fn nested_keys_become_directories() {
        let (dir, store) = open();
        store.write(&key("users/amy"), b"{}").unwrap();
        assert!(dir.path().join("pages").join("users").join("amy").is_file());
        // The directory itself is not a blob.
        assert!(store.read(&key("users")).unwrap().is_none());
        assert!(!store.exists(&key("users")).unwrap());
    }

    #[test]
    fn list_walks_nested_keys_and_skips_temp_files() {
        let (dir, store) = open();
        store.write(&key("tags.csv"), b"filename,tags\n").unwrap();
        store.write(&key("users/zed"), b"z").unwrap();
        store.write(&key("users/amy"), b"a").unwrap();
        fs::write(dir.path().join("pages").join(".tmpXYZ"), b"junk").unwrap();

        let all: Vec<String> = store.list("").unwrap().into_iter().map(String::from).collect();
        assert_eq!(all, vec!["tags.csv", "users/amy", "users/zed"]);

        let users = store.list("users/").unwrap();
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn conditional_writes() {
        let (_dir, store) = open();
        let v1 = store
            .write_if(&key("doc"), b"v1", WriteCondition::Absent)
            .unwrap();
        assert!(store
            .write_if(&key("doc"), b"again", WriteCondition::Absent)
            .unwrap_err()
            .is_precondition_failed());

        store
            .write_if(&key("doc"), b"v2", WriteCondition::Matches(v1))
            .unwrap();
        assert!(store
            .write_if(&key("doc"), b"stale", WriteCondition::Matches(v1))
            .unwrap_err()
            .is_precondition_failed());
        assert_eq!(store.read_text(&key("doc")).unwrap().unwrap(), "v2");
    }

    #[test]
    fn blob_file_blocks_nested_keys() {
        let (dir, store) = open();
        store.write(&key("Oak"), b"<p>oak</p>").unwrap();

        let err = store.write(&key("Oak/Live"), b"<p>live</p>").unwrap_err();
        assert!(err.is_key_conflict(), "{err}");
        assert!(!err.is_unavailable());
        assert!(store.read(&key("Oak/Live")).unwrap().is_none());
        assert!(!store.delete(&key("Oak/Live")).unwrap());
        assert!(dir.path().join("pages").join("Oak").is_file());
    }

    #[test]
    fn emptied_directory_can_become_a_blob() {
        let (_dir, store) = open();
        store.write(&key("Oak/Live"), b"x").unwrap();
        assert!(store.write(&key("Oak"), b"y").unwrap_err().is_key_conflict());
        assert!(!store.delete(&key("Oak")).unwrap());

        store.delete(&key("Oak/Live")).unwrap();
        store.write(&key("Oak"), b"y").unwrap();
        assert_eq!(store.read_text(&key("Oak")).unwrap().unwrap(), "y");
    }

    #[test]
    fn delete_removes_file() {
        let (_dir, store) = open();
        store.write(&key("bye"), b"x").unwrap();
        assert!(store.delete(&key("bye")).unwrap());
        assert!(store.read(&key("bye")).unwrap().is_none());
    }

    #[test]
    fn reopen_sees_existing_blobs() {
        let dir = TempDir::new().unwrap();
        {
            let store = FsBlobStore::open(dir.path()).unwrap();
            store.write(&key("persisted"), b"still here").unwrap();
        }
        let store = FsBlobStore::open(dir.path()).unwrap();
        assert_eq!(
            store.read_text(&key("persisted")).unwrap().unwrap(),
            "still here"
        );
    }
}
