use wiki_crypto::ContentHasher;
use wiki_types::{BlobKey, ETag};

use crate::error::{StoreError, StoreResult};

/// A blob as returned by a read: its key, its bytes, and the version tag of
/// those bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub key: BlobKey,
    pub data: Vec<u8>,
    pub etag: ETag,
}

impl StoredBlob {
    /// Wrap bytes read from a backend, computing their tag.
    pub fn new(key: BlobKey, data: Vec<u8>) -> Self {
        let etag = ContentHasher::BLOB.etag(&data);
        Self { key, data, etag }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Decode the contents as UTF-8 text.
    pub fn into_text(self) -> StoreResult<String> {
        String::from_utf8(self.data).map_err(|_| StoreError::InvalidUtf8 { key: self.key })
    }
}

/// Precondition attached to a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteCondition {
    /// Unconditional overwrite (last writer wins).
    Any,
    /// Only create; fail if the key already holds a blob.
    Absent,
    /// Only replace the exact version previously read.
    Matches(ETag),
}

impl WriteCondition {
    /// Check the condition against the current version of `key`.
    pub fn check(&self, key: &BlobKey, current: Option<ETag>) -> StoreResult<()> {
        let ok = match (self, current) {
            (Self::Any, _) => true,
            (Self::Absent, None) => true,
            (Self::Absent, Some(_)) => false,
            (Self::Matches(expected), Some(found)) => *expected == found,
            (Self::Matches(_), None) => false,
        };
        if ok {
            Ok(())
        } else {
            Err(StoreError::PreconditionFailed {
                key: key.clone(),
                expected: self.describe(),
                found: current,
            })
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Any => "any version".to_string(),
            Self::Absent => "no blob".to_string(),
            Self::Matches(tag) => tag.short_hex(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> BlobKey {
        BlobKey::new("tags.csv").unwrap()
    }

    #[test]
    fn any_always_passes() {
        let tag = ContentHasher::BLOB.etag(b"x");
        assert!(WriteCondition::Any.check(&key(), None).is_ok());
        assert!(WriteCondition::Any.check(&key(), Some(tag)).is_ok());
    }

    #[test]
    fn absent_requires_no_blob() {
        let tag = ContentHasher::BLOB.etag(b"x");
        assert!(WriteCondition::Absent.check(&key(), None).is_ok());
        let err = WriteCondition::Absent.check(&key(), Some(tag)).unwrap_err();
        assert!(err.is_precondition_failed());
    }

    #[test]
    fn matches_requires_same_version() {
        let old = ContentHasher::BLOB.etag(b"old");
        let new = ContentHasher::BLOB.etag(b"new");
        assert!(WriteCondition::Matches(old).check(&key(), Some(old)).is_ok());
        assert!(WriteCondition::Matches(old).check(&key(), Some(new)).is_err());
        assert!(WriteCondition::Matches(old).check(&key(), None).is_err());
    }

    #[test]
    fn into_text_rejects_binary() {
        let blob = StoredBlob::new(key(), vec![0xff, 0xfe]);
        assert!(matches!(
            blob.into_text(),
            Err(StoreError::InvalidUtf8 { .. })
        ));
    }

    #[test]
    fn precondition_message_names_versions() {
        let err = WriteCondition::Absent
            .check(&key(), Some(ContentHasher::BLOB.etag(b"x")))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("tags.csv"));
        assert!(msg.contains("expected no blob"));
    }
}
