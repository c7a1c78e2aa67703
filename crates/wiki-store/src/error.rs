use wiki_types::{BlobKey, ETag, TypeError};

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A conditional write found a different version than the caller expected.
    #[error("precondition failed for {key}: expected {expected}, found {}", found_label(.found))]
    PreconditionFailed {
        key: BlobKey,
        expected: String,
        found: Option<ETag>,
    },

    /// The key would nest a blob under another blob, or cover existing
    /// blobs nested under it.
    #[error("key {key} conflicts with existing blob {existing}")]
    KeyConflict { key: BlobKey, existing: BlobKey },

    /// A blob read as text was not valid UTF-8.
    #[error("blob {key} is not valid UTF-8")]
    InvalidUtf8 { key: BlobKey },

    /// A key produced by the backend could not be represented as a [`BlobKey`].
    #[error("invalid key: {0}")]
    InvalidKey(#[from] TypeError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend cannot serve requests (poisoned lock, lost connection).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

fn found_label(found: &Option<ETag>) -> String {
    match found {
        Some(tag) => tag.short_hex(),
        None => "no blob".to_string(),
    }
}

impl StoreError {
    /// Whether the failure lies with the backend rather than the request.
    ///
    /// A serving layer maps these to a 5xx-equivalent response.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }

    pub fn is_key_conflict(&self) -> bool {
        matches!(self, Self::KeyConflict { .. })
    }

    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Self::PreconditionFailed { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
