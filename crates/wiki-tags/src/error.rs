//! Error types for the tag index.

/// Errors that can occur during tag index operations.
#[derive(Debug, thiserror::Error)]
pub enum TagError {
    /// The document does not start with the `filename,tags` header.
    #[error("tag document has no `filename,tags` header (found {found:?})")]
    MissingHeader { found: String },

    /// A row could not be parsed.
    #[error("malformed tag document row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    /// Two rows share one filename.
    #[error("tag document has more than one row for {filename:?}")]
    DuplicateRow { filename: String },

    /// The tag document blob does not exist and the index is configured not
    /// to create it.
    #[error("tag document {0} does not exist")]
    DocumentMissing(String),

    /// A tag that cannot be stored in the comma-joined tags field.
    #[error("invalid tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: String },

    /// A filename that cannot be registered as a row.
    #[error("invalid filename {filename:?}: {reason}")]
    InvalidFilename { filename: String, reason: String },

    /// Every compare-and-swap attempt lost to a concurrent writer.
    #[error("tag document kept changing under {attempts} update attempts")]
    Contention { attempts: u32 },

    /// CSV encoding or decoding failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] wiki_store::StoreError),
}

/// Convenience alias for tag index results.
pub type TagResult<T> = Result<T, TagError>;
