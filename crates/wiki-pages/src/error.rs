//! Error types for the page repository.

/// Errors from page and image operations.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// The name cannot be used as a blob key.
    #[error("invalid page name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// Page uploads must be UTF-8 text.
    #[error("upload {name:?} is not UTF-8 text")]
    NotText { name: String },

    /// The name belongs to a blob the repository manages itself.
    #[error("{name:?} is reserved and cannot be uploaded over")]
    Reserved { name: String },

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] wiki_store::StoreError),
}

/// Convenience alias for page repository results.
pub type PageResult<T> = Result<T, PageError>;
