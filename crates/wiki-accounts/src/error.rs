//! Error types for the account store.

/// Errors from account operations.
///
/// An existing username on sign-up and a wrong password on sign-in are not
/// errors; those calls return `false`.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// The username cannot be used as an account key.
    #[error(transparent)]
    InvalidUsername(#[from] wiki_types::TypeError),

    /// A stored record does not match the account schema.
    #[error("corrupt account record for {username:?}: {reason}")]
    CorruptRecord { username: String, reason: String },

    /// A record could not be encoded.
    #[error("account record encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] wiki_store::StoreError),
}

/// Convenience alias for account store results.
pub type AccountResult<T> = Result<T, AccountError>;
