use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("page {name:?} contains HTML outside the allow-list")]
    InvalidHtml { name: String },

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("store error: {0}")]
    Store(#[from] wiki_store::StoreError),

    #[error("tag index error: {0}")]
    Tag(#[from] wiki_tags::TagError),

    #[error("page error: {0}")]
    Page(#[from] wiki_pages::PageError),

    #[error("account error: {0}")]
    Account(#[from] wiki_accounts::AccountError),
}

impl SdkError {
    /// Whether the failure lies with the storage backend, wherever in the
    /// stack it surfaced.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Store(e)
            | Self::Tag(wiki_tags::TagError::Store(e))
            | Self::Page(wiki_pages::PageError::Store(e))
            | Self::Account(wiki_accounts::AccountError::Store(e)) => e.is_unavailable(),
            _ => false,
        }
    }

    /// Whether a username was refused for its characters or length.
    pub fn is_invalid_username(&self) -> bool {
        matches!(
            self,
            Self::Account(wiki_accounts::AccountError::InvalidUsername(_))
        )
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
