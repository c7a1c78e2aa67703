//! High-level SDK for WikiTrees.
//!
//! [`Wiki`] is the entry point for anything serving the wiki: it is built
//! from an explicit [`WikiConfig`] and owns the page repository, tag index,
//! account store, search engine and HTML validator. There are no global
//! clients; construct one `Wiki` and share it.

pub mod config;
pub mod error;
pub mod search;
pub mod wiki;

pub use config::{ContainerConfig, StorageBackend, StorageConfig, TagConfig, WikiConfig};
pub use error::{SdkError, SdkResult};
pub use search::{SearchEngine, SearchOptions};
pub use wiki::Wiki;

// Re-export key types
pub use wiki_accounts::AccountRecord;
pub use wiki_pages::{Page, UploadReceipt};
pub use wiki_tags::{MatchMode, MissingDocument, TagIndexOptions, TagUpdate, WriteDiscipline};
pub use wiki_types::{BlobKey, ETag, FileKind};
