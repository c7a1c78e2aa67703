//! Object storage adapter for WikiTrees.
//!
//! A container ("bucket") is a flat namespace of named blobs. Pages, images
//! and account records each live in their own container; the tag document
//! lives in the page container next to the pages.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- one file per blob under a root directory
//!
//! # Design Rules
//!
//! 1. Absence is `Ok(None)` / `Ok(false)`, never an error.
//! 2. Every read reports the blob's [`ETag`](wiki_types::ETag); every write
//!    may be made conditional on it with a [`WriteCondition`].
//! 3. A single blob write is atomic: readers see the old or the new bytes.
//! 4. The store never interprets blob contents.
//! 5. Keys form a tree: a blob never sits at a prefix of another blob's
//!    key, so `Oak` and `Oak/Live` cannot both exist.
//! 6. All I/O errors are propagated, never silently ignored.

pub mod blob;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use blob::{StoredBlob, WriteCondition};
pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;
