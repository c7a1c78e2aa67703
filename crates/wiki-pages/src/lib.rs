//! Page and image repository for WikiTrees.
//!
//! Pages are UTF-8 HTML blobs in the page container, keyed by page name.
//! Images are opaque bytes in the image container. The tag document shares
//! the page container, so page listings filter out data and image files by
//! extension (see [`FileKind`](wiki_types::FileKind)).
//!
//! # Key Types
//!
//! - [`PageRepository`] -- Read, list and upload pages and images
//! - [`HtmlValidator`] -- Allow-list check for uploaded page HTML
//!
//! # Design Rules
//!
//! 1. A missing page or image is `None` / empty, never an error.
//! 2. Reserved keys (the tag document) cannot be overwritten by an upload.
//! 3. Page content is validated as UTF-8 before it is stored.

pub mod error;
pub mod html;
pub mod repository;

pub use error::{PageError, PageResult};
pub use html::HtmlValidator;
pub use repository::{Page, PageRepository, UploadReceipt};
