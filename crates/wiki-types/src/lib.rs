//! Foundation types for WikiTrees.
//!
//! Every other wiki crate depends on `wiki-types`. The types here are small,
//! validated newtypes; constructing one is the only place their rules are
//! checked.
//!
//! # Key Types
//!
//! - [`BlobKey`] -- Validated name of a blob inside a container
//! - [`Username`] -- Validated account name, usable as a key segment
//! - [`FileKind`] -- Page / image / data classification by file extension
//! - [`ETag`] -- Content hash identifying one version of a blob

pub mod error;
pub mod etag;
pub mod key;
pub mod kind;

pub use error::TypeError;
pub use etag::ETag;
pub use key::{BlobKey, Username};
pub use kind::FileKind;
