//! Tag index for WikiTrees.
//!
//! The index is a single CSV blob (`filename,tags`) stored in the page
//! container. Every lookup parses the whole document; every mutation is a
//! read → edit in memory → rewrite of the whole document. Rewrites are
//! conditional on the version that was read, so two concurrent mutations
//! cannot silently drop each other's change: the loser re-reads and retries.
//!
//! # Key Types
//!
//! - [`TagIndex`] -- Lookup and mutation against the stored document
//! - [`TagDocument`] -- The parsed document (ordered rows)
//! - [`TagRecord`] -- One `filename,tags` row
//! - [`TagCodec`] -- Parse/serialize seam, implemented by [`CsvTagCodec`]

pub mod codec;
pub mod document;
pub mod error;
pub mod index;

pub use codec::{CsvTagCodec, TagCodec, HEADER};
pub use document::{
    validate_filename, validate_tag, MatchMode, TagDocument, TagRecord, TagUpdate, TAG_SEPARATOR,
};
pub use error::{TagError, TagResult};
pub use index::{MissingDocument, TagIndex, TagIndexOptions, WriteDiscipline};
