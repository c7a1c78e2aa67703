//! The [`TagIndex`]: lookups and read-modify-write updates against the
//! stored tag document.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wiki_store::{BlobStore, WriteCondition};
use wiki_types::BlobKey;

use crate::codec::{CsvTagCodec, TagCodec};
use crate::document::{validate_filename, validate_tag, MatchMode, TagDocument, TagUpdate};
use crate::error::{TagError, TagResult};

/// What to do when the tag document blob does not exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDocument {
    /// Read it as an empty document; the first mutation creates it.
    #[default]
    Initialize,
    /// Fail with [`TagError::DocumentMissing`].
    Error,
}

/// How a rewritten document is stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteDiscipline {
    /// Write only if the document is still the version that was read;
    /// otherwise re-read and redo the edit.
    #[default]
    CompareAndSwap,
    /// Overwrite unconditionally. A concurrent update made between the read
    /// and the write is lost.
    LastWriterWins,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagIndexOptions {
    pub match_mode: MatchMode,
    pub on_missing: MissingDocument,
    pub write_discipline: WriteDiscipline,
    /// Read-modify-write cycles tried before giving up with
    /// [`TagError::Contention`].
    pub max_attempts: u32,
}

impl Default for TagIndexOptions {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            on_missing: MissingDocument::default(),
            write_discipline: WriteDiscipline::default(),
            max_attempts: 16,
        }
    }
}

/// Tag index over one document blob.
pub struct TagIndex {
    store: Arc<dyn BlobStore>,
    document: BlobKey,
    codec: Arc<dyn TagCodec>,
    options: TagIndexOptions,
}

impl std::fmt::Debug for TagIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagIndex")
            .field("document", &self.document)
            .field("options", &self.options)
            .finish()
    }
}

impl TagIndex {
    /// Index stored at `document` in `store`, CSV-encoded, default options.
    pub fn new(store: Arc<dyn BlobStore>, document: BlobKey) -> Self {
        Self {
            store,
            document,
            codec: Arc::new(CsvTagCodec),
            options: TagIndexOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TagIndexOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn TagCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn document_key(&self) -> &BlobKey {
        &self.document
    }

    pub fn options(&self) -> &TagIndexOptions {
        &self.options
    }

    /// Read and parse the document, along with the write condition that
    /// guards a rewrite of exactly this version.
    fn fetch(&self) -> TagResult<(TagDocument, WriteCondition)> {
        match self.store.read(&self.document)? {
            Some(blob) => {
                let etag = blob.etag;
                let text = blob.into_text()?;
                let document = self.codec.parse(&text).inspect_err(|e| {
                    warn!(document = %self.document, error = %e, "tag document is corrupt");
                })?;
                Ok((document, WriteCondition::Matches(etag)))
            }
            None => match self.options.on_missing {
                MissingDocument::Initialize => Ok((TagDocument::new(), WriteCondition::Absent)),
                MissingDocument::Error => Err(TagError::DocumentMissing(self.document.to_string())),
            },
        }
    }

    /// The current document.
    pub fn load(&self) -> TagResult<TagDocument> {
        self.fetch().map(|(document, _)| document)
    }

    /// Create a header-only document if none exists. Returns `true` when it
    /// was created.
    pub fn initialize(&self) -> TagResult<bool> {
        let text = self.codec.serialize(&TagDocument::new())?;
        match self
            .store
            .write_if(&self.document, text.as_bytes(), WriteCondition::Absent)
        {
            Ok(_) => {
                info!(document = %self.document, "created empty tag document");
                Ok(true)
            }
            Err(e) if e.is_precondition_failed() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Filenames whose tags match `tag` under the configured [`MatchMode`],
    /// in row order.
    pub fn get_filenames_by_tag(&self, tag: &str) -> TagResult<Vec<String>> {
        let filenames = self
            .load()?
            .filenames_matching(tag, self.options.match_mode);
        debug!(tag, matches = filenames.len(), "tag lookup");
        Ok(filenames)
    }

    /// Tag set of one filename, `None` if it has no row.
    pub fn tags_for(&self, filename: &str) -> TagResult<Option<BTreeSet<String>>> {
        Ok(self.load()?.get(filename).map(|r| r.tag_set()))
    }

    /// `filename -> set of tags` for the whole document.
    pub fn tag_map(&self) -> TagResult<BTreeMap<String, BTreeSet<String>>> {
        Ok(self.load()?.tag_map())
    }

    /// Add `tag` to `filename`'s row and rewrite the document.
    ///
    /// An unknown filename is not an error: the document is written back
    /// unchanged and [`TagUpdate::UnknownFile`] is returned.
    pub fn add_tag_to_csv(&self, filename: &str, tag: &str) -> TagResult<TagUpdate> {
        validate_tag(tag)?;
        self.modify("add_tag", |document| (document.add_tag(filename, tag), true))
    }

    /// Register `filename` with itself as its only tag. Returns `false` and
    /// leaves the document alone if the row exists.
    pub fn add_file_to_csv(&self, filename: &str) -> TagResult<bool> {
        validate_filename(filename)?;
        self.modify("add_file", |document| {
            let created = document.add_file(filename);
            (created, created)
        })
    }

    /// Read-modify-write loop. `edit` returns its outcome and whether the
    /// document must be written back; it may run more than once.
    fn modify<R>(
        &self,
        op: &'static str,
        mut edit: impl FnMut(&mut TagDocument) -> (R, bool),
    ) -> TagResult<R> {
        let attempts = self.options.max_attempts.max(1);
        for attempt in 1..=attempts {
            let (mut document, observed) = self.fetch()?;
            let (outcome, dirty) = edit(&mut document);
            if !dirty {
                debug!(op, "tag document unchanged");
                return Ok(outcome);
            }

            let condition = match self.options.write_discipline {
                WriteDiscipline::CompareAndSwap => observed,
                WriteDiscipline::LastWriterWins => WriteCondition::Any,
            };
            let text = self.codec.serialize(&document)?;
            match self
                .store
                .write_if(&self.document, text.as_bytes(), condition)
            {
                Ok(etag) => {
                    debug!(
                        op,
                        attempt,
                        rows = document.len(),
                        etag = %etag.short_hex(),
                        "tag document rewritten"
                    );
                    return Ok(outcome);
                }
                Err(e) if e.is_precondition_failed() => {
                    warn!(op, attempt, "tag document changed concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(TagError::Contention { attempts })
    }
}
