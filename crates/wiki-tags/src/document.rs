//! In-memory form of the tag document.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{TagError, TagResult};

/// Separator between tags inside the `tags` field.
pub const TAG_SEPARATOR: &str = ", ";

/// How a lookup tag is compared against a row's `tags` field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The tag occurs anywhere in the raw field: `"oak"` matches
    /// `"oakland"`, and the empty tag matches every row.
    #[default]
    Substring,
    /// The tag equals one of the comma-separated tokens, ignoring
    /// surrounding whitespace.
    Token,
}

/// One `filename,tags` row.
///
/// `tags` is kept exactly as stored so rows that are not edited are written
/// back byte for byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub filename: String,
    pub tags: String,
}

impl TagRecord {
    /// A fresh row, tagged with its own filename.
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            tags: filename.clone(),
            filename,
        }
    }

    pub fn with_tags(filename: impl Into<String>, tags: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            tags: tags.into(),
        }
    }

    /// The tags in stored order. An empty field has no tags.
    pub fn tag_list(&self) -> Vec<&str> {
        if self.tags.is_empty() {
            Vec::new()
        } else {
            self.tags.split(TAG_SEPARATOR).collect()
        }
    }

    pub fn tag_set(&self) -> BTreeSet<String> {
        self.tag_list().into_iter().map(str::to_string).collect()
    }

    pub fn matches(&self, tag: &str, mode: MatchMode) -> bool {
        match mode {
            MatchMode::Substring => self.tags.contains(tag),
            MatchMode::Token => self.tags.split(',').any(|t| t.trim() == tag),
        }
    }
}

/// Outcome of adding a tag to a filename.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagUpdate {
    Added,
    AlreadyPresent,
    /// No row for the filename; the document is unchanged.
    UnknownFile,
}

/// Reject tags that would not survive a write/read cycle of the tags field.
pub fn validate_tag(tag: &str) -> TagResult<()> {
    let invalid = |reason: &str| TagError::InvalidTag {
        tag: tag.to_string(),
        reason: reason.to_string(),
    };
    if tag.trim().is_empty() {
        return Err(invalid("tag must not be empty"));
    }
    if tag.contains(',') {
        return Err(invalid("tag must not contain ','"));
    }
    if tag.contains(['\n', '\r']) {
        return Err(invalid("tag must not contain line breaks"));
    }
    Ok(())
}

/// Reject filenames that cannot be a row key.
pub fn validate_filename(filename: &str) -> TagResult<()> {
    let invalid = |reason: &str| TagError::InvalidFilename {
        filename: filename.to_string(),
        reason: reason.to_string(),
    };
    if filename.is_empty() {
        return Err(invalid("filename must not be empty"));
    }
    if filename.contains(['\n', '\r']) {
        return Err(invalid("filename must not contain line breaks"));
    }
    Ok(())
}

/// The whole tag document: rows in stored order, at most one per filename.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagDocument {
    records: Vec<TagRecord>,
}

impl TagDocument {
    /// An empty document (header only when serialized).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document, rejecting duplicate filenames.
    pub fn from_records(records: Vec<TagRecord>) -> TagResult<Self> {
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.filename.as_str()) {
                return Err(TagError::DuplicateRow {
                    filename: record.filename.clone(),
                });
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[TagRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&TagRecord> {
        self.records.iter().find(|r| r.filename == filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.get(filename).is_some()
    }

    /// Filenames whose tags match `tag`, in row order.
    pub fn filenames_matching(&self, tag: &str, mode: MatchMode) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.matches(tag, mode))
            .map(|r| r.filename.clone())
            .collect()
    }

    /// Add `tag` to the row for `filename`.
    ///
    /// Existing tags are split on [`TAG_SEPARATOR`], the new tag appended,
    /// duplicates dropped keeping the first occurrence, and the result
    /// re-joined. A row with an empty tags field gets `tag` alone.
    pub fn add_tag(&mut self, filename: &str, tag: &str) -> TagUpdate {
        let Some(record) = self.records.iter_mut().find(|r| r.filename == filename) else {
            return TagUpdate::UnknownFile;
        };
        if record.tags.is_empty() {
            record.tags = tag.to_string();
            return TagUpdate::Added;
        }

        let (joined, already_present) = {
            let mut tags = record.tag_list();
            let already_present = tags.contains(&tag);
            tags.push(tag);
            let mut seen = HashSet::new();
            tags.retain(|t| seen.insert(*t));
            (tags.join(TAG_SEPARATOR), already_present)
        };
        record.tags = joined;

        if already_present {
            TagUpdate::AlreadyPresent
        } else {
            TagUpdate::Added
        }
    }

    /// Append a row for `filename` tagged with itself. Returns `false` when
    /// the row already exists.
    pub fn add_file(&mut self, filename: &str) -> bool {
        if self.contains(filename) {
            return false;
        }
        self.records.push(TagRecord::new(filename));
        true
    }

    /// `filename -> set of tags`, ignoring stored order.
    pub fn tag_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.records
            .iter()
            .map(|r| (r.filename.clone(), r.tag_set()))
            .collect()
    }
}
