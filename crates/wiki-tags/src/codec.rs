//! Text encoding of the tag document.

use crate::document::{TagDocument, TagRecord};
use crate::error::{TagError, TagResult};

/// Header row every tag document starts with.
pub const HEADER: [&str; 2] = ["filename", "tags"];

/// Converts between the stored text and a [`TagDocument`].
pub trait TagCodec: Send + Sync {
    fn parse(&self, text: &str) -> TagResult<TagDocument>;
    fn serialize(&self, document: &TagDocument) -> TagResult<String>;
}

/// CSV codec: header `filename,tags`, `\n` line endings, fields quoted only
/// when needed (`"tag1, tag2"`).
#[derive(Clone, Copy, Debug, Default)]
pub struct CsvTagCodec;

impl CsvTagCodec {
    pub fn new() -> Self {
        Self
    }
}

fn row_error(err: &csv::Error) -> TagError {
    TagError::MalformedRow {
        line: err.position().map_or(0, |p| p.line()),
        reason: err.to_string(),
    }
}

impl TagCodec for CsvTagCodec {
    fn parse(&self, text: &str) -> TagResult<TagDocument> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers().map_err(|e| row_error(&e))?.clone();
        if headers.len() != HEADER.len() || headers.iter().zip(HEADER).any(|(a, b)| a != b) {
            return Err(TagError::MissingHeader {
                found: headers.iter().collect::<Vec<_>>().join(","),
            });
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| row_error(&e))?;
            let line = row.position().map_or(0, |p| p.line());
            let filename = &row[0];
            if filename.is_empty() {
                return Err(TagError::MalformedRow {
                    line,
                    reason: "empty filename".to_string(),
                });
            }
            records.push(TagRecord::with_tags(filename, &row[1]));
        }
        TagDocument::from_records(records)
    }

    fn serialize(&self, document: &TagDocument) -> TagResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(HEADER)?;
        for record in document.records() {
            writer.write_record([record.filename.as_str(), record.tags.as_str()])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| TagError::Csv(csv::Error::from(e.into_error())))?;
        // Every field came from a `&str`, so the output is UTF-8.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
