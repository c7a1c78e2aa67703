//! The [`PageRepository`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use wiki_store::BlobStore;
use wiki_types::{BlobKey, ETag, FileKind, TypeError};

use crate::error::{PageError, PageResult};

/// A page read from the page container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Page {
    pub name: String,
    pub content: String,
    pub etag: ETag,
}

impl Page {
    /// Content length in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// What an upload did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub key: BlobKey,
    /// Kind of the uploaded file; decides the container it went to.
    pub kind: FileKind,
    /// Whether a blob with the same name was replaced.
    pub replaced: bool,
    pub size: u64,
    pub etag: ETag,
}

/// Pages and images, each in their own container.
pub struct PageRepository {
    pages: Arc<dyn BlobStore>,
    images: Arc<dyn BlobStore>,
    reserved: Vec<BlobKey>,
}

impl std::fmt::Debug for PageRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRepository")
            .field("reserved", &self.reserved)
            .finish()
    }
}

fn invalid_name(name: &str, err: TypeError) -> PageError {
    PageError::InvalidName {
        name: name.to_string(),
        reason: err.to_string(),
    }
}

impl PageRepository {
    pub fn new(pages: Arc<dyn BlobStore>, images: Arc<dyn BlobStore>) -> Self {
        Self {
            pages,
            images,
            reserved: Vec::new(),
        }
    }

    /// Protect `key` in the page container from uploads.
    pub fn with_reserved(mut self, key: BlobKey) -> Self {
        if !self.reserved.contains(&key) {
            self.reserved.push(key);
        }
        self
    }

    pub fn is_reserved(&self, key: &BlobKey) -> bool {
        self.reserved.contains(key)
    }

    /// Read the page called `name`.
    ///
    /// Returns `Ok(None)` if it does not exist. A name that is not a valid
    /// key cannot exist either, so it is `None` as well.
    pub fn get_page(&self, name: &str) -> PageResult<Option<Page>> {
        let Ok(key) = BlobKey::new(name) else {
            debug!(name, "page lookup with invalid name");
            return Ok(None);
        };
        let Some(blob) = self.pages.read(&key)? else {
            debug!(name, "page not found");
            return Ok(None);
        };
        let etag = blob.etag;
        let page = Page {
            name: name.to_string(),
            content: blob.into_text()?,
            etag,
        };
        debug!(name, size = page.size(), "page read");
        Ok(Some(page))
    }

    /// Names of all pages, sorted. Reserved keys and image or data files
    /// stored in the page container are left out.
    pub fn list_page_names(&self) -> PageResult<Vec<String>> {
        let names: Vec<String> = self
            .pages
            .list("")?
            .into_iter()
            .filter(|key| !self.is_reserved(key))
            .filter(|key| FileKind::from_filename(key.as_str()).is_page())
            .map(String::from)
            .collect();
        debug!(count = names.len(), "listed pages");
        Ok(names)
    }

    /// Store `content` under `name`.
    ///
    /// The container is chosen by `original_filename`'s extension: images
    /// go to the image container, everything else to the page container,
    /// where it must be UTF-8. An existing blob with the same name is
    /// replaced in one atomic write.
    pub fn upload(
        &self,
        content: &[u8],
        name: &str,
        original_filename: &str,
    ) -> PageResult<UploadReceipt> {
        let key = BlobKey::new(name).map_err(|e| invalid_name(name, e))?;
        let kind = FileKind::from_filename(original_filename);

        let store = match kind {
            FileKind::Image => &self.images,
            FileKind::Page | FileKind::Data => {
                if self.is_reserved(&key) {
                    return Err(PageError::Reserved {
                        name: name.to_string(),
                    });
                }
                if std::str::from_utf8(content).is_err() {
                    return Err(PageError::NotText {
                        name: name.to_string(),
                    });
                }
                &self.pages
            }
        };

        let replaced = store.exists(&key)?;
        let etag = store.write(&key, content)?;
        info!(
            name,
            kind = %kind,
            replaced,
            size = content.len(),
            "uploaded"
        );
        Ok(UploadReceipt {
            key,
            kind,
            replaced,
            size: content.len() as u64,
            etag,
        })
    }

    /// Bytes of the image called `name`; empty if it does not exist.
    pub fn get_image(&self, name: &str) -> PageResult<Vec<u8>> {
        let Ok(key) = BlobKey::new(name) else {
            return Ok(Vec::new());
        };
        match self.images.read(&key)? {
            Some(blob) => Ok(blob.data),
            None => {
                debug!(name, "image not found");
                Ok(Vec::new())
            }
        }
    }
}
