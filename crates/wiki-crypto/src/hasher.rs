use wiki_types::ETag;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"wiki-blob-v1"`) that is prepended
/// to every hash computation, so hashes produced for different purposes can
/// never be confused with each other.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for blob contents; its output is the blob's [`ETag`].
    pub const BLOB: Self = Self {
        domain: "wiki-blob-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Version tag for `data`.
    pub fn etag(&self, data: &[u8]) -> ETag {
        ETag::from_hash(self.hash(data))
    }

    /// Verify that data produces the expected tag.
    pub fn verify(&self, data: &[u8], expected: &ETag) -> bool {
        self.etag(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
