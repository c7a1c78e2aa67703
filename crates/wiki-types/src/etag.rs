use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Version tag for a stored blob.
///
/// An `ETag` is a 32-byte content hash. Two reads that return the same
/// `ETag` saw the same bytes, which is all a conditional write needs to know.
/// The hash itself is computed by `wiki-crypto`; this type only carries it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ETag([u8; 32]);

impl ETag {
    /// Create an `ETag` from a pre-computed hash.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ETag({})", self.short_hex())
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for ETag {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let tag = ETag::from_hash([7u8; 32]);
        let parsed = ETag::from_hex(&tag.to_hex()).unwrap();
        assert_eq!(tag, parsed);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = ETag::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            ETag::from_hex("not hex at all"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn short_hex_is_8_chars() {
        let tag = ETag::from_hash([0xab; 32]);
        assert_eq!(tag.short_hex(), "abababab");
        assert_eq!(format!("{tag:?}"), "ETag(abababab)");
    }

    #[test]
    fn serde_roundtrip() {
        let tag = ETag::from_hash([3u8; 32]);
        let json = serde_json::to_string(&tag).unwrap();
        let parsed: ETag = serde_json::from_str(&json).unwrap();
        assert_eq!(tag, parsed);
    }
}
