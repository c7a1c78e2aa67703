//! Salted password digests.
//!
//! A digest is `BLAKE3(domain ":" salt password)`. Comparison goes through
//! [`blake3::Hash`], whose equality is constant time.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{decode_fixed, CryptoError};

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Per-account random salt.
#[derive(Clone, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draw a fresh salt from the OS random source.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        decode_fixed::<SALT_LEN>(s).map(Self)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", self.to_hex())
    }
}

/// Output of [`PasswordHasher::hash`].
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(blake3::Hash);

impl PasswordDigest {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        decode_fixed::<32>(s).map(|bytes| Self(blake3::Hash::from(bytes)))
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

/// Salted, domain-separated password hasher.
pub struct PasswordHasher {
    domain: &'static str,
}

impl PasswordHasher {
    pub const DEFAULT: Self = Self {
        domain: "wiki-password-v1",
    };

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    pub fn hash(&self, password: &str, salt: &Salt) -> PasswordDigest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        PasswordDigest(hasher.finalize())
    }

    /// Recompute the digest for `password` and compare it to `expected`.
    pub fn verify(&self, password: &str, salt: &Salt, expected: &PasswordDigest) -> bool {
        self.hash(password, salt) == *expected
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_the_right_password() {
        let salt = Salt::generate();
        let digest = PasswordHasher::DEFAULT.hash("hunter2", &salt);
        assert!(PasswordHasher::DEFAULT.verify("hunter2", &salt, &digest));
        assert!(!PasswordHasher::DEFAULT.verify("hunter3", &salt, &digest));
    }

    #[test]
    fn salt_changes_the_digest() {
        let a = PasswordHasher::DEFAULT.hash("pw", &Salt::from_bytes([1; SALT_LEN]));
        let b = PasswordHasher::DEFAULT.hash("pw", &Salt::from_bytes([2; SALT_LEN]));
        assert_ne!(a, b);
    }

    #[test]
    fn generated_salts_differ() {
        assert_ne!(Salt::generate(), Salt::generate());
    }

    #[test]
    fn hex_roundtrips() {
        let salt = Salt::from_bytes([9; SALT_LEN]);
        assert_eq!(Salt::from_hex(&salt.to_hex()).unwrap(), salt);

        let digest = PasswordHasher::DEFAULT.hash("pw", &salt);
        assert_eq!(PasswordDigest::from_hex(&digest.to_hex()).unwrap(), digest);
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(
            Salt::from_hex("abcd"),
            Err(CryptoError::InvalidLength {
                expected: SALT_LEN,
                actual: 2
            })
        );
        assert!(matches!(
            PasswordDigest::from_hex("zz"),
            Err(CryptoError::InvalidHex(_))
        ));
    }

    #[test]
    fn debug_does_not_leak_digest() {
        let digest = PasswordHasher::DEFAULT.hash("pw", &Salt::from_bytes([0; SALT_LEN]));
        assert_eq!(format!("{digest:?}"), "PasswordDigest(..)");
    }
}
