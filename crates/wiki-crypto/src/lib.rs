//! Hashing primitives for WikiTrees.
//!
//! Provides domain-separated BLAKE3 content hashing (used for blob
//! [`ETag`](wiki_types::ETag)s) and salted password digests for the account
//! store.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod error;
pub mod hasher;
pub mod password;

pub use error::CryptoError;
pub use hasher::ContentHasher;
pub use password::{PasswordDigest, PasswordHasher, Salt};
