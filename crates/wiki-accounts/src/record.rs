use serde::{Deserialize, Serialize};
use wiki_crypto::{PasswordDigest, PasswordHasher, Salt};
use wiki_types::Username;

use crate::error::{AccountError, AccountResult};

/// Stored credentials for one account.
///
/// Serialized as `{"username": .., "salt": <hex>, "password_hash": <hex>}`.
/// Unknown fields are rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountRecord {
    pub username: String,
    pub salt: String,
    pub password_hash: String,
}

impl AccountRecord {
    /// A new record for `username` with a fresh salt.
    pub fn create(username: &Username, password: &str, hasher: &PasswordHasher) -> Self {
        let salt = Salt::generate();
        let digest = hasher.hash(password, &salt);
        Self {
            username: username.to_string(),
            salt: salt.to_hex(),
            password_hash: digest.to_hex(),
        }
    }

    /// Parse a stored record and check it belongs to `expected`.
    pub fn parse(bytes: &[u8], expected: &Username) -> AccountResult<Self> {
        let record: Self = serde_json::from_slice(bytes).map_err(|e| corrupt(expected, e))?;
        if record.username != expected.as_str() {
            return Err(corrupt(
                expected,
                format!("record belongs to {:?}", record.username),
            ));
        }
        Ok(record)
    }

    pub fn to_json(&self) -> AccountResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check `password` against the stored digest.
    pub fn verify(&self, password: &str, hasher: &PasswordHasher) -> AccountResult<bool> {
        let salt = Salt::from_hex(&self.salt).map_err(|e| corrupt_named(&self.username, e))?;
        let digest =
            PasswordDigest::from_hex(&self.password_hash).map_err(|e| corrupt_named(&self.username, e))?;
        Ok(hasher.verify(password, &salt, &digest))
    }
}

fn corrupt(username: &Username, reason: impl ToString) -> AccountError {
    corrupt_named(username.as_str(), reason)
}

fn corrupt_named(username: &str, reason: impl ToString) -> AccountError {
    AccountError::CorruptRecord {
        username: username.to_string(),
        reason: reason.to_string(),
    }
}
