use std::sync::Arc;

use tracing::{debug, info, warn};
use wiki_crypto::PasswordHasher;
use wiki_store::{BlobStore, WriteCondition};
use wiki_types::{BlobKey, Username};

use crate::error::AccountResult;
use crate::record::AccountRecord;

/// Key prefix of account records inside the account container.
pub const USERS_PREFIX: &str = "users";

/// Sign-up and sign-in over one account container.
pub struct AccountStore {
    store: Arc<dyn BlobStore>,
    hasher: PasswordHasher,
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore").finish_non_exhaustive()
    }
}

impl AccountStore {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            hasher: PasswordHasher::default(),
        }
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    fn key_for(username: &Username) -> AccountResult<BlobKey> {
        Ok(BlobKey::new(USERS_PREFIX)?.join(username.as_str())?)
    }

    /// Create an account. Returns `false` if `username` is taken.
    ///
    /// The record is written only if no record exists, so of two racing
    /// sign-ups for one name exactly one succeeds. A name outside the
    /// [`Username`] alphabet, such as an e-mail address, is
    /// [`AccountError::InvalidUsername`](crate::AccountError) rather than
    /// `false`: it could never be taken.
    pub fn sign_up(&self, username: &str, password: &str) -> AccountResult<bool> {
        let username = Username::new(username)?;
        let key = Self::key_for(&username)?;
        if self.store.exists(&key)? {
            debug!(%username, "sign-up for existing account");
            return Ok(false);
        }

        let record = AccountRecord::create(&username, password, &self.hasher).to_json()?;
        match self
            .store
            .write_if(&key, record.as_bytes(), WriteCondition::Absent)
        {
            Ok(_) => {
                info!(%username, "account created");
                Ok(true)
            }
            Err(e) if e.is_precondition_failed() => {
                debug!(%username, "lost sign-up race");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials. Unknown or invalid usernames are `false`.
    pub fn sign_in(&self, username: &str, password: &str) -> AccountResult<bool> {
        let Ok(username) = Username::new(username) else {
            return Ok(false);
        };
        let Some(blob) = self.store.read(&Self::key_for(&username)?)? else {
            debug!(%username, "sign-in for unknown account");
            return Ok(false);
        };
        let record = AccountRecord::parse(&blob.data, &username).inspect_err(|e| {
            warn!(%username, error = %e, "unreadable account record");
        })?;
        let ok = record.verify(password, &self.hasher)?;
        debug!(%username, ok, "sign-in");
        Ok(ok)
    }

    /// Whether an account exists for `username`.
    pub fn exists(&self, username: &str) -> AccountResult<bool> {
        let Ok(username) = Username::new(username) else {
            return Ok(false);
        };
        Ok(self.store.exists(&Self::key_for(&username)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use wiki_store::InMemoryBlobStore;

    use crate::error::AccountError;

    fn store() -> (Arc<InMemoryBlobStore>, AccountStore) {
        let blobs = Arc::new(InMemoryBlobStore::new());
        (blobs.clone(), AccountStore::new(blobs))
    }

    #[test]
    fn sign_up_then_sign_in() {
        let (_, accounts) = store();
        assert!(accounts.sign_up("u", "p").unwrap());
        assert!(!accounts.sign_up("u", "p2").unwrap());
        assert!(accounts.sign_in("u", "p").unwrap());
        assert!(!accounts.sign_in("u", "wrong").unwrap());
        // The rejected second sign-up did not change the password.
        assert!(!accounts.sign_in("u", "p2").unwrap());
    }

    #[test]
    fn unknown_user_cannot_sign_in() {
        let (_, accounts) = store();
        assert!(!accounts.sign_in("ghost", "p").unwrap());
        assert!(!accounts.sign_in("../ghost", "p").unwrap());
        assert!(!accounts.exists("ghost").unwrap());
    }

    #[test]
    fn record_is_stored_as_json_under_users() {
        let (blobs, accounts) = store();
        accounts.sign_up("amy", "acorn").unwrap();
        let text = blobs
            .read_text(&BlobKey::new("users/amy").unwrap())
            .unwrap()
            .unwrap();
        assert!(text.starts_with("{\"username\":\"amy\",\"salt\":\""));
        assert!(!text.contains("acorn"));
    }

    #[test]
    fn sign_up_rejects_names_outside_the_username_alphabet() {
        let (blobs, accounts) = store();
        // Only ASCII letters, digits, '_', '-' and '.': e-mail addresses and
        // path separators are errors, not "taken".
        for name in ["amy@example.org", "a/b", "amy smith", ""] {
            assert!(
                matches!(accounts.sign_up(name, "p"), Err(AccountError::InvalidUsername(_))),
                "{name:?} should be rejected"
            );
            assert!(!accounts.sign_in(name, "p").unwrap());
        }
        assert!(blobs.is_empty());
    }

    #[test]
    fn corrupt_record_is_reported() {
        let (blobs, accounts) = store();
        blobs
            .write(&BlobKey::new("users/amy").unwrap(), b"{'hash_pword': 'x'}")
            .unwrap();
        assert!(matches!(
            accounts.sign_in("amy", "p"),
            Err(AccountError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn racing_sign_ups_have_one_winner() {
        let blobs: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let accounts = AccountStore::new(Arc::clone(&blobs));
                thread::spawn(move || accounts.sign_up("popular", &format!("pw{i}")).unwrap())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
