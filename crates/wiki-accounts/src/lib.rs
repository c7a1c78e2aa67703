//! Account store for WikiTrees.
//!
//! Each account is one JSON blob at `users/<username>` in the account
//! container, holding the username, a random salt and the salted password
//! digest. Records are parsed against a fixed schema; anything else is
//! reported as corrupt.
//!
//! # Key Types
//!
//! - [`AccountStore`] -- Sign-up and sign-in
//! - [`AccountRecord`] -- The stored credential record

pub mod error;
pub mod record;
pub mod store;

pub use error::{AccountError, AccountResult};
pub use record::AccountRecord;
pub use store::AccountStore;
