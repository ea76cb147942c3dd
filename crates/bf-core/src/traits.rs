//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Account, OrderingKey, Post};

/// Persistence contract for accounts, follow sets, and post logs.
///
/// Set-mutation methods return `true` when the set actually changed, so the
/// service can tell a fresh edge from a duplicate without a second read.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AccountRepo: Send + Sync {
    // Account Operations
    /// Inserts the account. Returns `false` if the identity or email is taken.
    async fn create_account(&self, account: Account) -> anyhow::Result<bool>;
    async fn get_account(&self, identity: &str) -> anyhow::Result<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;
    /// Identities starting with `prefix`, sorted ascending.
    async fn search_identities(&self, prefix: &str, limit: usize) -> anyhow::Result<Vec<String>>;

    // Follow-set Operations (one side of an edge per call)
    async fn add_following(&self, owner: &str, target: &str) -> anyhow::Result<bool>;
    async fn add_follower(&self, owner: &str, follower: &str) -> anyhow::Result<bool>;
    async fn remove_following(&self, owner: &str, target: &str) -> anyhow::Result<bool>;
    async fn remove_follower(&self, owner: &str, follower: &str) -> anyhow::Result<bool>;

    // Post Operations
    async fn append_post(&self, post: Post) -> anyhow::Result<()>;
    /// Up to `limit` of the author's posts, newest first. Unknown authors yield nothing.
    async fn recent_posts(&self, author: &str, limit: usize) -> anyhow::Result<Vec<Post>>;
    async fn post_count(&self, author: &str) -> anyhow::Result<u64>;
}

/// Source of strictly increasing [`OrderingKey`]s.
///
/// Implementations must be linearizable: no two callers ever observe the same key.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OrderingClock: Send + Sync {
    async fn next_key(&self) -> anyhow::Result<OrderingKey>;
}

/// Why a bearer token was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is invalid")]
    Invalid,
    #[error("token has expired")]
    Expired,
}

/// Credential hashing and bearer-token contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Produces an opaque hash string for storage.
    fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Checks a password against a stored hash. Malformed hashes never verify.
    fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Issues a bearer token for the identity.
    fn issue_token(&self, identity: &str) -> anyhow::Result<String>;

    /// Resolves a bearer token back to the identity it was issued for.
    fn verify_token(&self, token: &str) -> Result<String, TokenError>;
}
