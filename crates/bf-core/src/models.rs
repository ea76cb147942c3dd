//! # Domain Models
//!
//! These structs represent the core entities of birdfeed.
//! Posts use UUID v7 ids; their feed position comes from an [`OrderingKey`].

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum post length, counted in Unicode scalar values.
pub const MAX_POST_CHARS: usize = 280;
/// Maximum username length.
pub const MAX_USERNAME_CHARS: usize = 50;
/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Position of a post in the global feed order. Younger is larger.
///
/// Drawn from an [`OrderingClock`](crate::traits::OrderingClock); it is an
/// ordering oracle, not a timestamp, and is never serialized to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderingKey(pub u64);

impl OrderingKey {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The username; unique across the store
    pub identity: String,
    pub email: String,
    /// PHC string owned by the `AuthProvider`
    pub credential_hash: String,
    /// Back-references: accounts following this one
    pub followers: BTreeSet<String>,
    /// Accounts this one has chosen to follow
    pub following: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(identity: String, email: String, credential_hash: String) -> Self {
        Self {
            identity,
            email,
            credential_hash,
            followers: BTreeSet::new(),
            following: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Identities whose posts appear in this account's feed, self included.
    pub fn visible_authors(&self) -> BTreeSet<String> {
        let mut authors = self.following.clone();
        authors.insert(self.identity.clone());
        authors
    }
}

/// An immutable entry in an account's post log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    /// Owning account, denormalized for merging
    pub author: String,
    pub content: String,
    pub key: OrderingKey,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author: String, content: String, key: OrderingKey) -> Self {
        Self {
            id: Uuid::now_v7(),
            author,
            content,
            key,
            created_at: Utc::now(),
        }
    }
}

/// What a feed reader sees of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            username: post.author,
            content: post.content,
            created_at: post.created_at,
        }
    }
}

/// Public profile of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub email: String,
    pub followers: Vec<String>,
    pub following: Vec<String>,
    pub post_count: u64,
}

// ── Request payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetRequest {
    pub content: String,
}

/// Body of both `/follow` and `/unfollow`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRequest {
    pub target: String,
}

/// Bounds applied to the `limit` a feed reader asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl FeedLimits {
    /// Missing means the default; anything above the cap is clamped.
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub prefix: String,
}
