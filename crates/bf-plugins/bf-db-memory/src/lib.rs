//! # bf-db-memory
//!
//! In-process implementation of `AccountRepo` on top of `DashMap`.
//! Nothing survives a restart; meant for development runs and tests.

use std::cmp::Ordering;

use async_trait::async_trait;
use bf_core::feed::compare_recency;
use bf_core::models::{Account, Post};
use bf_core::traits::AccountRepo;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// An account plus the log of posts it owns.
struct Record {
    account: Account,
    /// Oldest first under [`compare_recency`].
    posts: Vec<Post>,
}

#[derive(Default)]
pub struct MemoryAccountRepo {
    /// identity -> record
    accounts: DashMap<String, Record>,
    /// email -> identity
    emails: DashMap<String, String>,
}

impl MemoryAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `mutate` to one side of an edge under that account's shard lock.
    fn with_account<F>(&self, owner: &str, mutate: F) -> Option<bool>
    where
        F: FnOnce(&mut Account) -> bool,
    {
        self.accounts
            .get_mut(owner)
            .map(|mut record| mutate(&mut record.account))
    }
}

#[async_trait]
impl AccountRepo for MemoryAccountRepo {
    /// Claims the email first, then the identity; always in that order.
    async fn create_account(&self, account: Account) -> anyhow::Result<bool> {
        let email_slot = match self.emails.entry(account.email.clone()) {
            Entry::Occupied(_) => return Ok(false),
            Entry::Vacant(slot) => slot,
        };
        match self.accounts.entry(account.identity.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                email_slot.insert(account.identity.clone());
                slot.insert(Record {
                    account,
                    posts: Vec::new(),
                });
                Ok(true)
            }
        }
    }

    async fn get_account(&self, identity: &str) -> anyhow::Result<Option<Account>> {
        Ok(self.accounts.get(identity).map(|r| r.account.clone()))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let identity = match self.emails.get(email) {
            Some(identity) => identity.clone(),
            None => return Ok(None),
        };
        self.get_account(&identity).await
    }

    async fn search_identities(&self, prefix: &str, limit: usize) -> anyhow::Result<Vec<String>> {
        let mut matches: Vec<String> = self
            .accounts
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        matches.sort();
        matches.truncate(limit);
        Ok(matches)
    }

    async fn add_following(&self, owner: &str, target: &str) -> anyhow::Result<bool> {
        self.with_account(owner, |a| a.following.insert(target.to_string()))
            .ok_or_else(|| anyhow::anyhow!("account {owner} vanished"))
    }

    async fn add_follower(&self, owner: &str, follower: &str) -> anyhow::Result<bool> {
        self.with_account(owner, |a| a.followers.insert(follower.to_string()))
            .ok_or_else(|| anyhow::anyhow!("account {owner} vanished"))
    }

    async fn remove_following(&self, owner: &str, target: &str) -> anyhow::Result<bool> {
        Ok(self
            .with_account(owner, |a| a.following.remove(target))
            .unwrap_or(false))
    }

    async fn remove_follower(&self, owner: &str, follower: &str) -> anyhow::Result<bool> {
        Ok(self
            .with_account(owner, |a| a.followers.remove(follower))
            .unwrap_or(false))
    }

    async fn append_post(&self, post: Post) -> anyhow::Result<()> {
        match self.accounts.get_mut(&post.author) {
            Some(mut record) => {
                // Concurrent submissions may arrive slightly out of key order.
                let at = record
                    .posts
                    .partition_point(|p| compare_recency(p, &post) == Ordering::Less);
                record.posts.insert(at, post);
                Ok(())
            }
            None => anyhow::bail!("cannot append post for unknown author {}", post.author),
        }
    }

    async fn recent_posts(&self, author: &str, limit: usize) -> anyhow::Result<Vec<Post>> {
        Ok(self
            .accounts
            .get(author)
            .map(|record| record.posts.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn post_count(&self, author: &str) -> anyhow::Result<u64> {
        Ok(self
            .accounts
            .get(author)
            .map(|r| r.posts.len() as u64)
            .unwrap_or(0))
    }
}
