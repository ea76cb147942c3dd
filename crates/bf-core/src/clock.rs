//! # Ordering Clock
//!
//! In-process [`OrderingClock`] and the policy deciding which operations advance it.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::OrderingKey;
use crate::traits::OrderingClock;

/// Process-local clock backed by a single atomic counter.
#[derive(Debug, Default)]
pub struct AtomicClock {
    last: AtomicU64,
}

impl AtomicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently issued key, or zero if none was issued.
    pub fn current(&self) -> OrderingKey {
        OrderingKey(self.last.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl OrderingClock for AtomicClock {
    async fn next_key(&self) -> anyhow::Result<OrderingKey> {
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_add(1))
            .map_err(|_| anyhow::anyhow!("ordering clock exhausted"))?;
        Ok(OrderingKey(previous + 1))
    }
}

/// Which operations draw a key from the clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockScope {
    /// Only post submission advances the clock.
    #[default]
    Posts,
    /// Signup, login, post, follow and unfollow each advance it once.
    AllMutations,
}

impl fmt::Display for ClockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockScope::Posts => f.write_str("posts"),
            ClockScope::AllMutations => f.write_str("all_mutations"),
        }
    }
}

impl FromStr for ClockScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(ClockScope::Posts),
            "all_mutations" => Ok(ClockScope::AllMutations),
            other => Err(format!("unknown clock scope '{other}'")),
        }
    }
}
