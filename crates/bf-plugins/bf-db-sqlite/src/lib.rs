//! # bf-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `bf-core` domain models, plus a persisted `OrderingClock`.
//!
//! Follow edges keep the document layout of the domain: one table per side,
//! so each half of an edge is written by its own statement.

use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use bf_core::models::{Account, OrderingKey, Post};
use bf_core::traits::{AccountRepo, OrderingClock};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

/// Name of the counter row backing [`SqliteClock`].
pub const ORDERING_COUNTER: &str = "ordering_key";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS accounts (
        identity        TEXT PRIMARY KEY,
        email           TEXT NOT NULL UNIQUE,
        credential_hash TEXT NOT NULL,
        created_at      TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS following (
        owner  TEXT NOT NULL,
        target TEXT NOT NULL,
        PRIMARY KEY (owner, target)
    )",
    "CREATE TABLE IF NOT EXISTS followers (
        owner    TEXT NOT NULL,
        follower TEXT NOT NULL,
        PRIMARY KEY (owner, follower)
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id           BLOB PRIMARY KEY,
        author       TEXT NOT NULL,
        ordering_key INTEGER NOT NULL,
        content      TEXT NOT NULL,
        created_at   TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS posts_author_key ON posts (author, ordering_key DESC)",
    "CREATE TABLE IF NOT EXISTS counters (
        name  TEXT PRIMARY KEY,
        value INTEGER NOT NULL
    )",
];

pub struct SqliteAccountRepo {
    pool: SqlitePool,
}

impl SqliteAccountRepo {
    /// Opens (creating if needed) the database at `url` and ensures the schema exists.
    ///
    /// In-memory URLs get a single connection that is never reaped, since the
    /// database lives and dies with it.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = pool_options(url).connect_with(options).await?;

        let repo = Self { pool };
        repo.bootstrap().await?;
        Ok(repo)
    }

    /// Shared with [`SqliteClock`] so both live in one database.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn bootstrap(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        sqlx::query("INSERT OR IGNORE INTO counters (name, value) VALUES (?, 0)")
            .bind(ORDERING_COUNTER)
            .execute(&self.pool)
            .await?;
        log::info!("sqlite schema ready");
        Ok(())
    }

    async fn load_set(&self, sql: &str, owner: &str) -> anyhow::Result<BTreeSet<String>> {
        let rows: Vec<String> = sqlx::query_scalar(sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn hydrate(&self, row: SqliteRow) -> anyhow::Result<Account> {
        let identity: String = row.try_get("identity")?;
        let following = self
            .load_set("SELECT target FROM following WHERE owner = ?", &identity)
            .await?;
        let followers = self
            .load_set("SELECT follower FROM followers WHERE owner = ?", &identity)
            .await?;
        Ok(Account {
            email: row.try_get("email")?,
            credential_hash: row.try_get("credential_hash")?,
            created_at: row.try_get("created_at")?,
            identity,
            followers,
            following,
        })
    }

    async fn execute_changed(&self, sql: &str, owner: &str, other: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(sql)
            .bind(owner)
            .bind(other)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

fn pool_options(url: &str) -> SqlitePoolOptions {
    if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    }
}

fn row_to_post(row: &SqliteRow) -> anyhow::Result<Post> {
    let key: i64 = row.try_get("ordering_key")?;
    Ok(Post {
        id: row.try_get("id")?,
        author: row.try_get("author")?,
        content: row.try_get("content")?,
        key: OrderingKey(u64::try_from(key)?),
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AccountRepo for SqliteAccountRepo {
    /// A clash on either unique column inserts nothing.
    async fn create_account(&self, account: Account) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO accounts (identity, email, credential_hash, created_at)
             VALUES (?, ?, ?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(&account.identity)
        .bind(&account.email)
        .bind(&account.credential_hash)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_account(&self, identity: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE identity = ?")
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// Case-sensitive; `LIKE` would fold ASCII case.
    async fn search_identities(&self, prefix: &str, limit: usize) -> anyhow::Result<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT identity FROM accounts WHERE substr(identity, 1, ?) = ?
             ORDER BY identity LIMIT ?",
        )
        .bind(prefix.chars().count() as i64)
        .bind(prefix)
        .bind(i64::try_from(limit)?)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn add_following(&self, owner: &str, target: &str) -> anyhow::Result<bool> {
        self.execute_changed(
            "INSERT OR IGNORE INTO following (owner, target) VALUES (?, ?)",
            owner,
            target,
        )
        .await
    }

    async fn add_follower(&self, owner: &str, follower: &str) -> anyhow::Result<bool> {
        self.execute_changed(
            "INSERT OR IGNORE INTO followers (owner, follower) VALUES (?, ?)",
            owner,
            follower,
        )
        .await
    }

    async fn remove_following(&self, owner: &str, target: &str) -> anyhow::Result<bool> {
        self.execute_changed(
            "DELETE FROM following WHERE owner = ? AND target = ?",
            owner,
            target,
        )
        .await
    }

    async fn remove_follower(&self, owner: &str, follower: &str) -> anyhow::Result<bool> {
        self.execute_changed(
            "DELETE FROM followers WHERE owner = ? AND follower = ?",
            owner,
            follower,
        )
        .await
    }

    async fn append_post(&self, post: Post) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, author, ordering_key, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(post.id)
        .bind(&post.author)
        .bind(i64::try_from(post.key.value())?)
        .bind(&post.content)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_posts(&self, author: &str, limit: usize) -> anyhow::Result<Vec<Post>> {
        sqlx::query(
            "SELECT * FROM posts WHERE author = ? ORDER BY ordering_key DESC, id DESC LIMIT ?",
        )
        .bind(author)
        .bind(i64::try_from(limit)?)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(row_to_post)
        .collect()
    }

    async fn post_count(&self, author: &str) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author = ?")
            .bind(author)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count)?)
    }
}

/// `OrderingClock` persisted in the `counters` table.
///
/// Each key is one `UPDATE … RETURNING`, which SQLite serializes with every
/// other writer, so keys stay unique across processes sharing the file.
pub struct SqliteClock {
    pool: SqlitePool,
    name: String,
}

impl SqliteClock {
    pub fn new(pool: SqlitePool) -> Self {
        Self::named(pool, ORDERING_COUNTER)
    }

    pub fn named(pool: SqlitePool, name: &str) -> Self {
        Self {
            pool,
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl OrderingClock for SqliteClock {
    async fn next_key(&self) -> anyhow::Result<OrderingKey> {
        let value: Option<i64> =
            sqlx::query_scalar("UPDATE counters SET value = value + 1 WHERE name = ? RETURNING value")
                .bind(&self.name)
                .fetch_optional(&self.pool)
                .await?;
        match value {
            Some(value) => Ok(OrderingKey(u64::try_from(value)?)),
            None => anyhow::bail!("ordering counter '{}' is missing", self.name),
        }
    }
}
