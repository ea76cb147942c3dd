//! # SocialService
//!
//! Orchestrates accounts, the follow graph, posting and feed assembly on top of
//! the core traits. Every caller-facing operation lives here so the HTTP layer
//! stays a thin translation.

use std::sync::Arc;

use email_address::EmailAddress;

use crate::clock::ClockScope;
use crate::error::{AppError, Result};
use crate::feed;
use crate::models::{
    Account, FollowRequest, LoginRequest, OrderingKey, Post, PostView, Profile, SignupRequest,
    TweetRequest, MAX_POST_CHARS, MAX_USERNAME_CHARS, MIN_PASSWORD_CHARS,
};
use crate::traits::{AccountRepo, AuthProvider, OrderingClock, TokenError};

/// Maximum number of identities returned by a prefix search.
pub const SEARCH_LIMIT: usize = 10;

/// Shared by all request workers; cloning only bumps reference counts.
#[derive(Clone)]
pub struct SocialService {
    repo: Arc<dyn AccountRepo>,
    clock: Arc<dyn OrderingClock>,
    auth: Arc<dyn AuthProvider>,
    scope: ClockScope,
}

impl SocialService {
    pub fn new(
        repo: Arc<dyn AccountRepo>,
        clock: Arc<dyn OrderingClock>,
        auth: Arc<dyn AuthProvider>,
        scope: ClockScope,
    ) -> Self {
        Self {
            repo,
            clock,
            auth,
            scope,
        }
    }

    pub fn scope(&self) -> ClockScope {
        self.scope
    }

    /// Registers a new account and returns its identity.
    pub async fn signup(&self, req: SignupRequest) -> Result<String> {
        let username = req.username.trim().to_string();
        let email = req.email.trim().to_string();
        validate_username(&username)?;
        if !EmailAddress::is_valid(&email) {
            return Err(AppError::ValidationError(format!("'{email}' is not a valid email")));
        }
        if req.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::ValidationError(format!(
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }

        self.tick().await?;

        let hash = self.auth.hash_password(&req.password)?;
        let account = Account::new(username.clone(), email, hash);
        if !self.repo.create_account(account).await? {
            return Err(AppError::Conflict(
                "username or email is already registered".to_string(),
            ));
        }

        log::info!("registered account {username}");
        Ok(username)
    }

    /// Verifies credentials and issues a bearer token.
    ///
    /// Unknown email and wrong password are reported identically.
    pub async fn login(&self, req: LoginRequest) -> Result<String> {
        self.tick().await?;

        let rejected = || AppError::Unauthorized("invalid email or password".to_string());
        let account = self
            .repo
            .find_by_email(req.email.trim())
            .await?
            .ok_or_else(rejected)?;
        if !self.auth.verify_password(&req.password, &account.credential_hash) {
            return Err(rejected());
        }

        let token = self.auth.issue_token(&account.identity)?;
        log::info!("issued token for {}", account.identity);
        Ok(token)
    }

    /// Resolves a bearer token to the identity it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<String> {
        self.auth.verify_token(token).map_err(|err| match err {
            TokenError::Invalid => AppError::Unauthorized("invalid token".to_string()),
            TokenError::Expired => AppError::Unauthorized("token has expired".to_string()),
        })
    }

    /// Appends a post to the author's log.
    pub async fn post(&self, author: &str, req: TweetRequest) -> Result<Post> {
        let content = req.content;
        if content.trim().is_empty() {
            return Err(AppError::ValidationError("tweet content is empty".to_string()));
        }
        if content.chars().count() > MAX_POST_CHARS {
            return Err(AppError::ValidationError(format!(
                "tweet exceeds {MAX_POST_CHARS} characters"
            )));
        }
        self.require_account(author).await?;

        let key = self.clock.next_key().await?;
        let post = Post::new(author.to_string(), content, key);
        self.repo.append_post(post.clone()).await?;

        log::info!("{author} posted {} at key {}", post.id, key.value());
        Ok(post)
    }

    /// Adds the `source -> target` edge on both endpoints.
    ///
    /// A second follow of the same target leaves state unchanged and yields `Conflict`.
    pub async fn follow(&self, source: &str, req: FollowRequest) -> Result<()> {
        let target = req.target.trim();
        if target == source {
            return Err(AppError::ValidationError("cannot follow yourself".to_string()));
        }
        self.require_account(source).await?;
        self.require_account(target).await?;

        self.tick().await?;

        if !self.repo.add_following(source, target).await? {
            return Err(AppError::Conflict(format!("already following {target}")));
        }
        // No compensation if this half fails: the edge stays one-sided.
        self.repo.add_follower(target, source).await?;

        log::info!("{source} followed {target}");
        Ok(())
    }

    /// Removes the `source -> target` edge from both endpoints.
    ///
    /// Each side is removed independently, so a half-edge is cleaned up even
    /// when the call reports `InvalidState`.
    pub async fn unfollow(&self, source: &str, req: FollowRequest) -> Result<()> {
        let target = req.target.trim();
        self.require_account(source).await?;
        self.require_account(target).await?;

        self.tick().await?;

        let was_following = self.repo.remove_following(source, target).await?;
        self.repo.remove_follower(target, source).await?;
        if !was_following {
            return Err(AppError::InvalidState(format!("not following {target}")));
        }

        log::info!("{source} unfollowed {target}");
        Ok(())
    }

    pub async fn profile(&self, identity: &str) -> Result<Profile> {
        let account = self.require_account(identity).await?;
        let post_count = self.repo.post_count(identity).await?;
        Ok(Profile {
            username: account.identity,
            email: account.email,
            followers: account.followers.into_iter().collect(),
            following: account.following.into_iter().collect(),
            post_count,
        })
    }

    /// Identities starting with `prefix`, sorted, at most [`SEARCH_LIMIT`].
    pub async fn search(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repo.search_identities(prefix, SEARCH_LIMIT).await?)
    }

    /// The `limit` most recent posts by the requester and everyone they follow.
    pub async fn feed(&self, requester: &str, limit: usize) -> Result<Vec<PostView>> {
        let account = self.require_account(requester).await?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let authors = account.visible_authors();
        let mut logs = Vec::with_capacity(authors.len());
        for author in &authors {
            logs.push(self.repo.recent_posts(author, limit).await?);
        }

        let page = feed::merge_streaming(logs, limit);
        log::debug!(
            "assembled feed for {requester}: {} posts from {} authors",
            page.len(),
            authors.len()
        );
        Ok(page.into_iter().map(PostView::from).collect())
    }

    async fn require_account(&self, identity: &str) -> Result<Account> {
        self.repo
            .get_account(identity)
            .await?
            .ok_or_else(|| AppError::account_not_found(identity))
    }

    /// Advances the clock when every mutation is coupled to it.
    async fn tick(&self) -> Result<Option<OrderingKey>> {
        match self.scope {
            ClockScope::AllMutations => Ok(Some(self.clock.next_key().await?)),
            ClockScope::Posts => Ok(None),
        }
    }
}

fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(AppError::ValidationError("username is empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(AppError::ValidationError(format!(
            "username exceeds {MAX_USERNAME_CHARS} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::ValidationError(
            "username must not contain whitespace".to_string(),
        ));
    }
    Ok(())
}
