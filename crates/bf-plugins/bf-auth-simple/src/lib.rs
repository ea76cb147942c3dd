//! # bf-auth-simple
//!
//! Argon2 + HS256 JWT implementation of `AuthProvider`.
//! Handles password hashing at signup and bearer tokens after login.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm as HashAlgorithm, Argon2, Version,
};
use bf_core::traits::{AuthProvider, TokenError};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub use argon2::Params;

/// What's inside a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account identity.
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

pub struct SimpleAuthProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    /// Token lifetime in seconds
    ttl_secs: i64,
    argon2: Argon2<'static>,
}

impl SimpleAuthProvider {
    /// Accepts the HMAC secret (e.g., from configuration) and a token lifetime.
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl_secs,
            argon2: Argon2::default(),
        }
    }

    /// Overrides the Argon2id cost parameters.
    pub fn with_params(mut self, params: Params) -> Self {
        self.argon2 = Argon2::new(HashAlgorithm::Argon2id, Version::V0x13, params);
        self
    }

    fn encode(&self, claims: &Claims) -> anyhow::Result<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("jwt encode: {e}"))
    }
}

impl AuthProvider for SimpleAuthProvider {
    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("argon2 hash: {e}"))?;
        Ok(hash.to_string())
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_token(&self, identity: &str) -> anyhow::Result<String> {
        let now = chrono::Utc::now().timestamp();
        self.encode(&Claims {
            sub: identity.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        })
    }

    fn verify_token(&self, token: &str) -> Result<String, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                other => {
                    log::debug!("rejected token: {other:?}");
                    TokenError::Invalid
                }
            })
    }
}
