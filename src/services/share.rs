//! Share-link issuance and validation. Tokens are 32 random bytes rendered
//! URL-safe; collisions are retried a bounded number of times against the
//! unique token column.

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::warn;

use crate::db::ShareRepository;
use crate::entities::document_shares;

const TOKEN_BYTES: usize = 32;
const MINT_ATTEMPTS: usize = 5;

/// Why an otherwise-known share link cannot be used.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareAccessError {
    #[error("Share link has been revoked")]
    Revoked,
    #[error("Share link has expired")]
    Expired,
}

/// Issuance failure. A race that slips past the pre-check loop and hits the
/// unique token column is reported distinctly so the API can answer 409
/// instead of 500.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("Share token already exists")]
    TokenRace,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IssueError {
    /// Classifies a failed share insert: a unique-constraint violation is a
    /// token race, everything else passes through.
    #[must_use]
    pub fn from_insert(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DbErr>().and_then(DbErr::sql_err) {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::TokenRace,
            _ => Self::Other(err),
        }
    }
}

pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

pub struct ShareService<G = RandomTokenGenerator> {
    shares: ShareRepository,
    generator: G,
}

impl ShareService<RandomTokenGenerator> {
    #[must_use]
    pub const fn new(shares: ShareRepository) -> Self {
        Self {
            shares,
            generator: RandomTokenGenerator,
        }
    }
}

impl<G: TokenGenerator> ShareService<G> {
    /// Test seam for driving collision behavior.
    #[must_use]
    pub const fn with_generator(shares: ShareRepository, generator: G) -> Self {
        Self { shares, generator }
    }

    /// Issues a share link for `document_id`. `expires_at` may lie in the
    /// past; such links are minted but immediately report as expired.
    pub async fn issue(
        &self,
        document_id: i32,
        created_by_user_id: i32,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<document_shares::Model, IssueError> {
        let token = self.mint_token().await?;
        self.shares
            .create(document_id, &token, created_by_user_id, expires_at)
            .await
            .map_err(IssueError::from_insert)
    }

    async fn mint_token(&self) -> Result<String> {
        for attempt in 1..=MINT_ATTEMPTS {
            let token = self.generator.generate();
            if !self.shares.token_exists(&token).await? {
                return Ok(token);
            }
            warn!(attempt, "share token collision, retrying");
        }
        anyhow::bail!("Exhausted {MINT_ATTEMPTS} attempts to mint a unique share token")
    }

    /// Stamps `revoked_at` once; revoking an already-revoked share is a
    /// no-op and reports success.
    pub async fn revoke(&self, share: document_shares::Model) -> Result<document_shares::Model> {
        if share.revoked_at.is_some() {
            return Ok(share);
        }
        self.shares.revoke(share).await
    }
}

/// Checks whether a share link is usable at `now`. Revocation wins over
/// expiry when both apply.
pub fn validate_access(
    share: &document_shares::Model,
    now: DateTime<Utc>,
) -> Result<(), ShareAccessError> {
    if share.revoked_at.is_some() {
        return Err(ShareAccessError::Revoked);
    }
    if let Some(expires_at) = share.expires_at {
        if expires_at <= now {
            return Err(ShareAccessError::Expired);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(
        expires_at: Option<DateTime<Utc>>,
        revoked_at: Option<DateTime<Utc>>,
    ) -> document_shares::Model {
        document_shares::Model {
            id: 1,
            document_id: 1,
            token: "t".to_string(),
            created_by_user_id: Some(1),
            expires_at,
            revoked_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn random_tokens_are_url_safe_and_long() {
        let generator = RandomTokenGenerator;
        let token = generator.generate();
        // 32 bytes base64-encoded without padding
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(token, generator.generate());
    }

    #[test]
    fn unexpired_share_is_valid() {
        let later = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(validate_access(&share(Some(later), None), Utc::now()), Ok(()));
        assert_eq!(validate_access(&share(None, None), Utc::now()), Ok(()));
    }

    #[test]
    fn expired_share_is_gone() {
        let earlier = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(
            validate_access(&share(Some(earlier), None), Utc::now()),
            Err(ShareAccessError::Expired)
        );
    }

    #[test]
    fn revoked_wins_over_expired() {
        let earlier = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(
            validate_access(&share(Some(earlier), Some(earlier)), Utc::now()),
            Err(ShareAccessError::Revoked)
        );
    }
}
