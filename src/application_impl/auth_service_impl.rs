use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Issues credential pairs and rotates them, one active session per guid.
pub struct RealAuthService {
    token_codec: Arc<dyn TokenCodec>,
    refresh_generator: Arc<dyn RefreshTokenGenerator>,
    credential_hasher: Arc<dyn CredentialHasher>,
    session_store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    refresh_ttl: Duration,
}

impl RealAuthService {
    pub fn new(
        token_codec: Arc<dyn TokenCodec>,
        refresh_generator: Arc<dyn RefreshTokenGenerator>,
        credential_hasher: Arc<dyn CredentialHasher>,
        session_store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            token_codec,
            refresh_generator,
            credential_hasher,
            session_store,
            clock,
            refresh_ttl,
        }
    }

    fn require_non_empty(field: &str, value: &str) -> Result<(), AuthError> {
        if value.trim().is_empty() {
            return Err(AuthError::Validation(format!("{} must not be empty", field)));
        }
        Ok(())
    }

    /// Builds a new pair and the record that makes it the active one.
    /// Nothing is persisted here.
    async fn mint(
        &self,
        guid: &Guid,
        now: DateTime<Utc>,
    ) -> Result<(AuthTokens, SessionRecord), AuthError> {
        let refresh_exp = now.checked_add_signed(self.refresh_ttl).ok_or_else(|| {
            AuthError::InternalError(format!("refresh expiry out of range: {}", self.refresh_ttl))
        })?;
        let (access_token, access_exp) = self.token_codec.issue_access_token(guid, now).await?;
        let refresh_token = self.refresh_generator.generate(guid, now);
        let secret_digest = self
            .credential_hasher
            .hash_secret(&refresh_token.0)
            .await?;

        let tokens = AuthTokens {
            access_token,
            refresh_token,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        };
        let record = SessionRecord {
            secret_digest,
            expires_at: refresh_exp,
        };
        Ok((tokens, record))
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn authenticate(&self, guid: &str) -> Result<AuthTokens, AuthError> {
        let guid = guid
            .parse::<Guid>()
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        let now = self.clock.now();

        let (tokens, record) = self.mint(&guid, now).await?;
        self.session_store.upsert(&guid, &record).await?;

        info!(%guid, expires_at = %record.expires_at, "session issued");
        Ok(tokens)
    }

    async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<AuthTokens, AuthError> {
        Self::require_non_empty("access_token", access_token)?;
        Self::require_non_empty("refresh_token", refresh_token)?;
        let now = self.clock.now();

        // Token checks first: a bad token learns nothing about stored sessions.
        let guid = self
            .token_codec
            .parse_expired_only(&AccessToken(access_token.to_string()), now)
            .await?;

        let current = self
            .session_store
            .get(&guid)
            .await?
            .ok_or(AuthError::UnknownSession)?;

        if current.is_expired_at(now) {
            info!(%guid, expired_at = %current.expires_at, "refresh session expired");
            return Err(AuthError::RefreshExpired);
        }

        if !self
            .credential_hasher
            .verify_secret(refresh_token, &current.secret_digest)
            .await
        {
            warn!(%guid, "refresh token mismatch");
            return Err(AuthError::RefreshMismatch);
        }

        let (tokens, record) = self.mint(&guid, now).await?;
        let swapped = self
            .session_store
            .replace_if_current(&guid, &current.secret_digest, &record)
            .await?;
        if !swapped {
            warn!(%guid, "refresh lost a concurrent rotation");
            return Err(AuthError::RefreshMismatch);
        }

        info!(%guid, expires_at = %record.expires_at, "session rotated");
        Ok(tokens)
    }
}
