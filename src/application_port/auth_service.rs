use crate::domain_model::Guid;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("access token invalid")]
    InvalidCredential,
    #[error("access token has not expired yet")]
    NotYetEligibleForRefresh,
    #[error("no session for this identity")]
    UnknownSession,
    #[error("refresh token expired")]
    RefreshExpired,
    #[error("refresh token does not match the active session")]
    RefreshMismatch,
    #[error("hashing error: {0}")]
    Hashing(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// Outcome of checking an access token against a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTokenState {
    Valid { guid: Guid, expires_at: DateTime<Utc> },
    Expired { guid: Guid, expires_at: DateTime<Utc> },
    Malformed,
}

impl AccessTokenState {
    /// Only an expired, correctly signed token may be exchanged.
    pub fn into_refreshable(self) -> Result<Guid, AuthError> {
        match self {
            AccessTokenState::Expired { guid, .. } => Ok(guid),
            AccessTokenState::Valid { .. } => Err(AuthError::NotYetEligibleForRefresh),
            AccessTokenState::Malformed => Err(AuthError::InvalidCredential),
        }
    }
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        guid: &Guid,
        now: DateTime<Utc>,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;

    async fn inspect_access_token(&self, token: &AccessToken, now: DateTime<Utc>)
    -> AccessTokenState;

    async fn parse_expired_only(
        &self,
        token: &AccessToken,
        now: DateTime<Utc>,
    ) -> Result<Guid, AuthError> {
        self.inspect_access_token(token, now)
            .await
            .into_refreshable()
    }
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_secret(&self, secret: &str) -> Result<String, AuthError>;
    /// False on mismatch and on a digest that cannot be parsed.
    async fn verify_secret(&self, secret: &str, digest: &str) -> bool;
}

pub trait RefreshTokenGenerator: Send + Sync {
    fn generate(&self, guid: &Guid, now: DateTime<Utc>) -> RefreshToken;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn authenticate(&self, guid: &str) -> Result<AuthTokens, AuthError>;
    async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<AuthTokens, AuthError>;
}
