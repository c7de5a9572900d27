use crate::application_port::{AccessToken, AccessTokenState, AuthError, TokenCodec};
use crate::domain_model::Guid;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone)]
pub struct JwtConfig {
    pub access_ttl: Duration,
    pub signing_key: Vec<u8>,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_ttl", &self.access_ttl)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    guid: String,
    exp: i64,
    iat: i64,
    jti: String,
}

pub struct JwtHs512Codec {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtHs512Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(&cfg.signing_key);
        let decoding_key = DecodingKey::from_secret(&cfg.signing_key);
        JwtHs512Codec {
            cfg,
            encoding_key,
            decoding_key,
        }
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    // Expiry is judged against the caller's clock, not the library's.
    fn validation() -> Validation {
        let mut v = Validation::new(Algorithm::HS512);
        v.validate_exp = false;
        v.leeway = 0;
        v
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs512Codec {
    async fn issue_access_token(
        &self,
        guid: &Guid,
        now: DateTime<Utc>,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        // `exp` only carries whole seconds.
        let exp_dt = now
            .checked_add_signed(self.cfg.access_ttl)
            .ok_or_else(|| {
                AuthError::InternalError(format!(
                    "access expiry out of range: {}",
                    self.cfg.access_ttl
                ))
            })?
            .trunc_subsecs(0);
        let claims = AccessClaims {
            guid: guid.0.clone(),
            exp: exp_dt.timestamp(),
            iat: now.timestamp(),
            jti: Self::gen_jti(),
        };
        let token = encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn inspect_access_token(
        &self,
        token: &AccessToken,
        now: DateTime<Utc>,
    ) -> AccessTokenState {
        let claims = match decode::<AccessClaims>(&token.0, &self.decoding_key, &Self::validation())
        {
            Ok(data) => data.claims,
            Err(e) => {
                debug!("access token rejected: {}", e);
                return AccessTokenState::Malformed;
            }
        };

        let Some(expires_at) = DateTime::<Utc>::from_timestamp(claims.exp, 0) else {
            debug!(exp = claims.exp, "access token exp out of range");
            return AccessTokenState::Malformed;
        };
        let guid = match claims.guid.parse::<Guid>() {
            Ok(guid) => guid,
            Err(_) => return AccessTokenState::Malformed,
        };

        if now > expires_at {
            AccessTokenState::Expired { guid, expires_at }
        } else {
            AccessTokenState::Valid { guid, expires_at }
        }
    }
}
