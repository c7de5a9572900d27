use crate::application_port::{RefreshToken, RefreshTokenGenerator};
use crate::domain_model::Guid;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};

pub const RANDOM_REFRESH_TOKEN_LEN: usize = 64;

/// 64 characters from the OS RNG over nanoid's url-safe alphabet.
#[derive(Debug, Default)]
pub struct RandomRefreshGenerator;

impl RefreshTokenGenerator for RandomRefreshGenerator {
    fn generate(&self, _guid: &Guid, _now: DateTime<Utc>) -> RefreshToken {
        RefreshToken(nanoid::nanoid!(RANDOM_REFRESH_TOKEN_LEN))
    }
}

/// base64(guid + time of day). Guessable by anyone who knows the guid and
/// roughly when it was issued; it is never trusted without the stored digest.
#[derive(Debug, Default)]
pub struct DerivedRefreshGenerator;

impl RefreshTokenGenerator for DerivedRefreshGenerator {
    fn generate(&self, guid: &Guid, now: DateTime<Utc>) -> RefreshToken {
        let stamp = now.format("%H:%M:%S%.6f").to_string();
        // keep 10µs resolution
        let stamp = &stamp[..stamp.len() - 1];
        RefreshToken(STANDARD.encode(format!("{}{}", guid, stamp)))
    }
}
