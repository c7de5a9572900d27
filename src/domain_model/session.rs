use chrono::{DateTime, Utc};

/// Server-side state for the single active session of an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// One-way digest of the refresh secret handed out last.
    pub secret_digest: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
