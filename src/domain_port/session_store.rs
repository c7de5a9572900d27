use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Create the record for `guid`, or replace whatever is there.
    async fn upsert(&self, guid: &Guid, record: &SessionRecord) -> Result<(), AuthError>;

    /// `None` when the identity never authenticated.
    async fn get(&self, guid: &Guid) -> Result<Option<SessionRecord>, AuthError>;

    /// Replace the record only while its digest is still `expected_digest`.
    /// Returns false if another rotation got there first.
    async fn replace_if_current(
        &self,
        guid: &Guid,
        expected_digest: &str,
        record: &SessionRecord,
    ) -> Result<bool, AuthError>;
}
