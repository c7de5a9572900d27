use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

/// Process-local store. Sessions die with the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<Guid, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn upsert(&self, guid: &Guid, record: &SessionRecord) -> Result<(), AuthError> {
        self.sessions.insert(guid.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, guid: &Guid) -> Result<Option<SessionRecord>, AuthError> {
        Ok(self.sessions.get(guid).map(|entry| entry.value().clone()))
    }

    async fn replace_if_current(
        &self,
        guid: &Guid,
        expected_digest: &str,
        record: &SessionRecord,
    ) -> Result<bool, AuthError> {
        // get_mut holds the shard write lock for the compare and the write.
        match self.sessions.get_mut(guid) {
            Some(mut current) if current.secret_digest == expected_digest => {
                *current = record.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
