use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::collections::HashMap;

const DIGEST_FIELD: &str = "digest";
const EXPIRES_AT_FIELD: &str = "expires_at";

const REPLACE_IF_CURRENT_LUA: &str = r#"
if redis.call('HGET', KEYS[1], ARGV[1]) == ARGV[2] then
  redis.call('HSET', KEYS[1], ARGV[1], ARGV[3], ARGV[4], ARGV[5])
  return 1
end
return 0
"#;

/// One hash per identity. No TTL is set: an expired session must still be
/// readable so it can be told apart from an unknown one.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    prefix: String,
    replace_script: Script,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionStore {
            conn,
            prefix: prefix.into(),
            replace_script: Script::new(REPLACE_IF_CURRENT_LUA),
        }
    }

    fn key(&self, guid: &Guid) -> String {
        format!("{}:{}", self.prefix, guid)
    }

    fn store_err(e: redis::RedisError) -> AuthError {
        AuthError::Store(e.to_string())
    }

    fn record_from_fields(
        guid: &Guid,
        mut fields: HashMap<String, String>,
    ) -> Result<SessionRecord, AuthError> {
        let secret_digest = fields.remove(DIGEST_FIELD).ok_or_else(|| {
            AuthError::Store(format!("session {} has no {} field", guid, DIGEST_FIELD))
        })?;
        let expires_at_millis = fields
            .remove(EXPIRES_AT_FIELD)
            .and_then(|raw| raw.parse::<i64>().ok())
            .ok_or_else(|| {
                AuthError::Store(format!("session {} has a bad {} field", guid, EXPIRES_AT_FIELD))
            })?;
        let expires_at = DateTime::<Utc>::from_timestamp_millis(expires_at_millis).ok_or_else(
            || AuthError::Store(format!("session {} expiry out of range", guid)),
        )?;

        Ok(SessionRecord {
            secret_digest,
            expires_at,
        })
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn upsert(&self, guid: &Guid, record: &SessionRecord) -> Result<(), AuthError> {
        let key = self.key(guid);
        let mut conn = self.conn.clone();
        // A single HSET writes both fields, so readers never see half a record.
        let _: () = conn
            .hset_multiple(
                &key,
                &[
                    (DIGEST_FIELD, record.secret_digest.clone()),
                    (EXPIRES_AT_FIELD, record.expires_at.timestamp_millis().to_string()),
                ],
            )
            .await
            .map_err(Self::store_err)?;
        Ok(())
    }

    async fn get(&self, guid: &Guid) -> Result<Option<SessionRecord>, AuthError> {
        let key = self.key(guid);
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> =
            conn.hgetall(&key).await.map_err(Self::store_err)?;
        if fields.is_empty() {
            return Ok(None);
        }
        Self::record_from_fields(guid, fields).map(Some)
    }

    async fn replace_if_current(
        &self,
        guid: &Guid,
        expected_digest: &str,
        record: &SessionRecord,
    ) -> Result<bool, AuthError> {
        let key = self.key(guid);
        let mut conn = self.conn.clone();
        let swapped: i32 = self
            .replace_script
            .key(&key)
            .arg(DIGEST_FIELD)
            .arg(expected_digest)
            .arg(&record.secret_digest)
            .arg(EXPIRES_AT_FIELD)
            .arg(record.expires_at.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(Self::store_err)?;
        Ok(swapped == 1)
    }
}
