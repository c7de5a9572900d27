use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlSessionStore {
    pool: MySqlPool,
}

impl MySqlSessionStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlSessionStore { pool }
    }

    /// Creates the table on first start.
    pub async fn ensure_schema(&self) -> Result<(), AuthError> {
        sqlx::query(
            r#"
CREATE TABLE IF NOT EXISTS refresh_session (
    guid          VARCHAR(255) NOT NULL PRIMARY KEY,
    secret_digest VARCHAR(255) NOT NULL,
    expires_at    TIMESTAMP(6) NOT NULL
)
"#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    fn row_to_record(row: MySqlRow) -> Result<SessionRecord, AuthError> {
        let secret_digest: String = row
            .try_get("secret_digest")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(SessionRecord {
            secret_digest,
            expires_at,
        })
    }
}

#[async_trait::async_trait]
impl SessionStore for MySqlSessionStore {
    async fn upsert(&self, guid: &Guid, record: &SessionRecord) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO refresh_session (guid, secret_digest, expires_at)
VALUES (?, ?, ?)
ON DUPLICATE KEY UPDATE
    secret_digest = VALUES(secret_digest),
    expires_at = VALUES(expires_at)
"#,
        )
        .bind(guid.as_str())
        .bind(&record.secret_digest)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, guid: &Guid) -> Result<Option<SessionRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT secret_digest, expires_at
FROM refresh_session
WHERE guid = ?
"#,
        )
        .bind(guid.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn replace_if_current(
        &self,
        guid: &Guid,
        expected_digest: &str,
        record: &SessionRecord,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
UPDATE refresh_session
SET secret_digest = ?, expires_at = ?
WHERE guid = ? AND secret_digest = ?
"#,
        )
        .bind(&record.secret_digest)
        .bind(record.expires_at)
        .bind(guid.as_str())
        .bind(expected_digest)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}
