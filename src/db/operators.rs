//! Operator repository: delegated privilege grants.

use super::DbError;
use crate::model::{OperatorGrant, ParticipantId};
use sqlx::SqlitePool;

/// Repository for operator grants.
pub struct OperatorRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OperatorRepository<'a> {
    /// Create a new operator repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Grant operator status. Returns false if the grant already existed.
    pub async fn grant(
        &self,
        participant_id: ParticipantId,
        granted_by: ParticipantId,
    ) -> Result<bool, DbError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO operators (participant_id, granted_by, granted_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(participant_id)
        .bind(granted_by)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke operator status. Returns true if a grant was removed.
    pub async fn revoke(&self, participant_id: ParticipantId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM operators WHERE participant_id = ?")
            .bind(participant_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether a grant exists for the participant.
    pub async fn is_operator(&self, participant_id: ParticipantId) -> Result<bool, DbError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM operators WHERE participant_id = ?")
                .bind(participant_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(found.is_some())
    }

    /// All grants, newest first.
    pub async fn list(&self) -> Result<Vec<OperatorGrant>, DbError> {
        let rows = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT participant_id, granted_by, granted_at
            FROM operators
            ORDER BY granted_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(participant_id, granted_by, granted_at)| OperatorGrant {
                participant_id,
                granted_by,
                granted_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn grant_is_idempotent() {
        let db = Database::new(":memory:").await.unwrap();
        let ops = db.operators();

        assert!(ops.grant(10, 1).await.unwrap());
        assert!(!ops.grant(10, 99).await.unwrap());

        let grants = ops.list().await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].granted_by, 1);
    }

    #[tokio::test]
    async fn revoke_reports_removal() {
        let db = Database::new(":memory:").await.unwrap();
        let ops = db.operators();

        ops.grant(10, 1).await.unwrap();
        assert!(ops.is_operator(10).await.unwrap());
        assert!(ops.revoke(10).await.unwrap());
        assert!(!ops.is_operator(10).await.unwrap());
        assert!(!ops.revoke(10).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let db = Database::new(":memory:").await.unwrap();
        let ops = db.operators();

        ops.grant(10, 1).await.unwrap();
        ops.grant(20, 1).await.unwrap();
        ops.grant(30, 1).await.unwrap();

        let ids: Vec<i64> = ops
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.participant_id)
            .collect();
        assert_eq!(ids, vec![30, 20, 10]);
    }
}
