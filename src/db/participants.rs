//! Participant repository: every participant the assistant has observed.

use super::DbError;
use crate::model::{Participant, ParticipantId};
use sqlx::SqlitePool;

type ParticipantRow = (
    i64,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
    bool,
);

fn from_row(row: ParticipantRow) -> Participant {
    let (id, handle, first_name, last_name, locale, is_automated) = row;
    Participant {
        id,
        handle,
        first_name,
        last_name,
        locale,
        is_automated,
    }
}

/// Repository for participant observations.
pub struct ParticipantRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ParticipantRepository<'a> {
    /// Create a new participant repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or merge a participant on identity.
    ///
    /// Mutable fields are overwritten unconditionally; `last_seen` only moves
    /// forward. A handle now held by this participant is released from any
    /// other row first, keeping handles unique.
    pub async fn upsert(&self, participant: &Participant) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        if let Some(handle) = &participant.handle {
            sqlx::query("UPDATE participants SET handle = NULL WHERE handle = ? AND id != ?")
                .bind(handle)
                .bind(participant.id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO participants (id, handle, first_name, last_name, locale, is_automated, last_seen)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                handle = excluded.handle,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                locale = excluded.locale,
                is_automated = excluded.is_automated,
                last_seen = MAX(participants.last_seen, excluded.last_seen)
            "#,
        )
        .bind(participant.id)
        .bind(&participant.handle)
        .bind(&participant.first_name)
        .bind(&participant.last_name)
        .bind(&participant.locale)
        .bind(participant.is_automated)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Find a participant by handle, case-insensitively. A leading `@` is ignored.
    pub async fn find_by_handle(&self, handle: &str) -> Result<Option<Participant>, DbError> {
        let handle = handle.trim_start_matches('@');
        if handle.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT id, handle, first_name, last_name, locale, is_automated
            FROM participants
            WHERE handle = ?
            "#,
        )
        .bind(handle)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    /// Find a participant by identity.
    pub async fn find(&self, id: ParticipantId) -> Result<Option<Participant>, DbError> {
        let row = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT id, handle, first_name, last_name, locale, is_automated
            FROM participants
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    /// Last time the participant was observed (unix seconds).
    pub async fn last_seen(&self, id: ParticipantId) -> Result<Option<i64>, DbError> {
        let last_seen: Option<i64> =
            sqlx::query_scalar("SELECT last_seen FROM participants WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(last_seen)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::model::Participant;

    #[tokio::test]
    async fn upsert_overwrites_mutable_fields() {
        let db = Database::new(":memory:").await.unwrap();
        let repo = db.participants();

        repo.upsert(&Participant::new(1, "Alice").with_handle("alice"))
            .await
            .unwrap();

        let mut renamed = Participant::new(1, "Alicia").with_handle("alicia");
        renamed.locale = Some("pl".to_string());
        repo.upsert(&renamed).await.unwrap();

        let stored = repo.find(1).await.unwrap().unwrap();
        assert_eq!(stored, renamed);
        assert!(repo.find_by_handle("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_handle_is_case_insensitive() {
        let db = Database::new(":memory:").await.unwrap();
        let repo = db.participants();
        repo.upsert(&Participant::new(5, "Bob").with_handle("BobTheCat"))
            .await
            .unwrap();

        let found = repo.find_by_handle("@bobthecat").await.unwrap().unwrap();
        assert_eq!(found.id, 5);
        assert!(repo.find_by_handle("@").await.unwrap().is_none());
        assert!(repo.find_by_handle("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn handle_moves_to_newest_holder() {
        let db = Database::new(":memory:").await.unwrap();
        let repo = db.participants();
        repo.upsert(&Participant::new(1, "Old").with_handle("shared"))
            .await
            .unwrap();
        repo.upsert(&Participant::new(2, "New").with_handle("SHARED"))
            .await
            .unwrap();

        assert_eq!(repo.find_by_handle("shared").await.unwrap().unwrap().id, 2);
        assert_eq!(repo.find(1).await.unwrap().unwrap().handle, None);
    }

    #[tokio::test]
    async fn last_seen_never_moves_backwards() {
        let db = Database::new(":memory:").await.unwrap();
        let repo = db.participants();
        repo.upsert(&Participant::new(3, "Carol")).await.unwrap();
        let first = repo.last_seen(3).await.unwrap().unwrap();

        // Simulate a clock skew: force a future timestamp, then observe again.
        sqlx::query("UPDATE participants SET last_seen = ? WHERE id = 3")
            .bind(first + 1_000)
            .execute(db.pool())
            .await
            .unwrap();
        repo.upsert(&Participant::new(3, "Carol")).await.unwrap();

        assert_eq!(repo.last_seen(3).await.unwrap(), Some(first + 1_000));
    }
}
