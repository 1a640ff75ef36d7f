//! Room repository: rooms the assistant is present in.

use super::DbError;
use crate::model::{Room, RoomId};
use sqlx::SqlitePool;

/// Repository for known rooms and their enforcement toggle.
pub struct RoomRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RoomRepository<'a> {
    /// Create a new room repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a room. Re-recording refreshes the title and keeps the
    /// first-seen time and enforcement flag.
    pub async fn record(&self, room: &Room) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO rooms (id, title, first_seen)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET title = excluded.title
            "#,
        )
        .bind(room.id)
        .bind(room.display_title())
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Forget a room. Returns true if it was known.
    pub async fn forget(&self, id: RoomId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Every known room id.
    pub async fn list_ids(&self) -> Result<Vec<RoomId>, DbError> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM rooms ORDER BY first_seen, id")
            .fetch_all(self.pool)
            .await?;

        Ok(ids)
    }

    /// Whether global bans are enforced in a room. Unknown rooms enforce.
    pub async fn is_enforced(&self, id: RoomId) -> Result<bool, DbError> {
        let flag: Option<bool> =
            sqlx::query_scalar("SELECT enforce_global_bans FROM rooms WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(flag.unwrap_or(true))
    }

    /// Set the enforcement flag, creating the room record if absent.
    pub async fn set_enforced(&self, id: RoomId, enforced: bool) -> Result<(), DbError> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO rooms (id, title, first_seen, enforce_global_bans)
            VALUES (?, NULL, ?, ?)
            ON CONFLICT(id) DO UPDATE SET enforce_global_bans = excluded.enforce_global_bans
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(enforced)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::model::Room;

    #[tokio::test]
    async fn unknown_room_reads_as_enforced() {
        let db = Database::new(":memory:").await.unwrap();
        assert!(db.rooms().is_enforced(-999).await.unwrap());
    }

    #[tokio::test]
    async fn set_enforced_creates_room_and_is_idempotent() {
        let db = Database::new(":memory:").await.unwrap();
        let rooms = db.rooms();

        rooms.set_enforced(-1, false).await.unwrap();
        rooms.set_enforced(-1, false).await.unwrap();
        assert!(!rooms.is_enforced(-1).await.unwrap());
        assert_eq!(rooms.list_ids().await.unwrap(), vec![-1]);

        rooms.set_enforced(-1, true).await.unwrap();
        assert!(rooms.is_enforced(-1).await.unwrap());
    }

    #[tokio::test]
    async fn re_recording_keeps_enforcement_flag() {
        let db = Database::new(":memory:").await.unwrap();
        let rooms = db.rooms();

        rooms.record(&Room::group(-2, "Cats")).await.unwrap();
        rooms.set_enforced(-2, false).await.unwrap();
        rooms.record(&Room::group(-2, "Cats (renamed)")).await.unwrap();

        assert!(!rooms.is_enforced(-2).await.unwrap());
    }

    #[tokio::test]
    async fn forget_removes_room() {
        let db = Database::new(":memory:").await.unwrap();
        let rooms = db.rooms();

        rooms.record(&Room::group(-3, "Dogs")).await.unwrap();
        assert!(rooms.forget(-3).await.unwrap());
        assert!(!rooms.forget(-3).await.unwrap());
        assert!(rooms.list_ids().await.unwrap().is_empty());
    }
}
