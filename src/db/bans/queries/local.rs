//! Local blacklist operations.
//!
//! Insert-or-ignore: the first recorded reason is kept.

use crate::db::DbError;
use crate::model::{BanEntry, ParticipantId};
use sqlx::SqlitePool;

/// Add a participant to the blacklist. Returns false if already present.
pub async fn add_local(
    pool: &SqlitePool,
    participant_id: ParticipantId,
    issued_by: ParticipantId,
    reason: &str,
) -> Result<bool, DbError> {
    let now = chrono::Utc::now().timestamp();

    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO local_bans (participant_id, reason, issued_by, issued_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(participant_id)
    .bind(reason)
    .bind(issued_by)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove a participant from the blacklist.
pub async fn remove_local(pool: &SqlitePool, participant_id: ParticipantId) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM local_bans WHERE participant_id = ?")
        .bind(participant_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Get the blacklist entry for a participant.
pub async fn get_local(
    pool: &SqlitePool,
    participant_id: ParticipantId,
) -> Result<Option<BanEntry>, DbError> {
    let row = sqlx::query_as::<_, (i64, String, i64, i64)>(
        r#"
        SELECT participant_id, reason, issued_by, issued_at
        FROM local_bans
        WHERE participant_id = ?
        "#,
    )
    .bind(participant_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(participant_id, reason, issued_by, issued_at)| BanEntry {
        participant_id,
        reason,
        issued_by,
        issued_at,
    }))
}
