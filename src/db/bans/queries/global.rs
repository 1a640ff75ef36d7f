//! Global ban operations.
//!
//! Insert-or-replace: re-issuing a ban overwrites reason and issuer.

use crate::db::DbError;
use crate::model::{BanEntry, ParticipantId};
use sqlx::SqlitePool;

/// Add or re-issue a global ban.
pub async fn add_global(
    pool: &SqlitePool,
    participant_id: ParticipantId,
    issued_by: ParticipantId,
    reason: &str,
) -> Result<(), DbError> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT OR REPLACE INTO global_bans (participant_id, reason, issued_by, issued_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(participant_id)
    .bind(reason)
    .bind(issued_by)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a global ban.
pub async fn remove_global(pool: &SqlitePool, participant_id: ParticipantId) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM global_bans WHERE participant_id = ?")
        .bind(participant_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Get the global ban entry for a participant.
pub async fn get_global(
    pool: &SqlitePool,
    participant_id: ParticipantId,
) -> Result<Option<BanEntry>, DbError> {
    let row = sqlx::query_as::<_, (i64, String, i64, i64)>(
        r#"
        SELECT participant_id, reason, issued_by, issued_at
        FROM global_bans
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
