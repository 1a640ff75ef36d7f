//! Storage abstraction consumed by the engine.
//!
//! The engine only talks to these traits. [`Database`] is the SQLite
//! implementation; it owns its connection pool, so callers never open or
//! close handles themselves.

use crate::db::{DEFAULT_REASON, Database, DbError};
use crate::model::{
    OperatorGrant, Participant, ParticipantId, Room, RoomId, StoreStats,
};
use async_trait::async_trait;

/// Durable record of observed participants and rooms.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert or merge a participant on identity.
    async fn upsert_participant(&self, participant: &Participant) -> Result<(), DbError>;

    /// Case-insensitive exact handle match.
    async fn find_by_handle(&self, handle: &str) -> Result<Option<Participant>, DbError>;

    /// Lookup by identity.
    async fn find_participant(&self, id: ParticipantId) -> Result<Option<Participant>, DbError>;

    /// Idempotent insert-or-replace of a room.
    async fn record_room(&self, room: &Room) -> Result<(), DbError>;

    /// Idempotent delete of a room.
    async fn forget_room(&self, id: RoomId) -> Result<(), DbError>;

    /// Every known room.
    async fn list_rooms(&self) -> Result<Vec<RoomId>, DbError>;
}

/// Delegated operator grants.
#[async_trait]
pub trait PrivilegeStore: Send + Sync {
    /// True if newly granted, false if the grant already existed.
    async fn grant(&self, id: ParticipantId, granted_by: ParticipantId) -> Result<bool, DbError>;

    /// True if a grant was removed.
    async fn revoke(&self, id: ParticipantId) -> Result<bool, DbError>;

    async fn is_operator(&self, id: ParticipantId) -> Result<bool, DbError>;

    /// Newest first.
    async fn list_operators(&self) -> Result<Vec<OperatorGrant>, DbError>;
}

/// Local blacklist, global ban list, and per-room enforcement toggle.
#[async_trait]
pub trait BanStore: Send + Sync {
    /// First reason wins. Returns false if already blacklisted.
    async fn add_local(
        &self,
        id: ParticipantId,
        issued_by: ParticipantId,
        reason: Option<&str>,
    ) -> Result<bool, DbError>;

    async fn remove_local(&self, id: ParticipantId) -> Result<bool, DbError>;

    async fn local_reason(&self, id: ParticipantId) -> Result<Option<String>, DbError>;

    /// Latest reason and issuer win.
    async fn add_global(
        &self,
        id: ParticipantId,
        issued_by: ParticipantId,
        reason: Option<&str>,
    ) -> Result<(), DbError>;

    async fn remove_global(&self, id: ParticipantId) -> Result<bool, DbError>;

    async fn global_reason(&self, id: ParticipantId) -> Result<Option<String>, DbError>;

    /// Rooms never toggled read as enforced.
    async fn is_enforced(&self, room: RoomId) -> Result<bool, DbError>;

    /// Creates the room record if absent.
    async fn set_enforced(&self, room: RoomId, enforced: bool) -> Result<(), DbError>;
}

/// Everything the engine needs from storage.
#[async_trait]
pub trait Store: IdentityStore + PrivilegeStore + BanStore {
    async fn stats(&self) -> Result<StoreStats, DbError>;
}

fn reason_or_default(reason: Option<&str>) -> &str {
    match reason {
        Some(reason) if !reason.trim().is_empty() => reason,
        _ => DEFAULT_REASON,
    }
}

#[async_trait]
impl IdentityStore for Database {
    async fn upsert_participant(&self, participant: &Participant) -> Result<(), DbError> {
        self.participants().upsert(participant).await
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<Participant>, DbError> {
        self.participants().find_by_handle(handle).await
    }

    async fn find_participant(&self, id: ParticipantId) -> Result<Option<Participant>, DbError> {
        self.participants().find(id).await
    }

    async fn record_room(&self, room: &Room) -> Result<(), DbError> {
        self.rooms().record(room).await
    }

    async fn forget_room(&self, id: RoomId) -> Result<(), DbError> {
        self.rooms().forget(id).await.map(|_| ())
    }

    async fn list_rooms(&self) -> Result<Vec<RoomId>, DbError> {
        self.rooms().list_ids().await
    }
}

#[async_trait]
impl PrivilegeStore for Database {
    async fn grant(&self, id: ParticipantId, granted_by: ParticipantId) -> Result<bool, DbError> {
        self.operators().grant(id, granted_by).await
    }

    async fn revoke(&self, id: ParticipantId) -> Result<bool, DbError> {
        self.operators().revoke(id).await
    }

    async fn is_operator(&self, id: ParticipantId) -> Result<bool, DbError> {
        self.operators().is_operator(id).await
    }

    async fn list_operators(&self) -> Result<Vec<OperatorGrant>, DbError> {
        self.operators().list().await
    }
}

#[async_trait]
impl BanStore for Database {
    async fn add_local(
        &self,
        id: ParticipantId,
        issued_by: ParticipantId,
        reason: Option<&str>,
    ) -> Result<bool, DbError> {
        self.bans()
            .add_local(id, issued_by, reason_or_default(reason))
            .await
    }

    async fn remove_local(&self, id: ParticipantId) -> Result<bool, DbError> {
        self.bans().remove_local(id).await
    }

    async fn local_reason(&self, id: ParticipantId) -> Result<Option<String>, DbError> {
        self.bans().local_reason(id).await
    }

    async fn add_global(
        &self,
        id: ParticipantId,
        issued_by: ParticipantId,
        reason: Option<&str>,
    ) -> Result<(), DbError> {
        self.bans()
            .add_global(id, issued_by, reason_or_default(reason))
            .await
    }

    async fn remove_global(&self, id: ParticipantId) -> Result<bool, DbError> {
        self.bans().remove_global(id).await
    }

    async fn global_reason(&self, id: ParticipantId) -> Result<Option<String>, DbError> {
        self.bans().global_reason(id).await
    }

    async fn is_enforced(&self, room: RoomId) -> Result<bool, DbError> {
        self.rooms().is_enforced(room).await
    }

    async fn set_enforced(&self, room: RoomId, enforced: bool) -> Result<(), DbError> {
        self.rooms().set_enforced(room, enforced).await
    }
}

#[async_trait]
impl Store for Database {
    async fn stats(&self) -> Result<StoreStats, DbError> {
        Database::stats(self).await
    }
}
