//! Database query methods for ban operations.

pub mod global;
pub mod local;

use crate::db::DbError;
use crate::model::{BanEntry, ParticipantId};
use sqlx::SqlitePool;

/// Macro to generate repository wrapper methods for ban operations.
///
/// Each generated method forwards to the module-level function of the same
/// list, passing the repository's pool.
macro_rules! ban_repository_methods {
    (
        $(
            $(#[$meta:meta])*
            fn $method_name:ident($($arg:ident: $arg_ty:ty),*) -> $ret_ty:ty
                => $module:ident::$fn_name:ident;
        )*
    ) => {
        $(
            $(#[$meta])*
            pub async fn $method_name(&self, $($arg: $arg_ty),*) -> $ret_ty {
                $module::$fn_name(self.pool, $($arg),*).await
            }
        )*
    };
}

/// Repository for ban operations.
pub struct BanRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BanRepository<'a> {
    /// Create a new ban repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    ban_repository_methods! {
        // ========== Local blacklist ==========

        /// Add to the blacklist. Returns false if already present (first reason wins).
        fn add_local(participant_id: ParticipantId, issued_by: ParticipantId, reason: &str) -> Result<bool, DbError>
            => local::add_local;

        /// Remove from the blacklist.
        fn remove_local(participant_id: ParticipantId) -> Result<bool, DbError>
            => local::remove_local;

        /// Get a blacklist entry.
        fn get_local(participant_id: ParticipantId) -> Result<Option<BanEntry>, DbError>
            => local::get_local;

        // ========== Global bans ==========

        /// Add or re-issue a global ban (latest reason wins).
        fn add_global(participant_id: ParticipantId, issued_by: ParticipantId, reason: &str) -> Result<(), DbError>
            => global::add_global;

        /// Remove a global ban.
        fn remove_global(participant_id: ParticipantId) -> Result<bool, DbError>
            => global::remove_global;

        /// Get a global ban entry.
        fn get_global(participant_id: ParticipantId) -> Result<Option<BanEntry>, DbError>
            => global::get_global;
    }

    /// Blacklist reason, if the participant is blacklisted.
    pub async fn local_reason(&self, participant_id: ParticipantId) -> Result<Option<String>, DbError> {
        Ok(self.get_local(participant_id).await?.map(|entry| entry.reason))
    }

    /// Global ban reason, if the participant is globally banned.
    pub async fn global_reason(&self, participant_id: ParticipantId) -> Result<Option<String>, DbError> {
        Ok(self.get_global(participant_id).await?.map(|entry| entry.reason))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn local_ban_first_reason_wins() {
        let db = Database::new(":memory:").await.unwrap();
        let bans = db.bans();

        assert!(bans.add_local(7, 1, "spam").await.unwrap());
        assert!(!bans.add_local(7, 2, "flood").await.unwrap());

        let entry = bans.get_local(7).await.unwrap().unwrap();
        assert_eq!(entry.reason, "spam");
        assert_eq!(entry.issued_by, 1);
    }

    #[tokio::test]
    async fn global_ban_latest_reason_wins() {
        let db = Database::new(":memory:").await.unwrap();
        let bans = db.bans();

        bans.add_global(7, 1, "spam").await.unwrap();
        bans.add_global(7, 2, "scam links").await.unwrap();

        let entry = bans.get_global(7).await.unwrap().unwrap();
        assert_eq!(entry.reason, "scam links");
        assert_eq!(entry.issued_by, 2);
    }

    #[tokio::test]
    async fn local_and_global_are_independent() {
        let db = Database::new(":memory:").await.unwrap();
        let bans = db.bans();

        bans.add_local(7, 1, "local").await.unwrap();
        assert!(bans.global_reason(7).await.unwrap().is_none());

        bans.add_global(7, 1, "global").await.unwrap();
        assert!(bans.remove_local(7).await.unwrap());
        assert_eq!(bans.global_reason(7).await.unwrap().as_deref(), Some("global"));
        assert!(bans.local_reason(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_reports_absence() {
        let db = Database::new(":memory:").await.unwrap();
        let bans = db.bans();

        assert!(!bans.remove_local(1).await.unwrap());
        assert!(!bans.remove_global(1).await.unwrap());
    }
}
