//! Shared engine state handed to guards, commands and background tasks.

use crate::authority::PrivilegeResolver;
use crate::config::Config;
use crate::model::ParticipantId;
use crate::opslog::OpsLog;
use crate::pipeline::KnownRooms;
use crate::platform::Platform;
use crate::resolve::TargetResolver;
use crate::store::Store;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Immutable configuration plus the store and platform collaborators.
///
/// Cheap to clone; background tasks take their own copy.
#[derive(Clone)]
pub struct Engine {
    config: Arc<Config>,
    store: Arc<dyn Store>,
    platform: Arc<dyn Platform>,
    known_rooms: Arc<KnownRooms>,
    /// Spawned background work not yet joined.
    background: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Engine {
    pub fn new(config: Arc<Config>, store: Arc<dyn Store>, platform: Arc<dyn Platform>) -> Self {
        Self {
            config,
            store,
            platform,
            known_rooms: Arc::new(KnownRooms::default()),
            background: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn known_rooms(&self) -> &KnownRooms {
        &self.known_rooms
    }

    pub fn owner_id(&self) -> ParticipantId {
        self.config.owner_id()
    }

    pub fn assistant_id(&self) -> ParticipantId {
        self.platform.assistant_id()
    }

    pub fn is_owner(&self, participant: ParticipantId) -> bool {
        participant == self.owner_id()
    }

    pub fn privileges(&self) -> PrivilegeResolver<'_> {
        PrivilegeResolver::new(self.owner_id(), self.store(), self.platform())
    }

    pub fn targets(&self) -> TargetResolver<'_> {
        TargetResolver::new(self.store(), self.platform())
    }

    pub fn ops_log(&self) -> OpsLog {
        OpsLog::new(self.config.log_destination(), self.owner_id())
    }

    /// Keep a handle to spawned work so shutdown can wait for it.
    pub fn track(&self, handle: JoinHandle<()>) {
        let mut background = self.background.lock();
        background.retain(|h| !h.is_finished());
        background.push(handle);
    }

    /// Wait for every tracked task, including ones spawned while waiting.
    pub async fn join_background(&self) {
        loop {
            let pending: Vec<_> = std::mem::take(&mut *self.background.lock());
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    warn!(error = %e, "background task failed");
                }
            }
        }
    }
}
