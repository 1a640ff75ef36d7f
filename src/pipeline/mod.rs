//! Inbound interaction pipeline.
//!
//! Every inbound interaction passes through an ordered list of [`Guard`]s
//! before command dispatch. A guard returning [`Flow::Stop`] ends processing
//! of that interaction; no later guard or command runs.

mod guards;
mod membership;

pub use guards::{BlacklistGuard, GlobalBanGuard, ObserveGuard};
pub use membership::{MembershipEvent, MembershipHandler};

use crate::engine::Engine;
use crate::model::{Entity, Participant, Room, RoomId};
use crate::store::Store;
use async_trait::async_trait;
use dashmap::DashSet;
use tokio::sync::OnceCell;
use tracing::{Instrument, debug, warn};

/// Whether processing of an interaction continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// One inbound message or command as seen by the guards.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub actor: Participant,
    pub room: Room,
    pub message_id: Option<i64>,
    /// The entity whose message this one replies to.
    pub reply_to: Option<Entity>,
}

impl Interaction {
    pub fn new(actor: Participant, room: Room) -> Self {
        Self {
            actor,
            room,
            message_id: None,
            reply_to: None,
        }
    }

    pub fn with_message(mut self, message_id: i64) -> Self {
        self.message_id = Some(message_id);
        self
    }

    pub fn replying_to(mut self, entity: Entity) -> Self {
        self.reply_to = Some(entity);
        self
    }
}

/// A single inbound check.
#[async_trait]
pub trait Guard: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &'static str;

    async fn check(&self, engine: &Engine, interaction: &Interaction) -> Flow;
}

/// Rooms already recorded in the store, so observation writes once per room.
///
/// Owned by the [`Engine`]; every path that forgets a room evicts it here too.
#[derive(Default)]
pub struct KnownRooms {
    rooms: DashSet<RoomId>,
    warmed: OnceCell<()>,
}

impl KnownRooms {
    /// Load the stored room list on first use.
    async fn warm(&self, store: &dyn Store) {
        self.warmed
            .get_or_init(|| async {
                match store.list_rooms().await {
                    Ok(ids) => {
                        debug!(count = ids.len(), "known rooms loaded");
                        for id in ids {
                            self.rooms.insert(id);
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to load known rooms"),
                }
            })
            .await;
    }

    pub async fn contains(&self, store: &dyn Store, room: RoomId) -> bool {
        self.warm(store).await;
        self.rooms.contains(&room)
    }

    pub fn insert(&self, room: RoomId) {
        self.rooms.insert(room);
    }

    pub fn remove(&self, room: RoomId) {
        self.rooms.remove(&room);
    }
}

/// Ordered guards.
pub struct Pipeline {
    guards: Vec<Box<dyn Guard>>,
}

impl Pipeline {
    /// Observe, then blacklist, then global-ban enforcement.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ObserveGuard),
            Box::new(BlacklistGuard),
            Box::new(GlobalBanGuard),
        ])
    }

    pub fn new(guards: Vec<Box<dyn Guard>>) -> Self {
        Self { guards }
    }

    pub async fn run(&self, engine: &Engine, interaction: &Interaction) -> Flow {
        let span = crate::telemetry::spans::interaction(interaction.actor.id, interaction.room.id);
        async {
            for guard in &self.guards {
                if guard.check(engine, interaction).await == Flow::Stop {
                    debug!(guard = guard.name(), "interaction stopped");
                    return Flow::Stop;
                }
            }
            Flow::Continue
        }
        .instrument(span)
        .await
    }
}
