//! Background unban sweep across every known room.
//!
//! Runs as one spawned task per global unban. The command that triggers it
//! has already replied; the sweep reports with a separate summary notice to
//! the originating room. There is no cancellation.

use crate::engine::Engine;
use crate::model::{ParticipantId, RoomId};
use crate::platform::{Destination, Notice, PlatformError, RoomRole};
use crate::telemetry::spans;
use tracing::{Instrument, debug, error, info, warn};

/// Spawn the sweep and register it with the engine's background tasks.
pub fn spawn_unban_propagation(engine: &Engine, target: ParticipantId, origin: Destination) {
    let task_engine = engine.clone();
    let handle = tokio::spawn(
        async move {
            propagate_unban(&task_engine, target, origin).await;
        }
        .instrument(spans::propagation(target)),
    );
    engine.track(handle);
}

/// Lift `target`'s ban in every known room where it is currently banned.
///
/// Returns the number of rooms where the unban succeeded.
pub async fn propagate_unban(engine: &Engine, target: ParticipantId, origin: Destination) -> usize {
    let settings = &engine.config().propagation;

    tokio::time::sleep(settings.start_delay()).await;

    let rooms = match engine.store().list_rooms().await {
        Ok(rooms) => rooms,
        Err(e) => {
            error!(target_id = target, error = %e, "failed to load rooms for unban propagation");
            notify(engine, origin, Notice::PropagationFailed { target }).await;
            return 0;
        }
    };

    if rooms.is_empty() {
        notify(engine, origin, Notice::PropagationNoRooms { target }).await;
        return 0;
    }

    info!(target_id = target, rooms = rooms.len(), "starting unban propagation");

    let mut unbanned = 0;
    for (i, &room) in rooms.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(settings.room_delay()).await;
        }
        if unban_in_room(engine, target, room).await {
            unbanned += 1;
        }
    }

    info!(target_id = target, unbanned, "unban propagation finished");
    notify(
        engine,
        origin,
        Notice::PropagationSummary {
            target,
            rooms_affected: unbanned,
        },
    )
    .await;

    unbanned
}

async fn unban_in_room(engine: &Engine, target: ParticipantId, room: RoomId) -> bool {
    let platform = engine.platform();

    let role = match platform.member_role(room, target).await {
        Ok(role) => role,
        Err(PlatformError::NotMember { .. }) => {
            debug!(target_id = target, room_id = room, "not a member, skipping");
            return false;
        }
        Err(e) => {
            warn!(target_id = target, room_id = room, error = %e, "could not read membership");
            return false;
        }
    };

    if role != RoomRole::Banned {
        return false;
    }

    match platform.unban_member(room, target).await {
        Ok(()) => {
            info!(target_id = target, room_id = room, "unbanned");
            true
        }
        Err(e) => {
            warn!(target_id = target, room_id = room, error = %e, "unban failed");
            false
        }
    }
}

async fn notify(engine: &Engine, origin: Destination, notice: Notice) {
    if let Err(e) = engine.platform().send_notice(origin, notice).await {
        warn!(destination = origin, error = %e, "failed to deliver propagation notice");
    }
}
