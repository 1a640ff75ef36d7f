//! Owner-only room departure.

use super::{Handler, Invocation, Outcome, authorize, require_group};
use crate::authority::Action;
use crate::engine::Engine;
use crate::error::{CommandError, CommandResult};
use crate::model::RoomId;
use async_trait::async_trait;
use tracing::info;

const USAGE: &str = "/leave [room_id]";

/// Group rooms carry negative ids.
fn parse_room(arg: &str) -> CommandResult<RoomId> {
    let id: RoomId = arg
        .parse()
        .map_err(|_| CommandError::InvalidIdentifier(arg.to_string()))?;
    if id >= 0 {
        return Err(CommandError::InvalidArgument(format!(
            "{id} is not a group room"
        )));
    }
    Ok(id)
}

/// Leave the current room, or the named one from anywhere.
pub struct LeaveHandler;

#[async_trait]
impl Handler for LeaveHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        authorize(engine, inv, Action::LeaveRoom, None).await?;

        let room = match inv.args.as_slice() {
            [] => require_group(inv)?,
            [arg] => parse_room(arg)?,
            _ => return Err(CommandError::Usage(USAGE)),
        };

        engine.platform().leave_room(room).await?;
        engine.store().forget_room(room).await?;
        engine.known_rooms().remove(room);
        info!(room_id = room, actor_id = inv.actor.id, "assistant left room");

        Ok(Outcome::AssistantLeft(room))
    }
}
