//! Per-room global ban enforcement toggle. Room creator (or owner) only.

use super::{Handler, Invocation, Outcome, authorize, require_group};
use crate::authority::Action;
use crate::engine::Engine;
use crate::error::{CommandError, CommandResult};
use crate::model::RoomId;
use crate::platform::AdminCapability;
use async_trait::async_trait;
use tracing::{debug, info};

const USAGE: &str = "/enforcegban <yes|no>";

fn parse_switch(arg: &str) -> Option<bool> {
    match arg.to_ascii_lowercase().as_str() {
        "yes" | "on" => Some(true),
        "no" | "off" => Some(false),
        _ => None,
    }
}

pub struct EnforcementHandler;

#[async_trait]
impl Handler for EnforcementHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let room = require_group(inv)?;
        authorize(engine, inv, Action::SetEnforcement, None).await?;

        let enabled = match inv.args.as_slice() {
            [arg] => parse_switch(arg).ok_or(CommandError::Usage(USAGE))?,
            _ => return Err(CommandError::Usage(USAGE)),
        };

        let store = engine.store();
        let current = store.is_enforced(room).await?;
        let assistant_can_ban = assistant_can_ban(engine, room).await;

        if current == enabled {
            return Ok(Outcome::EnforcementUnchanged {
                enabled,
                assistant_can_ban,
            });
        }

        store.set_enforced(room, enabled).await?;
        info!(room_id = room, enabled, actor = inv.actor.id, "global ban enforcement changed");

        Ok(Outcome::EnforcementChanged {
            enabled,
            assistant_can_ban,
        })
    }
}

async fn assistant_can_ban(engine: &Engine, room: RoomId) -> bool {
    match engine
        .platform()
        .member_role(room, engine.assistant_id())
        .await
    {
        Ok(role) => role.has(AdminCapability::RestrictMembers),
        Err(e) => {
            debug!(room_id = room, error = %e, "could not read assistant role");
            false
        }
    }
}
