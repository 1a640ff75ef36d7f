//! Global bans. The ban itself applies only in the originating room; the
//! guards enforce it elsewhere as the participant shows up. Lifting a global
//! ban sweeps every known room in the background.

use super::{Handler, Invocation, Outcome, authorize, resolve_participant};
use crate::authority::Action;
use crate::engine::Engine;
use crate::error::CommandResult;
use crate::opslog::OpsEvent;
use crate::propagation::spawn_unban_propagation;
use crate::resolve::parse_reason;
use async_trait::async_trait;
use tracing::{info, warn};

const BAN_USAGE: &str = "/gban <@handle|id> [reason] (or reply)";
const UNBAN_USAGE: &str = "/ungban <@handle|id> (or reply)";

pub struct GlobalBanHandler;

#[async_trait]
impl Handler for GlobalBanHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let resolved = resolve_participant(engine, inv, BAN_USAGE).await?;
        let target = resolved.target;
        let grant = authorize(engine, inv, Action::GlobalBan, Some(target.id)).await?;

        let reason = parse_reason(&inv.args[resolved.consumed..]);
        let store = engine.store();

        let existing = store.global_reason(target.id).await?;
        store
            .add_global(target.id, grant.actor(), Some(reason.as_str()))
            .await?;

        if existing.is_some() {
            info!(target_id = target.id, issued_by = grant.actor(), reason = %reason, "global ban updated");
            return Ok(Outcome::GlobalBanUpdated { target, reason });
        }

        info!(target_id = target.id, issued_by = grant.actor(), reason = %reason, "participant globally banned");

        let applied_in_room = if inv.room.is_private() {
            None
        } else {
            match engine.platform().ban_member(inv.room.id, target.id, None).await {
                Ok(()) => Some(true),
                Err(e) => {
                    warn!(target_id = target.id, room_id = inv.room.id, error = %e, "could not ban in originating room");
                    Some(false)
                }
            }
        };

        engine
            .ops_log()
            .emit(
                engine.platform(),
                OpsEvent::GlobalBanned {
                    target: target.clone(),
                    reason: reason.clone(),
                    issued_by: grant.actor(),
                },
            )
            .await;

        Ok(Outcome::GlobalBanned {
            target,
            reason,
            applied_in_room,
        })
    }
}

pub struct GlobalUnbanHandler;

#[async_trait]
impl Handler for GlobalUnbanHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let target = resolve_participant(engine, inv, UNBAN_USAGE).await?.target;
        let grant = authorize(engine, inv, Action::GlobalUnban, Some(target.id)).await?;

        if !engine.store().remove_global(target.id).await? {
            return Ok(Outcome::NotGloballyBanned(target));
        }

        info!(target_id = target.id, issued_by = grant.actor(), "global ban lifted");
        spawn_unban_propagation(engine, target.id, inv.room.id);

        engine
            .ops_log()
            .emit(
                engine.platform(),
                OpsEvent::GlobalUnbanned {
                    target: target.clone(),
                    issued_by: grant.actor(),
                },
            )
            .await;

        Ok(Outcome::GlobalUnbanned(target))
    }
}
