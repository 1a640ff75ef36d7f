//! Installation-wide blacklist. Blacklisted participants are ignored entirely.

use super::{Handler, Invocation, Outcome, authorize, resolve_participant};
use crate::authority::Action;
use crate::engine::Engine;
use crate::error::CommandResult;
use crate::opslog::OpsEvent;
use crate::resolve::parse_reason;
use async_trait::async_trait;
use tracing::info;

const ADD_USAGE: &str = "/blist <@handle|id> [reason] (or reply)";
const REMOVE_USAGE: &str = "/unblist <@handle|id> (or reply)";

pub struct BlacklistHandler;

#[async_trait]
impl Handler for BlacklistHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let resolved = resolve_participant(engine, inv, ADD_USAGE).await?;
        let target = resolved.target;
        let grant = authorize(engine, inv, Action::Blacklist, Some(target.id)).await?;

        let reason = parse_reason(&inv.args[resolved.consumed..]);
        let store = engine.store();

        if !store
            .add_local(target.id, grant.actor(), Some(reason.as_str()))
            .await?
        {
            return Ok(Outcome::AlreadyBlacklisted(target));
        }

        info!(target_id = target.id, issued_by = grant.actor(), reason = %reason, "participant blacklisted");
        engine
            .ops_log()
            .emit(
                engine.platform(),
                OpsEvent::Blacklisted {
                    target: target.clone(),
                    reason: reason.clone(),
                    issued_by: grant.actor(),
                },
            )
            .await;

        Ok(Outcome::Blacklisted { target, reason })
    }
}

pub struct UnblacklistHandler;

#[async_trait]
impl Handler for UnblacklistHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let target = resolve_participant(engine, inv, REMOVE_USAGE).await?.target;
        let grant = authorize(engine, inv, Action::Unblacklist, Some(target.id)).await?;

        if !engine.store().remove_local(target.id).await? {
            return Ok(Outcome::NotBlacklisted(target));
        }

        info!(target_id = target.id, issued_by = grant.actor(), "participant removed from blacklist");
        engine
            .ops_log()
            .emit(
                engine.platform(),
                OpsEvent::Unblacklisted {
                    target: target.clone(),
                    issued_by: grant.actor(),
                },
            )
            .await;

        Ok(Outcome::Unblacklisted(target))
    }
}
