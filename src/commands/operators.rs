//! Operator grant management. Owner only.

use super::{Handler, Invocation, OperatorEntry, Outcome, authorize, resolve_participant};
use crate::authority::Action;
use crate::engine::Engine;
use crate::error::{CommandError, CommandResult};
use crate::opslog::OpsEvent;
use crate::platform::Notice;
use async_trait::async_trait;
use tracing::{info, warn};

const GRANT_USAGE: &str = "/grantop <@handle|id> (or reply)";
const REVOKE_USAGE: &str = "/revokeop <@handle|id> (or reply)";

pub struct GrantOperatorHandler;

#[async_trait]
impl Handler for GrantOperatorHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let target = resolve_participant(engine, inv, GRANT_USAGE).await?.target;
        let grant = authorize(engine, inv, Action::GrantOperator, Some(target.id)).await?;

        if target.is_automated || target.id == engine.assistant_id() {
            return Err(CommandError::InvalidArgument(
                "automated accounts cannot be operators".to_string(),
            ));
        }
        if engine.is_owner(target.id) {
            return Err(CommandError::InvalidArgument(
                "the owner already holds every privilege".to_string(),
            ));
        }

        if !engine.store().grant(target.id, grant.actor()).await? {
            return Ok(Outcome::OperatorAlreadyGranted(target));
        }

        info!(target_id = target.id, granted_by = grant.actor(), "operator granted");

        let welcome = Notice::OperatorWelcome {
            granted_by: grant.actor(),
        };
        if let Err(e) = engine.platform().send_notice(target.id, welcome).await {
            warn!(target_id = target.id, error = %e, "could not notify new operator");
        }

        engine
            .ops_log()
            .emit(
                engine.platform(),
                OpsEvent::OperatorGranted {
                    target: target.clone(),
                    granted_by: grant.actor(),
                },
            )
            .await;

        Ok(Outcome::OperatorGranted(target))
    }
}

pub struct RevokeOperatorHandler;

#[async_trait]
impl Handler for RevokeOperatorHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let target = resolve_participant(engine, inv, REVOKE_USAGE).await?.target;
        let grant = authorize(engine, inv, Action::RevokeOperator, Some(target.id)).await?;

        if !engine.store().revoke(target.id).await? {
            return Ok(Outcome::OperatorNotGranted(target));
        }

        info!(target_id = target.id, revoked_by = grant.actor(), "operator revoked");
        engine
            .ops_log()
            .emit(
                engine.platform(),
                OpsEvent::OperatorRevoked {
                    target: target.clone(),
                    revoked_by: grant.actor(),
                },
            )
            .await;

        Ok(Outcome::OperatorRevoked(target))
    }
}

pub struct ListOperatorsHandler;

#[async_trait]
impl Handler for ListOperatorsHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        authorize(engine, inv, Action::ListOperators, None).await?;

        let store = engine.store();
        let grants = store.list_operators().await?;

        let mut entries = Vec::with_capacity(grants.len());
        for grant in grants {
            let participant = store
                .find_participant(grant.participant_id)
                .await
                .unwrap_or_else(|e| {
                    warn!(participant_id = grant.participant_id, error = %e, "operator identity lookup failed");
                    None
                });
            entries.push(OperatorEntry { grant, participant });
        }

        Ok(Outcome::Operators(entries))
    }
}
