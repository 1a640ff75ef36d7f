//! Store statistics for privileged participants.

use super::{Handler, Invocation, Outcome, authorize};
use crate::authority::Action;
use crate::engine::Engine;
use crate::error::CommandResult;
use async_trait::async_trait;

/// Store row counts for privileged participants.
pub struct StatusHandler;

#[async_trait]
impl Handler for StatusHandler {
    async fn handle(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        authorize(engine, inv, Action::Status, None).await?;
        Ok(Outcome::Status(engine.store().stats().await?))
    }
}
