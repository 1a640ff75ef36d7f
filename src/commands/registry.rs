//! Command handler registry and dispatch.
//!
//! The `Registry` maps command names (and their aliases) to handlers and keeps
//! per-command usage counters.

use super::blacklist::{BlacklistHandler, UnblacklistHandler};
use super::enforcement::EnforcementHandler;
use super::globalban::{GlobalBanHandler, GlobalUnbanHandler};
use super::moderation::{
    BanHandler, DemoteHandler, KickHandler, KickSelfHandler, MuteHandler, PromoteHandler,
    UnbanHandler, UnmuteHandler,
};
use super::operators::{GrantOperatorHandler, ListOperatorsHandler, RevokeOperatorHandler};
use super::rooms::LeaveHandler;
use super::status::StatusHandler;
use super::{Handler, Invocation, Outcome};
use crate::engine::Engine;
use crate::error::{CommandError, CommandResult};
use crate::telemetry::{CommandTimer, spans};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Instrument, debug, warn};

/// Registry of command handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Arc<dyn Handler>>,
    /// Usage counters, keyed by the name the command was invoked with.
    command_counts: HashMap<&'static str, Arc<AtomicU64>>,
}

impl Registry {
    /// Create a registry with every command registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Arc<dyn Handler>> = HashMap::new();
        let mut register = |names: &[&'static str], handler: Arc<dyn Handler>| {
            for &name in names {
                handlers.insert(name, Arc::clone(&handler));
            }
        };

        // Operator management (owner only)
        register(&["grantop", "addsudo"], Arc::new(GrantOperatorHandler));
        register(&["revokeop", "delsudo"], Arc::new(RevokeOperatorHandler));
        register(&["operators", "listsudo"], Arc::new(ListOperatorsHandler));

        // Installation-wide lists
        register(&["blacklist", "blist"], Arc::new(BlacklistHandler));
        register(&["unblacklist", "unblist"], Arc::new(UnblacklistHandler));
        register(&["gban"], Arc::new(GlobalBanHandler));
        register(&["ungban"], Arc::new(GlobalUnbanHandler));
        register(&["enforcegban"], Arc::new(EnforcementHandler));
        register(&["status"], Arc::new(StatusHandler));
        register(&["leave"], Arc::new(LeaveHandler));

        // Room moderation
        register(&["ban"], Arc::new(BanHandler));
        register(&["unban"], Arc::new(UnbanHandler));
        register(&["mute"], Arc::new(MuteHandler));
        register(&["unmute"], Arc::new(UnmuteHandler));
        register(&["kick"], Arc::new(KickHandler));
        register(&["kickme"], Arc::new(KickSelfHandler));
        register(&["promote"], Arc::new(PromoteHandler));
        register(&["demote"], Arc::new(DemoteHandler));

        let command_counts = handlers
            .keys()
            .map(|&cmd| (cmd, Arc::new(AtomicU64::new(0))))
            .collect();

        Self {
            handlers,
            command_counts,
        }
    }

    /// Whether `name` is a registered command or alias.
    pub fn knows(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Command usage statistics, most used first. Unused commands are omitted.
    pub fn get_command_stats(&self) -> Vec<(&'static str, u64)> {
        let mut stats: Vec<_> = self
            .command_counts
            .iter()
            .map(|(cmd, count)| (*cmd, count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        stats.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        stats
    }

    /// Dispatch an invocation to its handler.
    pub async fn dispatch(&self, engine: &Engine, inv: &Invocation) -> CommandResult<Outcome> {
        let Some((&name, handler)) = self.handlers.get_key_value(inv.command.as_str()) else {
            debug!(command = %inv.command, "unknown command");
            return Err(CommandError::UnknownCommand(inv.command.clone()));
        };

        if let Some(counter) = self.command_counts.get(name) {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let span = spans::command(name, inv.actor.id, inv.room.id);
        let _timer = CommandTimer::new(name);

        let result = handler.handle(engine, inv).instrument(span).await;

        if let Err(ref e) = result {
            match e {
                CommandError::Persistence(_) | CommandError::Platform(_) => {
                    warn!(command = name, code = e.error_code(), error = %e, "command failed")
                }
                _ => debug!(command = name, code = e.error_code(), error = %e, "command error"),
            }
        }

        result
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
