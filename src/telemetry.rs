//! Telemetry utilities for command timing and tracing spans.

use std::time::Instant;
use tracing::debug;

/// Guard for timing command execution.
///
/// Logs command latency when dropped.
pub struct CommandTimer {
    command: &'static str,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        debug!(command = self.command, elapsed_ms, "command finished");
    }
}

/// Standardized span constructors.
pub mod spans {
    use crate::model::{ParticipantId, RoomId};
    use tracing::{Span, info_span};

    /// Create a span for a command execution.
    pub fn command(name: &str, actor: ParticipantId, room: RoomId) -> Span {
        info_span!("command", name = %name, actor = actor, room = room)
    }

    /// Create a span for an inbound interaction passing the guards.
    pub fn interaction(actor: ParticipantId, room: RoomId) -> Span {
        info_span!("interaction", actor = actor, room = room)
    }

    /// Create a span for an unban sweep.
    pub fn propagation(target: ParticipantId) -> Span {
        info_span!("propagation", target = target)
    }
}
