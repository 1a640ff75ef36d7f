//! Turning raw command arguments into targets, durations and reasons.

mod args;
mod target;

pub use args::{ModArgs, format_duration, parse_duration, parse_mod_args, parse_reason, parse_text};
pub use target::{ResolveError, Resolved, TargetResolver};
