//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "roomwarden.toml";

// =============================================================================
// Database Defaults
// =============================================================================

pub fn default_database_path() -> String {
    "roomwarden.db".to_string()
}

// =============================================================================
// Propagation Defaults
// =============================================================================

/// Wait before an unban sweep starts.
pub fn default_start_delay_ms() -> u64 {
    1000
}

/// Pause between rooms during a sweep.
pub fn default_room_delay_ms() -> u64 {
    200
}
