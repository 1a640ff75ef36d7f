//! roomwarden - privilege and ban-state engine for multi-room chat moderation.
//!
//! Decides who may moderate whom across every room an assistant account
//! serves, keeps installation-wide blacklists and global bans, and enforces
//! them as participants speak or join.

pub mod authority;
pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod model;
pub mod opslog;
pub mod pipeline;
pub mod platform;
pub mod propagation;
pub mod resolve;
pub mod store;
pub mod telemetry;
