//! Integration test common infrastructure.
//!
//! Builds an engine over an in-memory database and the local platform, with
//! propagation delays set to zero, and drives it the way the console does.

pub mod engine;

#[allow(unused_imports)]
pub use engine::{TestEngine, denial, ids};
