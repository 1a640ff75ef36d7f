//! Repository for the local blacklist and the global ban list.

mod queries;

pub use queries::BanRepository;
