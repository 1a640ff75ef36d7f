//! Command target resolution.
//!
//! Order: reply reference, then `@handle` (identity repository first, then
//! the directory), then numeric identity (directory only).

use crate::model::{Entity, Participant};
use crate::platform::{EntityRef, Platform, PlatformError};
use crate::store::Store;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a target could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no target given")]
    Missing,
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("could not identify target {0}")]
    NotFound(String),
    #[error("target {0} is not an individual")]
    NotAnIndividual(i64),
    #[error("directory lookup failed: {0}")]
    Lookup(PlatformError),
}

/// A resolved target and how many argument tokens it used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub target: T,
    /// 0 for a reply reference, 1 otherwise.
    pub consumed: usize,
}

/// Turns a reply reference or first argument into an entity.
pub struct TargetResolver<'a> {
    identities: &'a dyn Store,
    platform: &'a dyn Platform,
}

impl<'a> TargetResolver<'a> {
    pub fn new(identities: &'a dyn Store, platform: &'a dyn Platform) -> Self {
        Self {
            identities,
            platform,
        }
    }

    /// Resolve to any entity, participant or room.
    pub async fn resolve(
        &self,
        reply_to: Option<&Entity>,
        args: &[String],
    ) -> Result<Resolved<Entity>, ResolveError> {
        if let Some(entity) = reply_to {
            return Ok(Resolved {
                target: entity.clone(),
                consumed: 0,
            });
        }

        let token = args.first().ok_or(ResolveError::Missing)?;

        let target = match token.strip_prefix('@') {
            Some(handle) => self.by_handle(token, handle).await?,
            None => {
                let id: i64 = token
                    .parse()
                    .map_err(|_| ResolveError::InvalidIdentifier(token.clone()))?;
                self.lookup(token, EntityRef::Id(id)).await?
            }
        };

        Ok(Resolved {
            target,
            consumed: 1,
        })
    }

    /// Resolve to an individual participant. A room is a failure.
    pub async fn resolve_participant(
        &self,
        reply_to: Option<&Entity>,
        args: &[String],
    ) -> Result<Resolved<Participant>, ResolveError> {
        let Resolved { target, consumed } = self.resolve(reply_to, args).await?;
        match target {
            Entity::Participant(participant) => Ok(Resolved {
                target: participant,
                consumed,
            }),
            Entity::Room(room) => Err(ResolveError::NotAnIndividual(room.id)),
        }
    }

    async fn by_handle(&self, token: &str, handle: &str) -> Result<Entity, ResolveError> {
        if handle.is_empty() {
            return Err(ResolveError::InvalidIdentifier(token.to_string()));
        }

        match self.identities.find_by_handle(handle).await {
            Ok(Some(participant)) => {
                debug!(handle = %handle, participant_id = participant.id, "handle resolved from store");
                return Ok(Entity::Participant(participant));
            }
            Ok(None) => {}
            Err(e) => warn!(handle = %handle, error = %e, "handle lookup in store failed"),
        }

        let entity = self
            .lookup(token, EntityRef::Handle(handle.to_string()))
            .await?;

        if let Entity::Participant(participant) = &entity
            && let Err(e) = self.identities.upsert_participant(participant).await
        {
            warn!(participant_id = participant.id, error = %e, "failed to persist resolved participant");
        }

        Ok(entity)
    }

    async fn lookup(&self, token: &str, key: EntityRef) -> Result<Entity, ResolveError> {
        match self.platform.lookup(&key).await {
            Ok(entity) => Ok(entity),
            Err(PlatformError::NotFound(_)) => Err(ResolveError::NotFound(token.to_string())),
            Err(e) => {
                warn!(key = %key, error = %e, "directory lookup failed");
                Err(ResolveError::Lookup(e))
            }
        }
    }
}
