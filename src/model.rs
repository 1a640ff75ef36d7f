//! Core domain types shared by the stores, the resolvers and the commands.

use std::fmt;

/// Platform-unique participant identity.
pub type ParticipantId = i64;

/// Platform-unique room identity.
pub type RoomId = i64;

/// A participant observed on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    /// Display handle without the leading `@`.
    pub handle: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    /// Locale tag reported by the platform (e.g. "en").
    pub locale: Option<String>,
    /// Automated accounts (other bots).
    pub is_automated: bool,
}

impl Participant {
    /// Create a participant with only an identity and a first name.
    pub fn new(id: ParticipantId, first_name: impl Into<String>) -> Self {
        Self {
            id,
            handle: None,
            first_name: first_name.into(),
            last_name: None,
            locale: None,
            is_automated: false,
        }
    }

    /// Builder-style handle setter. A leading `@` is stripped.
    pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
        let handle = handle.into();
        self.handle = Some(handle.trim_start_matches('@').to_string());
        self
    }

    /// Builder-style flag for automated accounts.
    pub fn automated(mut self) -> Self {
        self.is_automated = true;
        self
    }

    /// Full display name ("First Last").
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.handle {
            Some(handle) => write!(f, "@{} ({})", handle, self.id),
            None if !self.first_name.is_empty() => write!(f, "{} ({})", self.full_name(), self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Kind of room a command or interaction arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    /// One-to-one conversation with the assistant.
    Private,
    /// Multi-member group.
    Group,
    /// Broadcast channel.
    Channel,
}

/// A room on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub title: Option<String>,
    pub kind: RoomKind,
}

impl Room {
    pub fn new(id: RoomId, kind: RoomKind, title: Option<&str>) -> Self {
        Self {
            id,
            title: title.map(str::to_string),
            kind,
        }
    }

    pub fn group(id: RoomId, title: &str) -> Self {
        Self::new(id, RoomKind::Group, Some(title))
    }

    pub fn private(id: RoomId) -> Self {
        Self::new(id, RoomKind::Private, None)
    }

    pub fn is_private(&self) -> bool {
        self.kind == RoomKind::Private
    }

    /// Title used when persisting the room.
    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Untitled Room {}", self.id))
    }
}

/// Anything the directory can resolve an identifier to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Participant(Participant),
    Room(Room),
}

impl Entity {
    pub fn id(&self) -> i64 {
        match self {
            Entity::Participant(p) => p.id,
            Entity::Room(r) => r.id,
        }
    }
}

/// A delegated operator grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorGrant {
    pub participant_id: ParticipantId,
    pub granted_by: ParticipantId,
    /// Unix seconds (UTC).
    pub granted_at: i64,
}

/// A local blacklist or global ban row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanEntry {
    pub participant_id: ParticipantId,
    pub reason: String,
    pub issued_by: ParticipantId,
    /// Unix seconds (UTC).
    pub issued_at: i64,
}

/// Row counts across the store, for the status command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub participants: i64,
    pub blacklisted: i64,
    pub operators: i64,
    pub global_bans: i64,
    pub rooms: i64,
}
