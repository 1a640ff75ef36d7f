//! Command results.

use crate::model::{OperatorGrant, Participant, RoomId, StoreStats};
use chrono::{DateTime, Utc};
use std::fmt;

/// One row of the operator listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorEntry {
    pub grant: OperatorGrant,
    /// Stored identity, if the operator has been observed.
    pub participant: Option<Participant>,
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    OperatorGranted(Participant),
    OperatorAlreadyGranted(Participant),
    OperatorRevoked(Participant),
    OperatorNotGranted(Participant),
    Operators(Vec<OperatorEntry>),

    Blacklisted { target: Participant, reason: String },
    AlreadyBlacklisted(Participant),
    Unblacklisted(Participant),
    NotBlacklisted(Participant),

    GlobalBanned {
        target: Participant,
        reason: String,
        /// Whether the ban was also applied in the room the command came from.
        /// `None` when the command came from a private conversation.
        applied_in_room: Option<bool>,
    },
    /// A repeated global ban; reason and issuer were replaced.
    GlobalBanUpdated { target: Participant, reason: String },
    /// The sweep runs in the background and reports separately.
    GlobalUnbanned(Participant),
    NotGloballyBanned(Participant),

    EnforcementChanged {
        enabled: bool,
        assistant_can_ban: bool,
    },
    EnforcementUnchanged {
        enabled: bool,
        assistant_can_ban: bool,
    },

    Banned {
        target: Participant,
        until: Option<DateTime<Utc>>,
        duration: Option<String>,
        reason: String,
    },
    Unbanned(Participant),
    Muted {
        target: Participant,
        until: Option<DateTime<Utc>>,
        duration: Option<String>,
        reason: String,
    },
    Unmuted(Participant),
    Kicked { target: Participant, reason: String },
    LeftRoom(Participant),
    Promoted { target: Participant, title: String },
    TitleUpdated { target: Participant, title: String },
    AlreadyAdministrator(Participant),
    AlreadyCreator(Participant),
    Demoted(Participant),
    NotAdministrator(Participant),

    Status(StoreStats),
    /// The assistant left a room on the owner's request.
    AssistantLeft(RoomId),
}

fn span_text(duration: &Option<String>) -> String {
    match duration {
        Some(d) => format!("for {d}"),
        None => "permanently".to_string(),
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorGranted(p) => write!(f, "{p} is now an operator."),
            Self::OperatorAlreadyGranted(p) => write!(f, "{p} is already an operator."),
            Self::OperatorRevoked(p) => write!(f, "{p} is no longer an operator."),
            Self::OperatorNotGranted(p) => write!(f, "{p} is not an operator."),
            Self::Operators(entries) if entries.is_empty() => write!(f, "No operators."),
            Self::Operators(entries) => {
                write!(f, "Operators ({}):", entries.len())?;
                for entry in entries {
                    match &entry.participant {
                        Some(p) => write!(f, "\n- {p}")?,
                        None => write!(f, "\n- {}", entry.grant.participant_id)?,
                    }
                }
                Ok(())
            }

            Self::Blacklisted { target, reason } => {
                write!(f, "{target} has been blacklisted. Reason: {reason}")
            }
            Self::AlreadyBlacklisted(p) => write!(f, "{p} is already on the blacklist."),
            Self::Unblacklisted(p) => write!(f, "{p} has been removed from the blacklist."),
            Self::NotBlacklisted(p) => write!(f, "{p} is not on the blacklist."),

            Self::GlobalBanned {
                target,
                reason,
                applied_in_room,
            } => {
                write!(f, "{target} has been globally banned. Reason: {reason}")?;
                if *applied_in_room == Some(false) {
                    write!(f, " (could not ban in this room)")?;
                }
                Ok(())
            }
            Self::GlobalBanUpdated { target, reason } => {
                write!(f, "Global ban for {target} updated. Reason: {reason}")
            }
            Self::GlobalUnbanned(p) => write!(
                f,
                "{p} has been globally unbanned. Lifting bans in known rooms..."
            ),
            Self::NotGloballyBanned(p) => write!(f, "{p} is not globally banned."),

            Self::EnforcementChanged {
                enabled,
                assistant_can_ban,
            }
            | Self::EnforcementUnchanged {
                enabled,
                assistant_can_ban,
            } => {
                let state = if *enabled { "enabled" } else { "disabled" };
                if matches!(self, Self::EnforcementUnchanged { .. }) {
                    write!(f, "Global ban enforcement is already {state} in this room.")?;
                } else {
                    write!(f, "Global ban enforcement {state} for this room.")?;
                }
                if *enabled && !assistant_can_ban {
                    write!(f, " Note: I need the right to ban members for enforcement to work.")?;
                }
                Ok(())
            }

            Self::Banned {
                target,
                duration,
                reason,
                ..
            } => write!(f, "{target} banned {}. Reason: {reason}", span_text(duration)),
            Self::Unbanned(p) => write!(f, "{p} has been unbanned."),
            Self::Muted {
                target,
                duration,
                reason,
                ..
            } => write!(f, "{target} muted {}. Reason: {reason}", span_text(duration)),
            Self::Unmuted(p) => write!(f, "{p} has been unmuted."),
            Self::Kicked { target, reason } => write!(f, "{target} kicked. Reason: {reason}"),
            Self::LeftRoom(p) => write!(f, "{p} left the room."),
            Self::Promoted { target, title } => {
                write!(f, "{target} promoted with title \"{title}\".")
            }
            Self::TitleUpdated { target, title } => {
                write!(f, "Title for {target} set to \"{title}\".")
            }
            Self::AlreadyAdministrator(p) => write!(f, "{p} is already an administrator."),
            Self::AlreadyCreator(p) => write!(f, "{p} created this room."),
            Self::Demoted(p) => write!(f, "{p} demoted."),
            Self::NotAdministrator(p) => write!(f, "{p} is not an administrator."),

            Self::Status(stats) => write!(
                f,
                "Participants: {}\nBlacklisted: {}\nOperators: {}\nGlobal bans: {}\nRooms: {}",
                stats.participants, stats.blacklisted, stats.operators, stats.global_bans, stats.rooms
            ),
            Self::AssistantLeft(room) => write!(f, "Left room {room}."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforcement_warns_when_assistant_cannot_ban() {
        let out = Outcome::EnforcementChanged {
            enabled: true,
            assistant_can_ban: false,
        };
        assert!(out.to_string().contains("right to ban"));

        let out = Outcome::EnforcementUnchanged {
            enabled: false,
            assistant_can_ban: false,
        };
        assert_eq!(
            out.to_string(),
            "Global ban enforcement is already disabled in this room."
        );
    }

    #[test]
    fn operator_listing_falls_back_to_id() {
        let out = Outcome::Operators(vec![OperatorEntry {
            grant: OperatorGrant {
                participant_id: 99,
                granted_by: 1,
                granted_at: 0,
            },
            participant: None,
        }]);
        assert_eq!(out.to_string(), "Operators (1):\n- 99");
        assert_eq!(Outcome::Operators(Vec::new()).to_string(), "No operators.");
    }

    #[test]
    fn ban_without_duration_is_permanent() {
        let out = Outcome::Banned {
            target: Participant::new(5, "Eve"),
            until: None,
            duration: None,
            reason: "spam".to_string(),
        };
        assert_eq!(out.to_string(), "Eve (5) banned permanently. Reason: spam");
    }
}
