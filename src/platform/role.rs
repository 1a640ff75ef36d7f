//! Live room membership roles.

use std::collections::BTreeSet;
use std::fmt;

/// A right an administrator may hold in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AdminCapability {
    RestrictMembers,
    PromoteMembers,
    DeleteMessages,
    PinMessages,
    ChangeInfo,
    InviteUsers,
}

impl AdminCapability {
    pub const ALL: [AdminCapability; 6] = [
        Self::RestrictMembers,
        Self::PromoteMembers,
        Self::DeleteMessages,
        Self::PinMessages,
        Self::ChangeInfo,
        Self::InviteUsers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::RestrictMembers => "restrict-members",
            Self::PromoteMembers => "promote-members",
            Self::DeleteMessages => "delete-messages",
            Self::PinMessages => "pin-messages",
            Self::ChangeInfo => "change-info",
            Self::InviteUsers => "invite-users",
        }
    }
}

impl fmt::Display for AdminCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A participant's current standing in one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomRole {
    Creator,
    Administrator { capabilities: BTreeSet<AdminCapability> },
    Member,
    Left,
    Banned,
    Restricted,
}

impl RoomRole {
    /// Administrator holding exactly the given rights.
    pub fn admin_with(capabilities: impl IntoIterator<Item = AdminCapability>) -> Self {
        Self::Administrator {
            capabilities: capabilities.into_iter().collect(),
        }
    }

    /// Administrator holding every right.
    pub fn full_admin() -> Self {
        Self::admin_with(AdminCapability::ALL)
    }

    pub fn is_creator(&self) -> bool {
        matches!(self, Self::Creator)
    }

    pub fn is_administrator(&self) -> bool {
        matches!(self, Self::Administrator { .. })
    }

    /// Creator or administrator.
    pub fn is_staff(&self) -> bool {
        self.is_creator() || self.is_administrator()
    }

    /// Creators implicitly hold every right.
    pub fn has(&self, capability: AdminCapability) -> bool {
        match self {
            Self::Creator => true,
            Self::Administrator { capabilities } => capabilities.contains(&capability),
            Self::Member | Self::Left | Self::Banned | Self::Restricted => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Administrator { .. } => "administrator",
            Self::Member => "member",
            Self::Left => "left",
            Self::Banned => "banned",
            Self::Restricted => "restricted",
        }
    }
}

impl fmt::Display for RoomRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
