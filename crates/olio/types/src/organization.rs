//! Organizations (tenants).

use serde::{Deserialize, Serialize};

use crate::ids::{OrganizationId, UserId};

/// Icon colors offered when creating an organization.
pub const ORG_COLORS: [&str; 10] = [
    "#3b82f6", // blue
    "#6366f1", // indigo
    "#8b5cf6", // violet
    "#ec4899", // pink
    "#ef4444", // red
    "#f97316", // orange
    "#facc15", // yellow
    "#22c55e", // green
    "#14b8a6", // teal
    "#64748b", // slate
];

pub const DEFAULT_ORG_COLOR: &str = ORG_COLORS[0];

/// A row of the `organizations` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub icon_color: String,

    /// Four-digit code other users enter to join.
    #[serde(default, rename = "code", skip_serializing_if = "Option::is_none")]
    pub join_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
}

impl Organization {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.owner_id.as_ref() == Some(user_id)
    }
}

/// Values for inserting a new organization; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub icon_color: String,
    pub join_code: String,
    pub owner_id: UserId,
}

impl NewOrganization {
    pub fn into_organization(self, id: OrganizationId) -> Organization {
        Organization {
            id,
            name: self.name,
            icon_color: self.icon_color,
            join_code: Some(self.join_code),
            owner_id: Some(self.owner_id),
        }
    }
}

pub fn is_palette_color(color: &str) -> bool {
    ORG_COLORS.contains(&color)
}

/// Join codes are exactly four ASCII digits.
pub fn is_valid_join_code(code: &str) -> bool {
    code.len() == 4 && code.bytes().all(|b| b.is_ascii_digit())
}
