//! Organization membership and roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::ids::{OrganizationId, UserId};

/// Role of a user inside their organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
    Owner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Member => write!(f, "member"),
            Role::Admin => write!(f, "admin"),
            Role::Owner => write!(f, "owner"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(Role::Member),
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// A row of the `profiles` table: one per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: UserId,

    #[serde(default)]
    pub org_id: Option<OrganizationId>,

    #[serde(default)]
    pub role: Role,
}

impl ProfileRow {
    /// The self-healing default record: no organization, plain member.
    pub fn default_for(user_id: UserId) -> Self {
        Self {
            id: user_id,
            org_id: None,
            role: Role::Member,
        }
    }
}

/// Resolved link between an identity and at most one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub organization_id: Option<OrganizationId>,
    pub role: Role,
}

impl From<ProfileRow> for Membership {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: row.id,
            organization_id: row.org_id,
            role: row.role,
        }
    }
}
