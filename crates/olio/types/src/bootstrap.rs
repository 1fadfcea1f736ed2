//! Persisted bootstrap record.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::ids::OrganizationId;
use crate::membership::Role;

/// Last known `{user, orgId, role}`, persisted across restarts so the first
/// frame can be painted before any network call resolves.
///
/// Advisory only: every value in here is superseded by network resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRecord {
    #[serde(default)]
    pub user: Option<Identity>,

    #[serde(default)]
    pub org_id: Option<OrganizationId>,

    #[serde(default)]
    pub role: Option<Role>,

    /// Milliseconds since the Unix epoch at write time.
    #[serde(default)]
    pub ts: Option<i64>,
}

impl BootstrapRecord {
    pub fn new(user: Identity, org_id: Option<OrganizationId>, role: Option<Role>) -> Self {
        Self {
            user: Some(user),
            org_id,
            role,
            ts: Some(Utc::now().timestamp_millis()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.org_id.is_none() && self.role.is_none()
    }

    /// Whether the record is complete enough to seed an optimistic snapshot.
    pub fn is_warm(&self) -> bool {
        self.user.is_some() && self.org_id.is_some()
    }
}
