//! The published hydration snapshot.
//!
//! A snapshot is an immutable value. The coordinator derives the next
//! snapshot from the current one with the transition methods below and
//! replaces it wholesale; nothing mutates a published snapshot in place.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bootstrap::BootstrapRecord;
use crate::identity::Identity;
use crate::ids::OrganizationId;
use crate::membership::Role;
use crate::organization::Organization;

/// Where the hydration state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HydrationPhase {
    /// Process start with nothing cached.
    Cold,
    /// Seeded from the bootstrap cache, verification still pending.
    WarmOptimistic,
    /// Network calls in flight.
    Resolving,
    /// Nothing in flight; `loading` and `org_loading` are both false.
    Settled,
}

impl fmt::Display for HydrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HydrationPhase::Cold => write!(f, "cold"),
            HydrationPhase::WarmOptimistic => write!(f, "warm-optimistic"),
            HydrationPhase::Resolving => write!(f, "resolving"),
            HydrationPhase::Settled => write!(f, "settled"),
        }
    }
}

/// `{loading, hydrated, user, authError, orgLoading, orgId, org, role, orgError}`
/// as seen by UI collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydrationSnapshot {
    pub phase: HydrationPhase,
    pub loading: bool,
    pub hydrated: bool,
    pub user: Option<Identity>,
    pub auth_error: Option<String>,
    pub org_loading: bool,
    pub org_id: Option<OrganizationId>,
    pub org: Option<Organization>,
    pub role: Option<Role>,
    pub org_error: Option<String>,
}

impl HydrationSnapshot {
    /// Nothing known yet.
    pub fn cold() -> Self {
        Self {
            phase: HydrationPhase::Cold,
            loading: true,
            hydrated: false,
            user: None,
            auth_error: None,
            org_loading: false,
            org_id: None,
            org: None,
            role: None,
            org_error: None,
        }
    }

    /// Seed from a bootstrap record, or fall back to [`cold`](Self::cold)
    /// when the record lacks a user or an organization id.
    pub fn from_bootstrap(record: &BootstrapRecord) -> Self {
        match (&record.user, &record.org_id) {
            (Some(user), Some(org_id)) => Self {
                phase: HydrationPhase::WarmOptimistic,
                loading: false,
                hydrated: true,
                user: Some(user.clone()),
                auth_error: None,
                org_loading: true,
                org_id: Some(org_id.clone()),
                org: None,
                role: record.role,
                org_error: None,
            },
            _ => Self::cold(),
        }
    }

    /// A resolution run has started.
    pub fn resolving(&self) -> Self {
        let phase = match self.phase {
            HydrationPhase::Cold | HydrationPhase::WarmOptimistic => self.phase,
            _ => HydrationPhase::Resolving,
        };
        Self {
            phase,
            ..self.clone()
        }
    }

    /// An identity was found; its organization is about to be resolved.
    ///
    /// Organization state belonging to a different user is dropped so it can
    /// never be shown alongside the new identity.
    pub fn identity_resolved(&self, user: Identity, auth_error: Option<String>) -> Self {
        let same_user = self.user.as_ref().map(|u| &u.id) == Some(&user.id);
        let mut next = Self {
            phase: HydrationPhase::Resolving,
            loading: false,
            hydrated: true,
            user: Some(user),
            auth_error,
            org_loading: true,
            org_error: None,
            ..self.clone()
        };
        if !same_user {
            next.org_id = None;
            next.org = None;
            next.role = None;
        }
        next
    }

    /// No identity: everything user- and org-related is cleared.
    pub fn signed_out(&self, auth_error: Option<String>) -> Self {
        Self {
            phase: HydrationPhase::Settled,
            loading: false,
            hydrated: true,
            user: None,
            auth_error,
            org_loading: false,
            org_id: None,
            org: None,
            role: None,
            org_error: None,
        }
    }

    /// An organization reload started for the current identity.
    pub fn org_resolving(&self) -> Self {
        Self {
            phase: HydrationPhase::Resolving,
            org_loading: true,
            ..self.clone()
        }
    }

    /// Organization resolution finished, successfully or not.
    pub fn org_settled(
        &self,
        org_id: Option<OrganizationId>,
        org: Option<Organization>,
        role: Option<Role>,
        org_error: Option<String>,
    ) -> Self {
        let mut next = Self {
            org_loading: false,
            org_id,
            org,
            role,
            org_error,
            ..self.clone()
        };
        next.phase = next.settled_phase();
        next
    }

    /// Nothing in flight. A re-resolution from a settled state keeps both
    /// loading flags false, so the phase is checked as well.
    pub fn is_settled(&self) -> bool {
        self.phase == HydrationPhase::Settled && !self.loading && !self.org_loading
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    fn settled_phase(&self) -> HydrationPhase {
        if !self.loading && !self.org_loading {
            HydrationPhase::Settled
        } else {
            HydrationPhase::Resolving
        }
    }
}

impl Default for HydrationSnapshot {
    fn default() -> Self {
        Self::cold()
    }
}
