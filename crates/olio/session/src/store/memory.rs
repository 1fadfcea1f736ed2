//! In-memory tenant store for development and testing.
//!
//! Supports per-operation failure injection and latency, so permission
//! errors, network errors and slow round-trips can be reproduced
//! deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use olio_types::{NewOrganization, Organization, OrganizationId, ProfileRow, UserId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{TenantStore, ORGANIZATIONS_TABLE, PROFILES_TABLE};
use crate::error::{Result, SessionError};

/// Store operations that failures and delays can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOp {
    SelectProfile,
    InsertProfile,
    UpsertProfile,
    SelectOrganization,
    FindOrganizationByCode,
    InsertOrganization,
}

impl StoreOp {
    fn table(&self) -> &'static str {
        match self {
            StoreOp::SelectProfile | StoreOp::InsertProfile | StoreOp::UpsertProfile => {
                PROFILES_TABLE
            }
            _ => ORGANIZATIONS_TABLE,
        }
    }
}

/// Failure to inject into a store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFailure {
    PermissionDenied(String),
    Network(String),
}

impl StoreFailure {
    fn to_error(&self, op: StoreOp) -> SessionError {
        match self {
            StoreFailure::PermissionDenied(reason) => {
                SessionError::permission_denied(op.table(), reason.clone())
            }
            StoreFailure::Network(reason) => SessionError::Network(reason.clone()),
        }
    }
}

struct FailureRule {
    failure: StoreFailure,
    /// Calls that still succeed before the failure kicks in.
    skip: usize,
}

#[derive(Default)]
pub struct MemoryTenantStore {
    profiles: DashMap<UserId, ProfileRow>,
    organizations: DashMap<OrganizationId, Organization>,
    failures: Mutex<HashMap<StoreOp, FailureRule>>,
    delays: Mutex<HashMap<StoreOp, Duration>>,
    user_delays: DashMap<UserId, Duration>,
    calls: DashMap<StoreOp, AtomicUsize>,
}

impl MemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the tables.
    pub fn from_rows(
        profiles: impl IntoIterator<Item = ProfileRow>,
        organizations: impl IntoIterator<Item = Organization>,
    ) -> Self {
        let store = Self::new();
        for row in profiles {
            store.put_profile(row);
        }
        for org in organizations {
            store.put_organization(org);
        }
        store
    }

    pub fn put_profile(&self, row: ProfileRow) {
        self.profiles.insert(row.id.clone(), row);
    }

    pub fn put_organization(&self, org: Organization) {
        self.organizations.insert(org.id.clone(), org);
    }

    pub fn remove_organization(&self, id: &OrganizationId) -> Option<Organization> {
        self.organizations.remove(id).map(|(_, org)| org)
    }

    pub fn profile(&self, user_id: &UserId) -> Option<ProfileRow> {
        self.profiles.get(user_id).map(|r| r.clone())
    }

    pub fn organization_count(&self) -> usize {
        self.organizations.len()
    }

    /// Fail every call to `op` from now on.
    pub fn fail(&self, op: StoreOp, failure: StoreFailure) {
        self.fail_after(op, 0, failure);
    }

    /// Let `skip` more calls to `op` succeed, then fail the rest.
    pub fn fail_after(&self, op: StoreOp, skip: usize, failure: StoreFailure) {
        self.failures.lock().insert(op, FailureRule { failure, skip });
    }

    pub fn clear_failure(&self, op: StoreOp) {
        self.failures.lock().remove(&op);
    }

    /// Delay every call to `op`.
    pub fn set_delay(&self, op: StoreOp, delay: Duration) {
        self.delays.lock().insert(op, delay);
    }

    /// Delay profile operations for one user only.
    pub fn set_user_delay(&self, user_id: UserId, delay: Duration) {
        self.user_delays.insert(user_id, delay);
    }

    /// Number of times `op` has been called, failed calls included.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls
            .get(&op)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    async fn enter(&self, op: StoreOp, user_id: Option<&UserId>) -> Result<()> {
        self.calls
            .entry(op)
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::SeqCst);

        let mut delay = self.delays.lock().get(&op).copied().unwrap_or_default();
        if let Some(user_delay) = user_id.and_then(|u| self.user_delays.get(u).map(|d| *d)) {
            delay += user_delay;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut failures = self.failures.lock();
        match failures.get_mut(&op) {
            Some(rule) if rule.skip > 0 => {
                rule.skip -= 1;
                Ok(())
            }
            Some(rule) => Err(rule.failure.to_error(op)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn select_profile(&self, user_id: &UserId) -> Result<Option<ProfileRow>> {
        self.enter(StoreOp::SelectProfile, Some(user_id)).await?;
        Ok(self.profile(user_id))
    }

    async fn insert_profile(&self, row: &ProfileRow) -> Result<()> {
        self.enter(StoreOp::InsertProfile, Some(&row.id)).await?;
        match self.profiles.entry(row.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(SessionError::Conflict(format!(
                "profile {} already exists",
                row.id
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(row.clone());
                Ok(())
            }
        }
    }

    async fn upsert_profile(&self, row: &ProfileRow) -> Result<()> {
        self.enter(StoreOp::UpsertProfile, Some(&row.id)).await?;
        self.put_profile(row.clone());
        Ok(())
    }

    async fn select_organization(&self, id: &OrganizationId) -> Result<Option<Organization>> {
        self.enter(StoreOp::SelectOrganization, None).await?;
        Ok(self.organizations.get(id).map(|o| o.clone()))
    }

    async fn find_organization_by_code(&self, code: &str) -> Result<Option<Organization>> {
        self.enter(StoreOp::FindOrganizationByCode, None).await?;
        Ok(self
            .organizations
            .iter()
            .find(|o| o.join_code.as_deref() == Some(code))
            .map(|o| o.clone()))
    }

    async fn insert_organization(&self, org: NewOrganization) -> Result<Organization> {
        self.enter(StoreOp::InsertOrganization, Some(&org.owner_id)).await?;
        let taken = self
            .organizations
            .iter()
            .any(|o| o.join_code.as_deref() == Some(org.join_code.as_str()));
        if taken {
            return Err(SessionError::Conflict(format!(
                "organization code {} already in use",
                org.join_code
            )));
        }
        let stored = org.into_organization(OrganizationId::generate());
        self.put_organization(stored.clone());
        Ok(stored)
    }
}
