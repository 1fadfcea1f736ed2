//! JSON world fixtures for `olio hydrate`.
//!
//! A fixture describes what the identity provider and the tenant store
//! contain before the coordinator mounts:
//!
//! ```json
//! {
//!   "session": { "id": "u-1", "email": "ada@example.com" },
//!   "profiles": [{ "id": "u-1", "org_id": "org-1", "role": "member" }],
//!   "organizations": [{ "id": "org-1", "name": "Acme", "icon_color": "#6366f1", "code": "1234" }],
//!   "failures": [{ "op": "insert_profile", "kind": "permission_denied", "reason": "rls" }],
//!   "delays_ms": { "select_profile": 50 }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use olio_session::{MemoryIdentityProvider, MemoryTenantStore, StoreFailure, StoreOp};
use olio_types::{Identity, Organization, ProfileRow, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldFixture {
    pub session: Option<Identity>,
    pub profiles: Vec<ProfileRow>,
    pub organizations: Vec<Organization>,
    pub failures: Vec<FailureFixture>,
    pub delays_ms: HashMap<StoreOp, u64>,
}

/// A store failure, optionally after some successful calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureFixture {
    pub op: StoreOp,
    pub kind: FailureKind,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub skip: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    PermissionDenied,
    Network,
}

impl FailureFixture {
    pub fn failure(&self) -> StoreFailure {
        match self.kind {
            FailureKind::PermissionDenied => StoreFailure::PermissionDenied(self.reason.clone()),
            FailureKind::Network => StoreFailure::Network(self.reason.clone()),
        }
    }
}

impl WorldFixture {
    pub fn load(path: &Path) -> CliResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|source| CliError::Fixture {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn identity_provider(&self, event_capacity: usize) -> MemoryIdentityProvider {
        let provider = MemoryIdentityProvider::with_capacity(event_capacity);
        match &self.session {
            Some(identity) => provider.with_session(identity.clone()),
            None => provider,
        }
    }

    pub fn tenant_store(&self) -> MemoryTenantStore {
        let store =
            MemoryTenantStore::from_rows(self.profiles.clone(), self.organizations.clone());
        for f in &self.failures {
            store.fail_after(f.op, f.skip, f.failure());
        }
        for (op, ms) in &self.delays_ms {
            store.set_delay(*op, Duration::from_millis(*ms));
        }
        store
    }
}

/// A step replayed against a mounted coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayEvent {
    SignIn(UserId),
    SignOut,
    Refresh,
    Reload,
}

impl FromStr for ReplayEvent {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sign-out" => Ok(ReplayEvent::SignOut),
            "refresh" => Ok(ReplayEvent::Refresh),
            "reload" => Ok(ReplayEvent::Reload),
            other => match other.strip_prefix("sign-in:") {
                Some(user) if !user.trim().is_empty() => {
                    Ok(ReplayEvent::SignIn(UserId::new(user.trim())))
                }
                _ => Err(CliError::InvalidEvent(other.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use olio_types::{OrganizationId, Role};

    const WORLD: &str = r##"{
        "session": { "id": "u-1" },
        "profiles": [{ "id": "u-1", "org_id": "org-1", "role": "admin" }],
        "organizations": [{ "id": "org-1", "name": "Acme", "icon_color": "#6366f1", "code": "1234" }],
        "failures": [{ "op": "select_organization", "kind": "network", "reason": "offline", "skip": 1 }],
        "delays_ms": { "select_profile": 5 }
    }"##;

    #[test]
    fn test_parse_world() {
        let world: WorldFixture = serde_json::from_str(WORLD).unwrap();
        assert_eq!(world.session.as_ref().unwrap().id.as_str(), "u-1");
        assert_eq!(world.profiles[0].role, Role::Admin);
        assert_eq!(world.organizations[0].join_code.as_deref(), Some("1234"));
        assert_eq!(world.failures[0].op, StoreOp::SelectOrganization);
        assert_eq!(world.failures[0].failure(), StoreFailure::Network("offline".into()));
        assert_eq!(world.failures[0].skip, 1);
        assert_eq!(world.delays_ms[&StoreOp::SelectProfile], 5);
    }

    #[test]
    fn test_empty_world() {
        let world: WorldFixture = serde_json::from_str("{}").unwrap();
        assert!(world.session.is_none());
        assert!(world.identity_provider(8).current().is_none());
        assert_eq!(world.tenant_store().organization_count(), 0);
    }

    #[test]
    fn test_store_is_seeded() {
        let world: WorldFixture = serde_json::from_str(WORLD).unwrap();
        let store = world.tenant_store();
        assert_eq!(store.organization_count(), 1);
        assert_eq!(
            store.profile(&UserId::new("u-1")).unwrap().org_id,
            Some(OrganizationId::new("org-1"))
        );
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = WorldFixture::load(&path).unwrap_err();
        assert!(matches!(err, CliError::Fixture { .. }));
        assert!(err.to_string().contains("world.json"));
    }

    #[test]
    fn test_parse_replay_events() {
        assert_eq!(
            "sign-in:u-2".parse::<ReplayEvent>().unwrap(),
            ReplayEvent::SignIn(UserId::new("u-2"))
        );
        assert_eq!("sign-out".parse::<ReplayEvent>().unwrap(), ReplayEvent::SignOut);
        assert_eq!(" reload ".parse::<ReplayEvent>().unwrap(), ReplayEvent::Reload);
        assert!("sign-in:".parse::<ReplayEvent>().is_err());
        assert!("logout".parse::<ReplayEvent>().is_err());
    }
}
