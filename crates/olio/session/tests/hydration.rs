//! End-to-end hydration tests against the in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use olio_session::olio_types::{
    BootstrapRecord, HydrationPhase, HydrationSnapshot, Identity, OrgHint, Organization,
    OrganizationId, ProfileRow, Role, UserId, DEFAULT_ORG_COLOR,
};
use olio_session::{
    AuthEvent, AuthEventKind, BootstrapCache, HydrationConfig, HydrationCoordinator,
    IdentityProvider, MemoryIdentityProvider, MemoryKeyValueStore, MemoryTenantStore,
    StoreFailure, StoreOp, DEFAULT_CACHE_KEY,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct World {
    provider: Arc<MemoryIdentityProvider>,
    store: Arc<MemoryTenantStore>,
    kv: Arc<MemoryKeyValueStore>,
}

impl World {
    fn new() -> Self {
        Self {
            provider: Arc::new(MemoryIdentityProvider::new()),
            store: Arc::new(MemoryTenantStore::new()),
            kv: Arc::new(MemoryKeyValueStore::new()),
        }
    }

    fn signed_in(user: &str) -> Self {
        let world = Self::new();
        world.provider.sign_in(Identity::new(user));
        world
    }

    fn with_member(self, user: &str, org: &str, role: Role) -> Self {
        self.store.put_profile(ProfileRow {
            id: UserId::new(user),
            org_id: Some(OrganizationId::new(org)),
            role,
        });
        self
    }

    fn with_org(self, id: &str, name: &str) -> Self {
        self.store.put_organization(acme(id, name));
        self
    }

    fn cache(&self) -> BootstrapCache {
        BootstrapCache::new(self.kv.clone(), DEFAULT_CACHE_KEY)
    }

    fn coordinator(&self) -> Arc<HydrationCoordinator> {
        self.coordinator_with(HydrationConfig::default())
    }

    fn coordinator_with(&self, config: HydrationConfig) -> Arc<HydrationCoordinator> {
        Arc::new(HydrationCoordinator::new(
            self.provider.clone(),
            self.store.clone(),
            self.kv.clone(),
            config,
        ))
    }
}

fn acme(id: &str, name: &str) -> Organization {
    Organization {
        id: OrganizationId::new(id),
        name: name.to_string(),
        icon_color: DEFAULT_ORG_COLOR.to_string(),
        join_code: Some("1234".to_string()),
        owner_id: Some(UserId::new("u-owner")),
    }
}

fn user_is(snap: &HydrationSnapshot, id: &str) -> bool {
    snap.user.as_ref().map(|u| u.id.as_str()) == Some(id)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cold_start_without_session() {
    let world = World::new();
    let coordinator = world.coordinator();
    assert_eq!(coordinator.snapshot().phase, HydrationPhase::Cold);
    assert!(!coordinator.snapshot().hydrated);

    let _mounted = coordinator.mount();
    let snap = coordinator.wait_until_settled().await;

    assert!(snap.hydrated);
    assert!(!snap.loading);
    assert!(!snap.org_loading);
    assert!(snap.user.is_none());
    assert!(snap.org_id.is_none());
    assert!(snap.org.is_none());
    assert!(snap.role.is_none());
    assert_eq!(snap.phase, HydrationPhase::Settled);
    assert_eq!(world.store.calls(StoreOp::SelectProfile), 0);
}

#[tokio::test]
async fn test_signed_in_member_resolves_organization() {
    let world = World::signed_in("u-1")
        .with_member("u-1", "org-1", Role::Member)
        .with_org("org-1", "Acme");
    let coordinator = world.coordinator();

    let _mounted = coordinator.mount();
    let snap = coordinator
        .wait_for(|s| s.is_settled() && s.org.is_some())
        .await;

    assert!(user_is(&snap, "u-1"));
    assert_eq!(snap.org_id, Some(OrganizationId::new("org-1")));
    assert_eq!(snap.org.as_ref().unwrap().name, "Acme");
    assert_eq!(snap.role, Some(Role::Member));
    assert!(snap.org_error.is_none());
    assert!(snap.hydrated);
}

#[tokio::test]
async fn test_missing_profile_with_denied_creation_fails_closed() {
    let world = World::signed_in("u-1");
    world.store.fail(
        StoreOp::InsertProfile,
        StoreFailure::PermissionDenied("row-level security".into()),
    );
    // The ensure step's read succeeds, the primary read does not.
    world.store.fail_after(
        StoreOp::SelectProfile,
        1,
        StoreFailure::PermissionDenied("row-level security".into()),
    );

    let coordinator = world.coordinator();
    coordinator.refresh().await;
    let snap = coordinator.snapshot();

    assert!(snap.hydrated);
    assert!(!snap.loading);
    assert!(!snap.org_loading);
    assert!(user_is(&snap, "u-1"));
    assert!(snap.org_id.is_none());
    assert!(snap.role.is_none());
    let error = snap.org_error.as_deref().unwrap();
    assert!(error.contains("permission denied"), "{error}");
    assert_eq!(world.store.calls(StoreOp::InsertProfile), 1);
}

#[tokio::test]
async fn test_first_login_creates_default_profile() {
    let world = World::signed_in("u-new");
    let coordinator = world.coordinator();
    coordinator.refresh().await;

    let snap = coordinator.snapshot();
    assert!(snap.org_id.is_none());
    assert_eq!(snap.role, Some(Role::Member));
    assert!(snap.org_error.is_none());
    assert!(world.store.profile(&UserId::new("u-new")).is_some());
}

#[tokio::test]
async fn test_organization_detail_failure_keeps_id() {
    let world = World::signed_in("u-1").with_member("u-1", "org-gone", Role::Admin);
    let coordinator = world.coordinator();
    coordinator.refresh().await;

    let snap = coordinator.snapshot();
    assert_eq!(snap.org_id, Some(OrganizationId::new("org-gone")));
    assert!(snap.org.is_none());
    assert_eq!(snap.role, Some(Role::Admin));
    assert_eq!(
        snap.org_error.as_deref(),
        Some("organization not found: org-gone")
    );
}

#[tokio::test]
async fn test_identity_error_is_reported_as_signed_out() {
    let world = World::signed_in("u-1");
    world.provider.set_session_failure(Some("token expired"));
    let coordinator = world.coordinator();
    coordinator.refresh().await;

    let snap = coordinator.snapshot();
    assert!(snap.user.is_none());
    assert!(snap.hydrated);
    assert!(snap.is_settled());
    assert!(snap.auth_error.as_deref().unwrap().contains("token expired"));
}

// ---------------------------------------------------------------------------
// Bootstrap cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_warm_start_from_cache() {
    let world = World::signed_in("u-1")
        .with_member("u-1", "org-1", Role::Owner)
        .with_org("org-1", "Acme");
    world
        .cache()
        .try_write(&BootstrapRecord::new(
            Identity::new("u-1"),
            Some(OrganizationId::new("org-1")),
            Some(Role::Owner),
        ))
        .unwrap();

    let coordinator = world.coordinator();
    let first = coordinator.snapshot();
    assert_eq!(first.phase, HydrationPhase::WarmOptimistic);
    assert!(first.hydrated);
    assert!(!first.loading);
    assert!(first.org_loading);
    assert_eq!(first.org_id, Some(OrganizationId::new("org-1")));
    assert_eq!(first.role, Some(Role::Owner));

    coordinator.refresh().await;
    let settled = coordinator.snapshot();
    assert_eq!(settled.phase, HydrationPhase::Settled);
    assert_eq!(settled.org.as_ref().unwrap().name, "Acme");
}

#[tokio::test]
async fn test_cache_without_org_id_starts_cold() {
    let world = World::new();
    world
        .cache()
        .try_write(&BootstrapRecord::new(Identity::new("u-1"), None, None))
        .unwrap();

    let coordinator = world.coordinator();
    assert_eq!(coordinator.snapshot().phase, HydrationPhase::Cold);
    assert!(!coordinator.snapshot().hydrated);
}

#[tokio::test]
async fn test_settled_membership_is_cached_and_cleared_on_sign_out() {
    let world = World::signed_in("u-1")
        .with_member("u-1", "org-1", Role::Member)
        .with_org("org-1", "Acme");
    let coordinator = world.coordinator();
    coordinator.refresh().await;

    let record = world.cache().try_read().unwrap();
    assert!(record.is_warm());
    assert_eq!(record.org_id, Some(OrganizationId::new("org-1")));

    coordinator.sign_out().await;
    assert!(world.cache().try_read().unwrap().is_empty());
    assert!(world.provider.current().is_none());
}

#[tokio::test]
async fn test_unwritable_cache_does_not_block_hydration() {
    let world = World::signed_in("u-1")
        .with_member("u-1", "org-1", Role::Member)
        .with_org("org-1", "Acme");
    world.kv.set_failure(Some("quota exceeded"));

    let coordinator = world.coordinator();
    coordinator.refresh().await;
    let snap = coordinator.snapshot();
    assert!(snap.is_settled());
    assert_eq!(snap.org.as_ref().unwrap().name, "Acme");
}

#[tokio::test]
async fn test_failed_membership_is_not_cached() {
    let world = World::signed_in("u-1");
    world
        .store
        .fail(StoreOp::SelectProfile, StoreFailure::Network("offline".into()));
    let coordinator = world.coordinator();
    coordinator.refresh().await;

    assert!(coordinator.snapshot().org_error.is_some());
    assert!(world.cache().try_read().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Auth events and sign-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sign_in_event_triggers_resolution() {
    let world = World::new()
        .with_member("u-1", "org-1", Role::Member)
        .with_org("org-1", "Acme");
    let coordinator = world.coordinator();
    let _mounted = coordinator.mount();
    coordinator.wait_until_settled().await;

    world.provider.sign_in(Identity::new("u-1"));
    let snap = coordinator
        .wait_for(|s| user_is(s, "u-1") && s.is_settled())
        .await;
    assert_eq!(snap.org.as_ref().unwrap().name, "Acme");
}

#[tokio::test]
async fn test_token_refresh_reresolves() {
    let world = World::signed_in("u-1").with_member("u-1", "org-1", Role::Member);
    let coordinator = world.coordinator();
    let _mounted = coordinator.mount();
    coordinator.wait_for(|s| s.is_signed_in() && s.is_settled()).await;
    assert!(coordinator.snapshot().org.is_none());

    world.store.put_organization(acme("org-1", "Acme"));
    world.provider.refresh_token();
    let snap = coordinator.wait_for(|s| s.org.is_some()).await;
    assert_eq!(snap.org.as_ref().unwrap().name, "Acme");
}

#[tokio::test]
async fn test_hydrated_never_reverts() {
    let world = World::signed_in("u-1")
        .with_member("u-1", "org-1", Role::Member)
        .with_org("org-1", "Acme");
    let coordinator = world.coordinator();
    let _mounted = coordinator.mount();
    coordinator.wait_for(|s| s.is_signed_in() && s.is_settled()).await;

    let mut rx = coordinator.subscribe();
    let watcher = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snap = rx.borrow_and_update().clone();
            assert!(snap.hydrated, "hydrated reverted: {snap:?}");
            if snap.is_signed_in() && snap.org.is_some() && snap.is_settled() {
                break;
            }
        }
    });

    world.provider.sign_out().await.unwrap();
    coordinator.wait_for(|s| !s.is_signed_in()).await;
    let signed_out = coordinator.snapshot();
    assert!(signed_out.hydrated);
    assert!(!signed_out.org_loading);
    assert!(signed_out.org_id.is_none());

    world.provider.sign_in(Identity::new("u-1"));
    watcher.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_rapid_sign_in_out_in_keeps_last_resolution() {
    let world = World::new()
        .with_member("u-slow", "org-slow", Role::Owner)
        .with_org("org-slow", "Slow Corp")
        .with_member("u-fast", "org-1", Role::Member)
        .with_org("org-1", "Acme");
    world
        .store
        .set_user_delay(UserId::new("u-slow"), Duration::from_millis(500));

    let coordinator = world.coordinator();
    let _mounted = coordinator.mount();
    coordinator.wait_until_settled().await;

    // Wait until the slow user's organization phase is in flight.
    world.provider.sign_in(Identity::new("u-slow"));
    coordinator.wait_for(|s| user_is(s, "u-slow")).await;
    world.provider.sign_out().await.unwrap();
    world.provider.sign_in(Identity::new("u-fast"));

    let snap = coordinator
        .wait_for(|s| user_is(s, "u-fast") && s.is_settled())
        .await;
    assert_eq!(snap.org_id, Some(OrganizationId::new("org-1")));

    // Let the slow run finish; it must not overwrite anything.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let last = coordinator.snapshot();
    assert_eq!(last, snap);
    assert_eq!(
        world.cache().try_read().unwrap().org_id,
        Some(OrganizationId::new("org-1"))
    );
}

#[tokio::test(start_paused = true)]
async fn test_rerun_from_settled_is_not_settled_until_done() {
    let world = World::signed_in("u-1")
        .with_member("u-1", "org-1", Role::Member)
        .with_org("org-1", "Acme");
    let coordinator = world.coordinator();
    let _mounted = coordinator.mount();
    coordinator.wait_for(|s| s.is_signed_in() && s.is_settled()).await;

    world.provider.set_session_delay(Some(Duration::from_secs(1)));
    let started = tokio::time::Instant::now();
    world
        .provider
        .emit(AuthEvent::new(AuthEventKind::TokenRefreshed, None));

    let rerun = coordinator
        .wait_for(|s| s.phase == HydrationPhase::Resolving)
        .await;
    assert!(!rerun.loading);
    assert!(!rerun.org_loading);
    assert!(!rerun.is_settled());

    let settled = coordinator.wait_until_settled().await;
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(settled.phase, HydrationPhase::Settled);
    assert!(user_is(&settled, "u-1"));
    assert_eq!(settled.org.as_ref().unwrap().name, "Acme");
}

#[tokio::test(start_paused = true)]
async fn test_hung_organization_lookup_still_commits_identity() {
    let world = World::signed_in("u-1")
        .with_member("u-1", "org-1", Role::Member)
        .with_org("org-1", "Acme");
    world
        .store
        .set_delay(StoreOp::SelectOrganization, Duration::from_secs(6 * 3600));
    let coordinator = world.coordinator();
    let _mounted = coordinator.mount();

    tokio::time::sleep(Duration::from_secs(5)).await;
    let snap = coordinator.snapshot();
    assert!(!snap.loading);
    assert!(snap.hydrated);
    assert!(snap.org_loading);
    assert!(!snap.is_settled());
    assert!(user_is(&snap, "u-1"));
    assert_eq!(world.store.calls(StoreOp::SelectOrganization), 1);
}

// ---------------------------------------------------------------------------
// Organization reload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reload_org_is_idempotent() {
    let world = World::signed_in("u-1")
        .with_member("u-1", "org-1", Role::Member)
        .with_org("org-1", "Acme");
    let coordinator = world.coordinator();
    coordinator.refresh().await;

    coordinator.reload_org().await;
    let first = coordinator.snapshot();
    coordinator.reload_org().await;
    assert_eq!(coordinator.snapshot(), first);
    assert_eq!(first.org.as_ref().unwrap().name, "Acme");
}

#[tokio::test]
async fn test_reload_org_picks_up_membership_change() {
    let world = World::signed_in("u-1").with_org("org-1", "Acme");
    let coordinator = world.coordinator();
    coordinator.refresh().await;
    assert!(coordinator.snapshot().org_id.is_none());

    world.store.put_profile(ProfileRow {
        id: UserId::new("u-1"),
        org_id: Some(OrganizationId::new("org-1")),
        role: Role::Admin,
    });
    coordinator.reload_org().await;

    let snap = coordinator.snapshot();
    assert_eq!(snap.org_id, Some(OrganizationId::new("org-1")));
    assert_eq!(snap.role, Some(Role::Admin));
    assert_eq!(world.provider.current().unwrap().id.as_str(), "u-1");
}

#[tokio::test]
async fn test_reload_org_without_user_settles_empty() {
    let world = World::new();
    let coordinator = world.coordinator();
    coordinator.refresh().await;
    coordinator.reload_org().await;

    let snap = coordinator.snapshot();
    assert!(snap.is_settled());
    assert!(snap.org_id.is_none());
    assert_eq!(world.store.calls(StoreOp::SelectProfile), 0);
}

// ---------------------------------------------------------------------------
// Identity hint fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_hint_fallback_is_opt_in() {
    let hinted = Identity::new("u-1").with_org_hint(OrgHint::for_organization(&acme("org-1", "Acme")));
    let world = World::new();
    world.provider.sign_in(hinted);
    world
        .store
        .fail(StoreOp::SelectProfile, StoreFailure::Network("offline".into()));

    let strict = world.coordinator();
    strict.refresh().await;
    assert!(strict.snapshot().org_id.is_none());

    let lenient = world.coordinator_with(HydrationConfig {
        identity_hint_fallback: true,
        ..Default::default()
    });
    lenient.refresh().await;
    let snap = lenient.snapshot();
    assert_eq!(snap.org_id, Some(OrganizationId::new("org-1")));
    assert_eq!(snap.org.as_ref().unwrap().name, "Acme");
    assert!(snap.role.is_none());
    assert!(snap.org_error.is_some());
}
