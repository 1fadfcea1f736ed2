//! Hydration coordinator.
//!
//! Owns the published [`HydrationSnapshot`] and is the only thing that
//! replaces it. Each resolution run is tagged with a [`RunToken`]; results
//! from superseded runs are discarded at commit time. Every path through a
//! run ends with `loading = false` and `hydrated = true`, and organization
//! phases always end with `org_loading = false`, whatever the collaborators
//! do (errors and panics included).

mod generation;

pub use generation::RunToken;

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use futures::FutureExt;
use olio_types::{HydrationSnapshot, Identity, Organization, OrganizationId, Role};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use self::generation::Generations;
use crate::cache::{BootstrapCache, KeyValueStore};
use crate::config::HydrationConfig;
use crate::error::SessionError;
use crate::identity::{AuthEvent, AuthEventKind, IdentityProvider, IdentitySessionReader, SessionRead};
use crate::membership::MembershipResolver;
use crate::organization::OrganizationLoader;
use crate::store::TenantStore;

/// Where a resolution run gets its identity from.
#[derive(Debug, Clone)]
enum SessionSource {
    /// Ask the identity provider.
    Fetch,
    /// Use the session delivered with an auth event.
    Event(Identity),
}

/// Organization state produced by one organization phase.
#[derive(Debug, Default)]
struct OrgResolution {
    org_id: Option<OrganizationId>,
    org: Option<Organization>,
    role: Option<Role>,
    error: Option<String>,
    /// Whether the membership lookup succeeded, i.e. the result may be
    /// written to the bootstrap cache.
    persist: bool,
}

pub struct HydrationCoordinator {
    reader: IdentitySessionReader,
    membership: MembershipResolver,
    organizations: OrganizationLoader,
    cache: BootstrapCache,
    config: HydrationConfig,
    generations: Mutex<Generations>,
    snapshot: watch::Sender<Arc<HydrationSnapshot>>,
}

impl HydrationCoordinator {
    /// Build a coordinator and seed its first snapshot from the bootstrap
    /// cache. No network call is made here.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn TenantStore>,
        kv: Arc<dyn KeyValueStore>,
        config: HydrationConfig,
    ) -> Self {
        let cache = BootstrapCache::new(kv, config.cache_key.clone());
        let initial = HydrationSnapshot::from_bootstrap(&cache.read());
        info!(phase = %initial.phase, "Hydration coordinator created");

        let (snapshot, _) = watch::channel(Arc::new(initial));
        Self {
            reader: IdentitySessionReader::new(provider),
            membership: MembershipResolver::new(store.clone()),
            organizations: OrganizationLoader::new(store),
            cache,
            config,
            generations: Mutex::new(Generations::default()),
            snapshot,
        }
    }

    pub fn config(&self) -> &HydrationConfig {
        &self.config
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<HydrationSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// Receive every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<HydrationSnapshot>> {
        self.snapshot.subscribe()
    }

    /// Wait for the first snapshot satisfying `predicate`, starting with the
    /// current one.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&HydrationSnapshot) -> bool,
    ) -> Arc<HydrationSnapshot> {
        let mut rx = self.snapshot.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        // Bind before returning: the `Ref` borrows `rx`.
        let snap = match rx.wait_for(|snap| predicate(snap.as_ref())).await {
            Ok(snap) => Arc::clone(&snap),
            Err(_) => self.snapshot(),
        };
        snap
    }

    /// Wait until hydrated with nothing in flight.
    pub async fn wait_until_settled(&self) -> Arc<HydrationSnapshot> {
        self.wait_for(|snap| snap.hydrated && snap.is_settled()).await
    }

    /// Start hydrating: subscribe to auth changes, then kick off the
    /// initial resolution.
    ///
    /// The subscription is taken before the initial session read so no
    /// transition can slip between the two.
    pub fn mount(self: &Arc<Self>) -> MountHandle {
        let mut subscription = self.reader.on_change();
        let subscription_id = subscription.id();
        self.spawn_run(SessionSource::Fetch);

        let this = Arc::clone(self);
        let listener = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                this.handle_event(event);
            }
            debug!("Auth event stream closed");
        });

        debug!(subscription = subscription_id.0, "Hydration coordinator mounted");
        MountHandle {
            listener: Some(listener),
            coordinator: Arc::downgrade(self),
        }
    }

    /// Resolve the session again and wait for the run to finish.
    pub async fn refresh(&self) {
        let token = self.begin_run();
        self.run(token, SessionSource::Fetch).await;
    }

    /// Re-run membership and organization resolution for the current
    /// identity without touching the identity session.
    #[instrument(skip(self))]
    pub async fn reload_org(&self) {
        let (token, user) = {
            let mut gens = self.generations.lock();
            let token = gens.begin_reload();
            let user = self.snapshot.borrow().user.clone();
            if !gens.is_current_org(token) {
                debug!("Identity resolution in flight, skipping organization reload");
                return;
            }
            match user {
                Some(user) => {
                    self.publish(|snap| snap.org_resolving());
                    (token, user)
                }
                None => {
                    self.publish(|snap| snap.org_settled(None, None, None, None));
                    return;
                }
            }
        };
        self.resolve_organization(token, user).await;
    }

    /// Sign out through the provider and clear local state right away,
    /// without waiting for the `SIGNED_OUT` event.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) {
        let error = self.reader.sign_out().await;
        self.apply_sign_out(error);
    }

    fn handle_event(self: &Arc<Self>, event: AuthEvent) {
        info!(kind = %event.kind, user_id = ?event.session.as_ref().map(|s| s.id.as_str()), "Auth state changed");
        match (event.kind, event.session) {
            (AuthEventKind::SignedOut, _) => self.apply_sign_out(None),
            (_, Some(identity)) => self.spawn_run(SessionSource::Event(identity)),
            (_, None) => self.spawn_run(SessionSource::Fetch),
        }
    }

    /// Issue the token now, so token order follows event order, then run
    /// the resolution on its own task.
    fn spawn_run(self: &Arc<Self>, source: SessionSource) {
        let token = self.begin_run();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run(token, source).await;
        });
    }

    fn begin_run(&self) -> RunToken {
        let mut gens = self.generations.lock();
        let token = gens.begin_session();
        self.publish(|snap| snap.resolving());
        debug!(session = token.session, "Resolution started");
        token
    }

    #[instrument(skip_all, fields(session = token.session))]
    async fn run(&self, token: RunToken, source: SessionSource) {
        let read = match source {
            SessionSource::Event(identity) => SessionRead {
                identity: Some(identity),
                auth_error: None,
            },
            SessionSource::Fetch => match guarded(self.reader.current_session()).await {
                Ok(read) => read,
                Err(e) => SessionRead {
                    identity: None,
                    auth_error: Some(e.to_string()),
                },
            },
        };

        match read.identity {
            None => self.commit_signed_out(token, read.auth_error),
            Some(identity) => {
                if let Some(org_token) = self.commit_identity(token, &identity, read.auth_error) {
                    self.resolve_organization(org_token, identity).await;
                }
            }
        }
    }

    async fn resolve_organization(&self, token: RunToken, identity: Identity) {
        let resolution = match guarded(self.organization_state(&identity)).await {
            Ok(resolution) => resolution,
            Err(e) => OrgResolution {
                error: Some(e.to_string()),
                ..Default::default()
            },
        };

        let gens = self.generations.lock();
        if !gens.is_current_org(token) {
            debug!(session = token.session, org = token.org, "Discarding stale organization result");
            return;
        }
        if resolution.persist {
            self.cache
                .write(&identity, resolution.org_id.as_ref(), resolution.role);
        }
        info!(
            user_id = %identity.id,
            org_id = ?resolution.org_id.as_ref().map(|id| id.as_str()),
            role = ?resolution.role,
            org_error = ?resolution.error,
            "Organization resolved"
        );
        self.publish(|snap| {
            snap.org_settled(
                resolution.org_id,
                resolution.org,
                resolution.role,
                resolution.error,
            )
        });
    }

    /// Membership first, then organization details: the latter needs the
    /// id the former produces.
    async fn organization_state(&self, identity: &Identity) -> OrgResolution {
        let membership = self.membership.resolve(&identity.id).await;

        if let Some(error) = membership.error {
            if self.config.identity_hint_fallback {
                if let Some(org) = identity.org_hint.organization() {
                    debug!(org_id = %org.id, "Falling back to identity organization hint");
                    return OrgResolution {
                        org_id: Some(org.id.clone()),
                        org: Some(org),
                        role: None,
                        error: Some(error),
                        persist: false,
                    };
                }
            }
            return OrgResolution {
                error: Some(error),
                ..Default::default()
            };
        }

        let Some(org_id) = membership.organization_id else {
            return OrgResolution {
                role: membership.role,
                persist: true,
                ..Default::default()
            };
        };

        let detail = self.organizations.load(&org_id).await;
        OrgResolution {
            org_id: Some(org_id),
            org: detail.org,
            role: membership.role,
            error: detail.error,
            persist: true,
        }
    }

    /// Commit a found identity and open its organization phase. Returns
    /// `None` if the run was superseded.
    fn commit_identity(
        &self,
        token: RunToken,
        identity: &Identity,
        auth_error: Option<String>,
    ) -> Option<RunToken> {
        let mut gens = self.generations.lock();
        if !gens.is_current_session(token) {
            debug!(session = token.session, "Discarding stale identity result");
            return None;
        }
        let org_token = gens.commit_session(token);
        self.publish(|snap| snap.identity_resolved(identity.clone(), auth_error));
        debug!(user_id = %identity.id, "Identity committed");
        Some(org_token)
    }

    fn commit_signed_out(&self, token: RunToken, auth_error: Option<String>) {
        let mut gens = self.generations.lock();
        if !gens.is_current_session(token) {
            debug!(session = token.session, "Discarding stale signed-out result");
            return;
        }
        gens.commit_session(token);
        self.cache.clear();
        self.publish(|snap| snap.signed_out(auth_error));
        info!("No active session");
    }

    fn apply_sign_out(&self, auth_error: Option<String>) {
        let mut gens = self.generations.lock();
        let token = gens.begin_session();
        gens.commit_session(token);
        self.cache.clear();
        self.publish(|snap| snap.signed_out(auth_error));
        info!(session = token.session, "Signed out");
    }

    fn invalidate(&self) {
        self.generations.lock().invalidate();
    }

    /// Replace the snapshot. `hydrated` can only ever move to true.
    fn publish(&self, next: impl FnOnce(&HydrationSnapshot) -> HydrationSnapshot) {
        self.snapshot.send_modify(|current| {
            let mut snap = next(current);
            snap.hydrated |= current.hydrated;
            *current = Arc::new(snap);
        });
    }
}

/// Keeps the coordinator listening to auth changes.
///
/// Unmounting (explicitly or by drop) stops the listener and makes every
/// pending completion stale.
pub struct MountHandle {
    listener: Option<JoinHandle<()>>,
    coordinator: Weak<HydrationCoordinator>,
}

impl MountHandle {
    pub fn unmount(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            if let Some(coordinator) = self.coordinator.upgrade() {
                coordinator.invalidate();
            }
            debug!("Hydration coordinator unmounted");
        }
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run a collaborator future, turning a panic into an error.
async fn guarded<T>(fut: impl Future<Output = T>) -> Result<T, SessionError> {
    AssertUnwindSafe(fut).catch_unwind().await.map_err(|payload| {
        let message = panic_message(payload.as_ref());
        warn!(error = %message, "Collaborator panicked during hydration");
        SessionError::Internal(message)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "collaborator panicked".to_string()
    }
}
