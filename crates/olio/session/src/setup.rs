//! Organization setup: join an organization by code, or create one.
//!
//! Unlike hydration these are explicit user actions, so failures are
//! returned to the caller. On success the membership is persisted, the
//! organization is mirrored into the identity's metadata and the
//! coordinator reloads the organization.

use std::sync::Arc;

use olio_types::{
    is_palette_color, is_valid_join_code, Identity, NewOrganization, OrgHint, Organization,
    ProfileRow, Role,
};
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::coordinator::HydrationCoordinator;
use crate::error::{Result, SessionError};
use crate::identity::IdentityProvider;
use crate::store::TenantStore;

pub const MIN_ORG_NAME_LEN: usize = 2;

type CodeSource = Box<dyn Fn() -> String + Send + Sync>;

pub struct OrganizationSetup {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn TenantStore>,
    coordinator: Arc<HydrationCoordinator>,
    code_source: CodeSource,
}

impl OrganizationSetup {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn TenantStore>,
        coordinator: Arc<HydrationCoordinator>,
    ) -> Self {
        Self {
            provider,
            store,
            coordinator,
            code_source: Box::new(draw_join_code),
        }
    }

    /// Replace the random join code generator.
    pub fn with_code_source(mut self, source: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.code_source = Box::new(source);
        self
    }

    /// Join the organization using `code` as a member.
    #[instrument(skip(self))]
    pub async fn join(&self, code: &str) -> Result<Organization> {
        let user = self.current_user()?;
        let code = code.trim();
        if !is_valid_join_code(code) {
            return Err(SessionError::InvalidJoinCode);
        }

        let org = self
            .store
            .find_organization_by_code(code)
            .await?
            .ok_or(SessionError::InvalidJoinCode)?;

        self.persist_membership(&user, &org, Role::Member).await?;
        info!(user_id = %user.id, org_id = %org.id, "Joined organization");
        Ok(org)
    }

    /// Create an organization owned by the current user.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str, icon_color: &str) -> Result<Organization> {
        let user = self.current_user()?;
        let name = name.trim();
        if name.chars().count() < MIN_ORG_NAME_LEN {
            return Err(SessionError::InvalidOrganizationName {
                min: MIN_ORG_NAME_LEN,
            });
        }
        if !is_palette_color(icon_color) {
            return Err(SessionError::InvalidColor(icon_color.to_string()));
        }

        let join_code = self.unique_join_code().await?;
        let org = self
            .store
            .insert_organization(NewOrganization {
                name: name.to_string(),
                icon_color: icon_color.to_string(),
                join_code,
                owner_id: user.id.clone(),
            })
            .await?;

        self.persist_membership(&user, &org, Role::Owner).await?;
        info!(user_id = %user.id, org_id = %org.id, "Created organization");
        Ok(org)
    }

    async fn unique_join_code(&self) -> Result<String> {
        let attempts = self.coordinator.config().join_code_attempts;
        for attempt in 1..=attempts {
            let code = (self.code_source)();
            if self.store.find_organization_by_code(&code).await?.is_none() {
                return Ok(code);
            }
            debug!(attempt, "Join code already taken");
        }
        Err(SessionError::JoinCodeExhausted { attempts })
    }

    async fn persist_membership(&self, user: &Identity, org: &Organization, role: Role) -> Result<()> {
        self.store
            .upsert_profile(&ProfileRow {
                id: user.id.clone(),
                org_id: Some(org.id.clone()),
                role,
            })
            .await?;

        // The profile row is authoritative; the hint is a convenience copy.
        if let Err(e) = self.provider.update_org_hint(OrgHint::for_organization(org)).await {
            warn!(user_id = %user.id, error = %e, "Failed to mirror organization into identity metadata");
        }

        self.coordinator.reload_org().await;
        Ok(())
    }

    fn current_user(&self) -> Result<Identity> {
        self.coordinator
            .snapshot()
            .user
            .clone()
            .ok_or(SessionError::NotSignedIn)
    }
}

/// A random four-digit code in `1000..=9999`.
fn draw_join_code() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}
