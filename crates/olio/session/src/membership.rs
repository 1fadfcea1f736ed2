//! Membership resolver: which organization a user belongs to, and as what.

use std::sync::Arc;

use olio_types::{OrganizationId, ProfileRow, Role, UserId};
use tracing::{debug, info, instrument, warn};

use crate::error::SessionError;
use crate::store::TenantStore;

/// Result of resolving a user's membership.
///
/// On failure both `organization_id` and `role` are `None` and `error`
/// carries the message: the resolver fails closed to "no organization".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipOutcome {
    pub organization_id: Option<OrganizationId>,
    pub role: Option<Role>,
    pub error: Option<String>,
}

impl MembershipOutcome {
    fn failed(error: &SessionError) -> Self {
        Self {
            organization_id: None,
            role: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Clone)]
pub struct MembershipResolver {
    store: Arc<dyn TenantStore>,
}

impl MembershipResolver {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self { store }
    }

    /// Resolve `{organization_id, role}` for `user_id`.
    ///
    /// Makes sure a profile exists first (best-effort), then performs the
    /// primary read. No retries.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn resolve(&self, user_id: &UserId) -> MembershipOutcome {
        self.ensure_profile(user_id).await;

        match self.store.select_profile(user_id).await {
            Ok(Some(row)) => {
                debug!(org_id = ?row.org_id, role = %row.role, "Membership resolved");
                MembershipOutcome {
                    organization_id: row.org_id,
                    role: Some(row.role),
                    error: None,
                }
            }
            Ok(None) => {
                let err = SessionError::NotFound {
                    entity: "profile",
                    id: user_id.to_string(),
                };
                warn!(error = %err, "Membership record missing after ensure step");
                MembershipOutcome::failed(&err)
            }
            Err(e) => {
                warn!(error = %e, "Membership lookup failed");
                MembershipOutcome::failed(&e)
            }
        }
    }

    /// Create the default profile if the user has none. Never fails; a read
    /// error skips creation entirely.
    async fn ensure_profile(&self, user_id: &UserId) {
        match self.store.select_profile(user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let row = ProfileRow::default_for(user_id.clone());
                match self.store.insert_profile(&row).await {
                    Ok(()) => info!(user_id = %user_id, "Created default profile"),
                    Err(e) => warn!(user_id = %user_id, error = %e, "Default profile creation failed"),
                }
            }
            Err(e) => {
                debug!(user_id = %user_id, error = %e, "Profile pre-read failed, skipping ensure step");
            }
        }
    }
}
