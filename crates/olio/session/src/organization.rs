//! Organization detail loader.

use std::sync::Arc;

use olio_types::{Organization, OrganizationId};
use tracing::{debug, instrument, warn};

use crate::error::SessionError;
use crate::store::TenantStore;

/// Result of loading an organization's details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationOutcome {
    pub org: Option<Organization>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct OrganizationLoader {
    store: Arc<dyn TenantStore>,
}

impl OrganizationLoader {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self { store }
    }

    /// Fetch `id`. A missing row or a failed read yields no organization and
    /// an error; the caller decides what to do with the id.
    #[instrument(skip(self), fields(org_id = %id))]
    pub async fn load(&self, id: &OrganizationId) -> OrganizationOutcome {
        match self.store.select_organization(id).await {
            Ok(Some(org)) => {
                debug!(name = %org.name, "Organization loaded");
                OrganizationOutcome {
                    org: Some(org),
                    error: None,
                }
            }
            Ok(None) => {
                let err = SessionError::NotFound {
                    entity: "organization",
                    id: id.to_string(),
                };
                warn!(error = %err, "Organization missing");
                OrganizationOutcome {
                    org: None,
                    error: Some(err.to_string()),
                }
            }
            Err(e) => {
                warn!(error = %e, "Organization lookup failed");
                OrganizationOutcome {
                    org: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
