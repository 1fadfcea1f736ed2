//! Identity session reader.

use std::sync::Arc;

use olio_types::Identity;
use tracing::{debug, instrument, warn};

use super::{AuthSubscription, IdentityProvider};

/// Outcome of asking the provider for the current session.
///
/// Never an error: a failed lookup is reported as "no identity" with the
/// failure recorded in `auth_error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRead {
    pub identity: Option<Identity>,
    pub auth_error: Option<String>,
}

#[derive(Clone)]
pub struct IdentitySessionReader {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentitySessionReader {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    #[instrument(skip(self))]
    pub async fn current_session(&self) -> SessionRead {
        match self.provider.get_session().await {
            Ok(identity) => {
                debug!(user_id = ?identity.as_ref().map(|i| i.id.as_str()), "Session read");
                SessionRead {
                    identity,
                    auth_error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Session read failed, treating as signed out");
                SessionRead {
                    identity: None,
                    auth_error: Some(e.to_string()),
                }
            }
        }
    }

    /// Subscribe to session transitions; drop the token to unsubscribe.
    pub fn on_change(&self) -> AuthSubscription {
        self.provider.subscribe()
    }

    /// Ask the provider to end the session. Returns the failure message, if
    /// any, instead of an error.
    pub async fn sign_out(&self) -> Option<String> {
        match self.provider.sign_out().await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Provider sign-out failed");
                Some(e.to_string())
            }
        }
    }
}
