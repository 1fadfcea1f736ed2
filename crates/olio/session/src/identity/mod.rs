//! Identity collaborator: the external provider, its change notifications
//! and the session reader used by the coordinator.

mod channel;
mod memory;
mod reader;

pub use channel::{AuthEventChannel, AuthSubscription, SubscriptionId};
pub use memory::MemoryIdentityProvider;
pub use reader::{IdentitySessionReader, SessionRead};

use async_trait::async_trait;
use olio_types::{Identity, OrgHint};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Session transitions announced by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl fmt::Display for AuthEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthEventKind::SignedIn => write!(f, "SIGNED_IN"),
            AuthEventKind::SignedOut => write!(f, "SIGNED_OUT"),
            AuthEventKind::TokenRefreshed => write!(f, "TOKEN_REFRESHED"),
            AuthEventKind::UserUpdated => write!(f, "USER_UPDATED"),
        }
    }
}

/// A session transition together with the session it produced, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    #[serde(default)]
    pub session: Option<Identity>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, session: Option<Identity>) -> Self {
        Self { kind, session }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self::new(AuthEventKind::SignedIn, Some(identity))
    }

    pub fn signed_out() -> Self {
        Self::new(AuthEventKind::SignedOut, None)
    }
}

/// The external identity provider. Verifying credentials and issuing tokens
/// happens on the other side of this trait.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The currently active session, if any.
    async fn get_session(&self) -> Result<Option<Identity>>;

    /// Subscribe to session transitions.
    fn subscribe(&self) -> AuthSubscription;

    /// End the current session.
    async fn sign_out(&self) -> Result<()>;

    /// Store organization details in the signed-in user's metadata.
    async fn update_org_hint(&self, hint: OrgHint) -> Result<Identity>;
}
