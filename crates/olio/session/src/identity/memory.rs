//! In-memory identity provider for development and testing.

use std::time::Duration;

use async_trait::async_trait;
use olio_types::{Identity, OrgHint};
use parking_lot::RwLock;
use tracing::debug;

use super::{AuthEvent, AuthEventChannel, AuthEventKind, AuthSubscription, IdentityProvider};
use crate::error::{Result, SessionError};

/// Identity provider holding a single session in memory.
///
/// Session lookups can be delayed or made to fail so the coordinator's
/// behavior under slow or broken transports can be exercised.
pub struct MemoryIdentityProvider {
    session: RwLock<Option<Identity>>,
    channel: AuthEventChannel,
    session_failure: RwLock<Option<String>>,
    session_delay: RwLock<Option<Duration>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(event_capacity: usize) -> Self {
        Self {
            session: RwLock::new(None),
            channel: AuthEventChannel::new(event_capacity),
            session_failure: RwLock::new(None),
            session_delay: RwLock::new(None),
        }
    }

    /// Start with `identity` already signed in, without emitting an event.
    pub fn with_session(self, identity: Identity) -> Self {
        *self.session.write() = Some(identity);
        self
    }

    /// Make `get_session` fail with a transport error.
    pub fn set_session_failure(&self, reason: Option<&str>) {
        *self.session_failure.write() = reason.map(str::to_string);
    }

    /// Delay every `get_session` answer.
    pub fn set_session_delay(&self, delay: Option<Duration>) {
        *self.session_delay.write() = delay;
    }

    pub fn current(&self) -> Option<Identity> {
        self.session.read().clone()
    }

    /// Sign `identity` in and announce it.
    pub fn sign_in(&self, identity: Identity) {
        *self.session.write() = Some(identity.clone());
        self.channel.publish(AuthEvent::signed_in(identity));
    }

    /// Announce a token refresh for the current session.
    pub fn refresh_token(&self) {
        let session = self.current();
        self.channel
            .publish(AuthEvent::new(AuthEventKind::TokenRefreshed, session));
    }

    /// Publish an arbitrary event without touching the stored session.
    pub fn emit(&self, event: AuthEvent) -> usize {
        self.channel.publish(event)
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.subscriber_count()
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn get_session(&self) -> Result<Option<Identity>> {
        let delay = *self.session_delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = self.session_failure.read().clone() {
            return Err(SessionError::Identity(reason));
        }
        Ok(self.current())
    }

    fn subscribe(&self) -> AuthSubscription {
        self.channel.subscribe()
    }

    async fn sign_out(&self) -> Result<()> {
        let previous = self.session.write().take();
        debug!(had_session = previous.is_some(), "Memory provider sign-out");
        self.channel.publish(AuthEvent::signed_out());
        Ok(())
    }

    async fn update_org_hint(&self, hint: OrgHint) -> Result<Identity> {
        let updated = {
            let mut session = self.session.write();
            let identity = session.as_mut().ok_or(SessionError::NotSignedIn)?;
            identity.org_hint = hint;
            identity.clone()
        };
        self.channel.publish(AuthEvent::new(
            AuthEventKind::UserUpdated,
            Some(updated.clone()),
        ));
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_publishes_and_stores() {
        let provider = MemoryIdentityProvider::new();
        let mut sub = provider.subscribe();

        provider.sign_in(Identity::new("u-1"));
        let event = sub.recv().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedIn);
        assert_eq!(provider.get_session().await.unwrap().unwrap().id.as_str(), "u-1");
    }

    #[tokio::test]
    async fn test_sign_out_clears_session() {
        let provider = MemoryIdentityProvider::new().with_session(Identity::new("u-1"));
        let mut sub = provider.subscribe();

        provider.sign_out().await.unwrap();
        assert_eq!(sub.recv().await.unwrap().kind, AuthEventKind::SignedOut);
        assert!(provider.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_failure() {
        let provider = MemoryIdentityProvider::new().with_session(Identity::new("u-1"));
        provider.set_session_failure(Some("connection reset"));
        let err = provider.get_session().await.unwrap_err();
        assert!(matches!(err, SessionError::Identity(_)));
    }

    #[tokio::test]
    async fn test_update_org_hint_requires_session() {
        let provider = MemoryIdentityProvider::new();
        let err = provider.update_org_hint(OrgHint::default()).await.unwrap_err();
        assert!(matches!(err, SessionError::NotSignedIn));
    }
}
