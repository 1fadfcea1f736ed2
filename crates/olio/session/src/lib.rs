//! # Olio Session - Session and Organization Hydration
//!
//! This crate turns an identity session plus a tenant store into a single
//! published [`HydrationSnapshot`] describing who is signed in, which
//! organization they belong to and what role they hold.
//!
//! ## Overview
//!
//! - **Bootstrap cache**: the last known identity, organization id and role,
//!   read synchronously so the first snapshot can be warm
//! - **Identity**: reads the current session and subscribes to auth events
//! - **Membership**: ensures a profile row exists, then reads organization
//!   id and role from it
//! - **Organization details**: loads the organization record by id
//! - **Coordinator**: sequences all of the above, discards stale results and
//!   guarantees every run ends hydrated with nothing in flight
//! - **Setup**: join an organization by code or create a new one
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use olio_session::{
//!     HydrationConfig, HydrationCoordinator, MemoryIdentityProvider,
//!     MemoryKeyValueStore, MemoryTenantStore,
//! };
//!
//! # async fn example() {
//! let coordinator = Arc::new(HydrationCoordinator::new(
//!     Arc::new(MemoryIdentityProvider::new()),
//!     Arc::new(MemoryTenantStore::new()),
//!     Arc::new(MemoryKeyValueStore::new()),
//!     HydrationConfig::default(),
//! ));
//!
//! let _mounted = coordinator.mount();
//! let snapshot = coordinator.wait_until_settled().await;
//! println!("signed in: {}", snapshot.is_signed_in());
//! # }
//! ```
//!
//! [`HydrationSnapshot`]: olio_types::HydrationSnapshot

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod identity;
pub mod membership;
pub mod organization;
pub mod setup;
pub mod store;

pub use cache::{BootstrapCache, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use config::{HydrationConfig, DEFAULT_CACHE_KEY};
pub use coordinator::{HydrationCoordinator, MountHandle, RunToken};
pub use error::{Result, SessionError};
pub use identity::{
    AuthEvent, AuthEventKind, AuthSubscription, IdentityProvider, IdentitySessionReader,
    MemoryIdentityProvider, SessionRead,
};
pub use membership::{MembershipOutcome, MembershipResolver};
pub use organization::{OrganizationLoader, OrganizationOutcome};
pub use setup::OrganizationSetup;
pub use store::{MemoryTenantStore, StoreFailure, StoreOp, TenantStore};

// Re-export the data model so callers need only one dependency.
pub use olio_types;
