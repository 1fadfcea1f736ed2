//! Tenant store: the `profiles` and `organizations` tables.
//!
//! Equality-filtered selects, inserts and upserts only. There are no joins;
//! resolving a user's organization costs two round-trips.

mod memory;

pub use memory::{MemoryTenantStore, StoreFailure, StoreOp};

use async_trait::async_trait;
use olio_types::{NewOrganization, Organization, OrganizationId, ProfileRow, UserId};

use crate::error::Result;

pub const PROFILES_TABLE: &str = "profiles";
pub const ORGANIZATIONS_TABLE: &str = "organizations";

#[async_trait]
pub trait TenantStore: Send + Sync {
    /// `select id, org_id, role from profiles where id = $1`
    async fn select_profile(&self, user_id: &UserId) -> Result<Option<ProfileRow>>;

    /// Insert a profile; fails with a conflict if one already exists.
    async fn insert_profile(&self, row: &ProfileRow) -> Result<()>;

    /// Insert or replace a profile, keyed on `id`.
    async fn upsert_profile(&self, row: &ProfileRow) -> Result<()>;

    /// `select * from organizations where id = $1`
    async fn select_organization(&self, id: &OrganizationId) -> Result<Option<Organization>>;

    /// `select * from organizations where code = $1`
    async fn find_organization_by_code(&self, code: &str) -> Result<Option<Organization>>;

    /// Insert an organization and return the stored row with its new id.
    async fn insert_organization(&self, org: NewOrganization) -> Result<Organization>;
}
