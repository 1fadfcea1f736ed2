//! Olio data model.
//!
//! Plain value types shared by the hydration core and its consumers:
//! - identifiers for users and organizations
//! - identities and their organization hint
//! - memberships and roles
//! - organizations and the join-code palette
//! - the published hydration snapshot
//! - the persisted bootstrap record

pub mod bootstrap;
pub mod identity;
pub mod ids;
pub mod membership;
pub mod organization;
pub mod snapshot;

pub use bootstrap::BootstrapRecord;
pub use identity::{Identity, OrgHint};
pub use ids::{OrganizationId, UserId};
pub use membership::{Membership, ProfileRow, Role, RoleParseError};
pub use organization::{
    is_palette_color, is_valid_join_code, NewOrganization, Organization, DEFAULT_ORG_COLOR, ORG_COLORS,
};
pub use snapshot::{HydrationPhase, HydrationSnapshot};
