//! Authenticated identities.

use serde::{Deserialize, Serialize};

use crate::ids::{OrganizationId, UserId};
use crate::organization::Organization;

/// The authenticated actor, as reported by the identity provider.
///
/// Owned externally; the hydration core only keeps a read-only copy for the
/// lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,

    /// Email address or handle used to sign in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Organization details mirrored into the provider's user metadata.
    #[serde(default, skip_serializing_if = "OrgHint::is_empty")]
    pub org_hint: OrgHint,
}

impl Identity {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
            org_hint: OrgHint::default(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_org_hint(mut self, hint: OrgHint) -> Self {
        self.org_hint = hint;
        self
    }
}

/// Organization details stored in the identity provider's user metadata.
///
/// Written whenever the user joins or creates an organization. Only usable
/// when every field is present and non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_icon_color: Option<String>,
}

impl OrgHint {
    pub fn for_organization(org: &Organization) -> Self {
        Self {
            org_id: Some(org.id.to_string()),
            org_name: Some(org.name.clone()),
            org_icon_color: Some(org.icon_color.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.org_id.is_none() && self.org_name.is_none() && self.org_icon_color.is_none()
    }

    /// Build an organization from the hint if all fields are usable.
    pub fn organization(&self) -> Option<Organization> {
        let id = OrganizationId::parse_optional(self.org_id.as_deref())?;
        let name = non_blank(self.org_name.as_deref())?;
        let icon_color = non_blank(self.org_icon_color.as_deref())?;

        Some(Organization {
            id,
            name: name.to_string(),
            icon_color: icon_color.to_string(),
            join_code: None,
            owner_id: None,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
