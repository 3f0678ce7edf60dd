//! # Principals
//!
//! Accounts live in an external identity service. The pipeline only needs to
//! know which kind of principal an id belongs to and what role it carries, so
//! the three account kinds are modelled as one closed [`Principal`] union
//! behind a single [`PrincipalDirectory::resolve`] call.
//!
//! The wire form of [`Principal`] is internally tagged by `kind`:
//!
//! ```json
//! {"kind": "individual", "id": "u-7", "name": "Dana Lee", "owner_id": "DL1234"}
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::DirectoryError;
use crate::identity::OwnerId;

/// Role carried by a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Organization allowed to issue documents.
    #[serde(rename = "issuing-auth")]
    IssuingAuthority,
    /// Organization that checks documents presented to it.
    #[serde(rename = "verifying-auth")]
    VerifyingAuthority,
    /// Document holder.
    Individual,
    /// Platform operator.
    Admin,
}

impl Role {
    /// The role string used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssuingAuthority => "issuing-auth",
            Self::VerifyingAuthority => "verifying-auth",
            Self::Individual => "individual",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of [`Principal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// Issuing or verifying organization.
    Organization,
    /// Individual document holder.
    Individual,
    /// Administrator.
    Admin,
}

/// A resolved account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// An issuing or verifying organization.
    Organization {
        /// Directory id.
        id: String,
        /// Registered organization name.
        name: String,
        /// Issuing or verifying. Any other role is rejected on insert.
        role: Role,
    },
    /// A document holder, linked to the owner id used in filenames.
    Individual {
        /// Directory id.
        id: String,
        /// Display name.
        name: String,
        /// Owner id embedded in the holder's document filenames.
        owner_id: OwnerId,
    },
    /// A platform administrator.
    Admin {
        /// Directory id.
        id: String,
    },
}

impl Principal {
    /// Directory id of any variant.
    pub fn id(&self) -> &str {
        match self {
            Self::Organization { id, .. } | Self::Individual { id, .. } | Self::Admin { id } => id,
        }
    }

    /// Kind tag.
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Self::Organization { .. } => PrincipalKind::Organization,
            Self::Individual { .. } => PrincipalKind::Individual,
            Self::Admin { .. } => PrincipalKind::Admin,
        }
    }

    /// Role carried by this principal.
    pub fn role(&self) -> Role {
        match self {
            Self::Organization { role, .. } => *role,
            Self::Individual { .. } => Role::Individual,
            Self::Admin { .. } => Role::Admin,
        }
    }
}

/// Lookup of principals by id.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Resolve an id to its principal, or `None` if no account has that id.
    async fn resolve(&self, id: &str) -> Result<Option<Principal>, DirectoryError>;
}

/// Process-local directory, used in development and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    principals: Arc<RwLock<HashMap<String, Principal>>>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a principal.
    ///
    /// Organizations may only hold an issuing or verifying role; anything
    /// else is refused and `false` is returned.
    pub fn insert(&self, principal: Principal) -> bool {
        if let Principal::Organization { role, .. } = &principal {
            if !matches!(role, Role::IssuingAuthority | Role::VerifyingAuthority) {
                return false;
            }
        }
        self.principals
            .write()
            .insert(principal.id().to_string(), principal);
        true
    }
}

#[async_trait]
impl PrincipalDirectory for InMemoryDirectory {
    async fn resolve(&self, id: &str) -> Result<Option<Principal>, DirectoryError> {
        Ok(self.principals.read().get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> Principal {
        Principal::Organization {
            id: "org-1".into(),
            name: "State University".into(),
            role: Role::IssuingAuthority,
        }
    }

    #[test]
    fn role_per_variant() {
        assert_eq!(issuer().role(), Role::IssuingAuthority);
        let holder = Principal::Individual {
            id: "ind-1".into(),
            name: "A. Holder".into(),
            owner_id: OwnerId::new("DL1234").unwrap(),
        };
        assert_eq!(holder.role(), Role::Individual);
        assert_eq!(holder.kind(), PrincipalKind::Individual);
        assert_eq!(Principal::Admin { id: "adm".into() }.role(), Role::Admin);
    }

    #[test]
    fn role_wire_names() {
        assert_eq!(serde_json::to_value(Role::IssuingAuthority).unwrap(), "issuing-auth");
        assert_eq!(serde_json::to_value(Role::VerifyingAuthority).unwrap(), "verifying-auth");
        assert_eq!(serde_json::to_value(Role::Individual).unwrap(), "individual");
    }

    #[test]
    fn principal_serializes_with_kind_tag() {
        let json = serde_json::to_value(issuer()).unwrap();
        assert_eq!(json["kind"], "organization");
        assert_eq!(json["role"], "issuing-auth");
    }

    #[tokio::test]
    async fn directory_resolves_each_kind() {
        let dir = InMemoryDirectory::new();
        assert!(dir.insert(issuer()));
        assert!(dir.insert(Principal::Admin { id: "adm".into() }));

        assert_eq!(
            dir.resolve("org-1").await.unwrap().unwrap().kind(),
            PrincipalKind::Organization
        );
        assert_eq!(dir.resolve("adm").await.unwrap().unwrap().role(), Role::Admin);
        assert!(dir.resolve("missing").await.unwrap().is_none());
    }

    #[test]
    fn organization_with_individual_role_is_refused() {
        let dir = InMemoryDirectory::new();
        assert!(!dir.insert(Principal::Organization {
            id: "org-2".into(),
            name: "Bad".into(),
            role: Role::Individual,
        }));
    }
}
