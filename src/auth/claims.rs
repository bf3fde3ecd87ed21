use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Role tags carried in access tokens.
///
/// Serialized as the upper-case strings the services agreed on
/// ("CUSTOMER", "ADMIN").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Admin,
}

/// Convenience alias: roles form a set, not a list.
pub type RoleSet = BTreeSet<Role>;

/// The structured facts encoded inside a token.
///
/// `roles` is omitted from the wire payload when empty (refresh tokens
/// carry only the subject).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Stable user identifier (email)
    pub sub: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub roles: RoleSet,
    /// Issued-at, epoch seconds
    pub iat: i64,
    /// Expiry, epoch seconds
    pub exp: i64,
}

/// An identity as known to the auth service, before any token exists.
#[derive(Debug, Clone)]
pub struct Identity {
    pub subject: String,
    pub roles: RoleSet,
}

/// The authenticated identity attached to a request.
///
/// A `Principal` can only be built from claims that already passed
/// signature and expiry verification, so reading the subject or roles
/// from an unverified token is impossible by construction.
#[derive(Debug, Clone)]
pub struct Principal {
    subject: String,
    roles: RoleSet,
}

impl Principal {
    /// Build a principal from verified claims.
    ///
    /// Returns `None` when the claims cannot name a valid principal: a
    /// missing subject, or an empty role set (refresh tokens carry no
    /// roles and must not act as bearer credentials).
    pub(crate) fn from_claims(claims: Claims) -> Option<Self> {
        if claims.sub.is_empty() || claims.roles.is_empty() {
            return None;
        }
        Some(Self {
            subject: claims.sub,
            roles: claims.roles,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
