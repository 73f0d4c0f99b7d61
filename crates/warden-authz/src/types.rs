//! Strongly typed identifiers and principal records.
//!
//! # Purpose
//! Wraps principal identifiers so they cannot be mixed up with capability or
//! role tags, and defines the typed principal record returned by stores.
//!
//! # Key invariants
//! - `Display` and `as_str` return the original value unchanged.
//! - Identifiers are not validated here; stores own their key format.
//!
//! # Examples
//! ```rust
//! use warden_authz::{Principal, PrincipalId, Role};
//!
//! let principal = Principal::new(PrincipalId::new("u-42"), Role::Admin);
//! assert_eq!(principal.principal_id.as_str(), "u-42");
//! assert!(principal.is_admin());
//! ```
use crate::Role;
use serde::{Deserialize, Serialize};

/// Principal identifier wrapper.
///
/// # Summary
/// Newtype around the identifier the principal store keys records by.
///
/// # Example
/// ```rust
/// use warden_authz::PrincipalId;
///
/// let id: PrincipalId = "u-1".into();
/// assert_eq!(id.to_string(), "u-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PrincipalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A principal as known to the principal store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub role: Role,
}

impl Principal {
    pub fn new(principal_id: PrincipalId, role: Role) -> Self {
        Self { principal_id, role }
    }

    /// True for the `admin` tier exactly.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }
}
