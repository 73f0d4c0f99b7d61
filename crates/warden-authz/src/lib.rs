//! Warden authz primitives shared by the resolver and its store backends.
//!
//! # Purpose
//! Centralizes the closed capability catalog, the role tiers, the static
//! role-to-capability mapping, and the typed grant records that the resolver
//! combines into an effective capability set.
//!
//! # How it fits
//! Store backends produce [`Principal`] and [`Grant`] values; the resolver
//! looks up [`role_capabilities`] and unions in the active grants before
//! caching the result.
//!
//! # Key invariants
//! - The catalog is static and never mutated at runtime.
//! - `super_admin` always resolves to the complete catalog.
//! - A grant without an expiry never expires.
//!
//! # Examples
//! ```rust
//! use warden_authz::{Capability, Role, role_has_capability};
//!
//! assert!(role_has_capability(Role::Moderator, Capability::PublishPost));
//! assert!(!role_has_capability(Role::User, Capability::DeleteUsers));
//! ```
//!
//! # Common pitfalls
//! - Treating role ordering as a capability guarantee; each tier's set is
//!   authored independently.
//! - Parsing role names with `Role::from_str` and crashing on unknown values;
//!   use [`capabilities_for_role_name`] when the input is untrusted data.

mod capability;
mod catalog;
mod errors;
mod grant;
mod role;
mod types;

pub use capability::Capability;
pub use catalog::{
    CapabilitySet, all_capabilities, capabilities_for_role_name, role_capabilities,
    role_has_capability,
};
pub use errors::{AuthzError, AuthzResult};
pub use grant::Grant;
pub use role::Role;
pub use types::{Principal, PrincipalId};
