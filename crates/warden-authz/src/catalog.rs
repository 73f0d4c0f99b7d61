//! Static role-to-capability mapping.
//!
//! # Purpose and responsibility
//! Authoritative source for which capabilities exist and which capabilities
//! each role confers. Lookups are O(1) against sets built once on first use.
//!
//! # Key invariants and assumptions
//! - Each role's set is authored independently; higher tiers are supersets by
//!   convention only.
//! - `super_admin` is bound to the full catalog rather than an authored list.
//! - Unknown role names resolve to the empty set instead of failing.
//!
//! # Security considerations
//! - Widening a role here widens it for every principal on the next cache
//!   refresh; keep each list conservative.
use crate::{Capability, Role};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Deduplicated set of capabilities.
pub type CapabilitySet = HashSet<Capability>;

const USER_CAPABILITIES: &[Capability] = &[
    Capability::CreatePost,
    Capability::EditOwnPost,
    Capability::DeleteOwnPost,
];

const MODERATOR_CAPABILITIES: &[Capability] = &[
    Capability::CreatePost,
    Capability::EditOwnPost,
    Capability::EditAnyPost,
    Capability::DeleteOwnPost,
    Capability::PublishPost,
    Capability::SchedulePost,
    Capability::ModerateComments,
    Capability::DeleteComments,
];

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::CreatePost,
    Capability::EditOwnPost,
    Capability::EditAnyPost,
    Capability::DeleteOwnPost,
    Capability::DeleteAnyPost,
    Capability::PublishPost,
    Capability::SchedulePost,
    Capability::ModerateComments,
    Capability::DeleteComments,
    Capability::UploadMedia,
    Capability::DeleteMedia,
    Capability::ViewAnalytics,
    Capability::ViewUsers,
    Capability::CreateUsers,
    Capability::EditUsers,
];

static EMPTY: LazyLock<CapabilitySet> = LazyLock::new(HashSet::new);
static ALL: LazyLock<CapabilitySet> = LazyLock::new(|| Capability::ALL.into_iter().collect());
static USER: LazyLock<CapabilitySet> =
    LazyLock::new(|| USER_CAPABILITIES.iter().copied().collect());
static MODERATOR: LazyLock<CapabilitySet> =
    LazyLock::new(|| MODERATOR_CAPABILITIES.iter().copied().collect());
static ADMIN: LazyLock<CapabilitySet> =
    LazyLock::new(|| ADMIN_CAPABILITIES.iter().copied().collect());

/// Capabilities conferred by `role`.
///
/// # Example
/// ```rust
/// use warden_authz::{Capability, Role, role_capabilities};
///
/// let caps = role_capabilities(Role::Moderator);
/// assert_eq!(caps.len(), 8);
/// assert!(caps.contains(&Capability::ModerateComments));
/// ```
pub fn role_capabilities(role: Role) -> &'static CapabilitySet {
    match role {
        Role::User => &USER,
        Role::Moderator => &MODERATOR,
        Role::Admin => &ADMIN,
        Role::SuperAdmin => &ALL,
    }
}

/// Capabilities conferred by a role given by its raw tag.
///
/// Returns the empty set for tags that do not name a known role; a role that
/// exists in data but not in the catalog is a misconfiguration, not a crash.
pub fn capabilities_for_role_name(name: &str) -> &'static CapabilitySet {
    match name.parse::<Role>() {
        Ok(role) => role_capabilities(role),
        Err(_) => &EMPTY,
    }
}

pub fn role_has_capability(role: Role, capability: Capability) -> bool {
    role_capabilities(role).contains(&capability)
}

/// The complete catalog.
pub fn all_capabilities() -> &'static CapabilitySet {
    &ALL
}
