//! Role and grant mutation with cache invalidation.
//!
//! # Purpose
//! Wraps the writable stores so every successful mutation drops the
//! principal's cached resolution. Without this, a change would only become
//! visible once the cache TTL lapses.
//!
//! # Notes
//! The cache entry is invalidated after each store write that succeeds, even
//! when a later write in the same operation fails. A failed first write leaves
//! the cache untouched. Loads already in flight when the entry is invalidated
//! are not written back (see [`crate::cache::ResolutionCache::set_if_current`]).
use crate::clock::Clock;
use crate::resolver::Resolver;
use crate::store::{GrantAdminStore, PrincipalAdminStore, StoreResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use warden_authz::{Capability, Grant, Principal, PrincipalId, Role};

pub struct AccessAdmin {
    principals: Arc<dyn PrincipalAdminStore>,
    grants: Arc<dyn GrantAdminStore>,
    resolver: Arc<Resolver>,
}

impl AccessAdmin {
    pub fn new(
        principals: Arc<dyn PrincipalAdminStore>,
        grants: Arc<dyn GrantAdminStore>,
        resolver: Arc<Resolver>,
    ) -> Self {
        Self {
            principals,
            grants,
            resolver,
        }
    }

    pub async fn assign_role(&self, principal_id: &PrincipalId, role: Role) -> StoreResult<()> {
        self.principals
            .upsert_principal(Principal::new(principal_id.clone(), role))
            .await?;
        self.resolver.invalidate(principal_id);
        tracing::info!(principal = %principal_id, %role, "role assigned");
        Ok(())
    }

    /// Issue `capability` to the principal, stamped with the resolver's clock.
    pub async fn grant_capability(
        &self,
        principal_id: &PrincipalId,
        capability: Capability,
        granted_by: &PrincipalId,
        expires_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Grant> {
        let granted_at = self.resolver.cache().clock().now();
        let mut grant = Grant::new(
            principal_id.clone(),
            capability,
            granted_by.clone(),
            granted_at,
        );
        grant.expires_at = expires_at;
        self.grants.add_grant(grant.clone()).await?;
        self.resolver.invalidate(principal_id);
        tracing::info!(
            principal = %principal_id,
            %capability,
            granted_by = %granted_by,
            expires_at = ?expires_at,
            "capability granted"
        );
        Ok(grant)
    }

    /// Returns the number of grants removed.
    pub async fn revoke_capability(
        &self,
        principal_id: &PrincipalId,
        capability: Capability,
    ) -> StoreResult<usize> {
        let removed = self.grants.revoke_grant(principal_id, capability).await?;
        self.resolver.invalidate(principal_id);
        tracing::info!(principal = %principal_id, %capability, removed, "capability revoked");
        Ok(removed)
    }

    /// Removes the principal record and every grant it holds.
    ///
    /// The cache entry is dropped as soon as the record is gone, so a failed
    /// grant cleanup still leaves the principal denied.
    pub async fn remove_principal(&self, principal_id: &PrincipalId) -> StoreResult<()> {
        self.principals.remove_principal(principal_id).await?;
        self.resolver.invalidate(principal_id);
        let revoked = self.grants.revoke_all(principal_id).await;
        self.resolver.invalidate(principal_id);
        let revoked = revoked?;
        tracing::info!(principal = %principal_id, revoked, "principal removed");
        Ok(())
    }
}
