//! Capability resolution over the role catalog, explicit grants, and the cache.
//!
//! # Purpose and responsibility
//! Answers point queries ("does P hold C?") and set queries ("what does P
//! hold?") consistently regardless of cache state.
//!
//! # Key invariants and assumptions
//! - A cache miss always computes `role_capabilities(role) ∪ active grants`
//!   in full before caching; a role-only subset is never cached, even when the
//!   role alone already answers the query that triggered the miss.
//! - Grants whose `expires_at <= now` never contribute.
//! - A cached set stops being served at the first expiry among the grants
//!   that contributed to it, even inside the TTL window.
//! - Unknown principals are never cached.
//! - A miss whose store reads began before an `invalidate` does not write its
//!   result back, so a completed mutation is never masked by a stale load.
//! - `is_admin` and `is_super_admin` read the principal store directly on every
//!   call and are not subject to the cache TTL.
//!
//! # Security considerations
//! - Fail-closed: store errors, unknown principals, and invalid rows all
//!   resolve to the empty set for the boolean and set APIs. Callers that need
//!   to tell "denied" from "indeterminate" use [`Resolver::try_capabilities`].
//! - Concurrent misses for one principal may both reach the stores; the last
//!   cache write wins, and both writes carry the same inputs. Invalidation
//!   between them discards both writes.
use crate::cache::{CacheStats, ResolutionCache};
use crate::clock::Clock;
use crate::store::{GrantStore, PrincipalStore, StoreError};
use crate::telemetry::{self, StoreKind};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use warden_authz::{Capability, CapabilitySet, PrincipalId, Role, role_capabilities};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("principal not found: {0}")]
    PrincipalNotFound(PrincipalId),
    #[error("principal store failed for {principal}: {source}")]
    PrincipalStore {
        principal: PrincipalId,
        #[source]
        source: StoreError,
    },
    #[error("grant store failed for {principal}: {source}")]
    GrantStore {
        principal: PrincipalId,
        #[source]
        source: StoreError,
    },
}

pub type ResolveResult<T> = Result<T, ResolveError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Cache,
    Stores,
}

/// Effective capability set plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub capabilities: CapabilitySet,
    pub source: ResolutionSource,
}

pub struct Resolver {
    principals: Arc<dyn PrincipalStore>,
    grants: Arc<dyn GrantStore>,
    cache: Arc<ResolutionCache>,
}

impl Resolver {
    /// Build a resolver. Grant expiry is judged by the cache's clock so TTL and
    /// expiry share one notion of "now".
    pub fn new(
        principals: Arc<dyn PrincipalStore>,
        grants: Arc<dyn GrantStore>,
        cache: Arc<ResolutionCache>,
    ) -> Self {
        Self {
            principals,
            grants,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    fn clock(&self) -> &Arc<dyn Clock> {
        self.cache.clock()
    }

    /// Resolve the full effective set, surfacing why resolution failed.
    ///
    /// # Errors
    /// - [`ResolveError::PrincipalNotFound`] when the principal store has no record.
    /// - [`ResolveError::PrincipalStore`] / [`ResolveError::GrantStore`] for
    ///   unavailable stores and rows that fail validation.
    ///
    /// Nothing is cached on error.
    pub async fn try_capabilities(&self, principal_id: &PrincipalId) -> ResolveResult<Resolution> {
        let (capabilities, source) = self.resolve(principal_id).await?;
        Ok(Resolution {
            capabilities: capabilities.as_ref().clone(),
            source,
        })
    }

    async fn resolve(
        &self,
        principal_id: &PrincipalId,
    ) -> ResolveResult<(Arc<CapabilitySet>, ResolutionSource)> {
        if let Some(capabilities) = self.cache.get(principal_id) {
            telemetry::record_cache_hit();
            tracing::debug!(principal = %principal_id, "capability cache hit");
            return Ok((capabilities, ResolutionSource::Cache));
        }
        telemetry::record_cache_miss();
        tracing::debug!(principal = %principal_id, "capability cache miss");

        let ticket = self.cache.load_ticket();
        let role = match self.principals.get_role(principal_id).await {
            Ok(role) => role,
            Err(StoreError::NotFound(_)) => {
                return Err(ResolveError::PrincipalNotFound(principal_id.clone()));
            }
            Err(source) => {
                return Err(ResolveError::PrincipalStore {
                    principal: principal_id.clone(),
                    source,
                });
            }
        };
        let grants = self.grants.get_grants(principal_id).await.map_err(|source| {
            ResolveError::GrantStore {
                principal: principal_id.clone(),
                source,
            }
        })?;

        let now = self.clock().now();
        let mut capabilities = role_capabilities(role).clone();
        let mut stale_from: Option<DateTime<Utc>> = None;
        for grant in grants.iter().filter(|grant| grant.is_active_at(now)) {
            capabilities.insert(grant.capability);
            if let Some(expires_at) = grant.expires_at {
                stale_from = Some(stale_from.map_or(expires_at, |at| at.min(expires_at)));
            }
        }

        let capabilities = Arc::new(capabilities);
        if !self.cache.set_if_current(
            ticket,
            principal_id.clone(),
            capabilities.clone(),
            stale_from,
        ) {
            tracing::debug!(
                principal = %principal_id,
                "invalidated during load; resolution not cached"
            );
        }
        Ok((capabilities, ResolutionSource::Stores))
    }

    // Fail-closed snapshot shared by the boolean queries.
    async fn effective(&self, principal_id: &PrincipalId) -> Option<Arc<CapabilitySet>> {
        match self.resolve(principal_id).await {
            Ok((capabilities, _)) => Some(capabilities),
            Err(err) => {
                absorb(&err);
                None
            }
        }
    }

    /// Effective capability set, empty when it cannot be determined.
    pub async fn get_capabilities(&self, principal_id: &PrincipalId) -> CapabilitySet {
        self.effective(principal_id)
            .await
            .map(|capabilities| capabilities.as_ref().clone())
            .unwrap_or_default()
    }

    pub async fn has_capability(&self, principal_id: &PrincipalId, capability: Capability) -> bool {
        self.effective(principal_id)
            .await
            .is_some_and(|capabilities| capabilities.contains(&capability))
    }

    /// True if any listed capability is held. Empty input is `false`.
    pub async fn has_any_capability(
        &self,
        principal_id: &PrincipalId,
        capabilities: &[Capability],
    ) -> bool {
        if capabilities.is_empty() {
            return false;
        }
        self.effective(principal_id)
            .await
            .is_some_and(|held| capabilities.iter().any(|capability| held.contains(capability)))
    }

    /// True if every listed capability is held. Empty input is `true`.
    pub async fn has_all_capabilities(
        &self,
        principal_id: &PrincipalId,
        capabilities: &[Capability],
    ) -> bool {
        if capabilities.is_empty() {
            return true;
        }
        self.effective(principal_id)
            .await
            .is_some_and(|held| capabilities.iter().all(|capability| held.contains(capability)))
    }

    /// Always-fresh check against the principal store; bypasses the cache.
    pub async fn is_admin(&self, principal_id: &PrincipalId) -> bool {
        self.fresh_role(principal_id).await == Some(Role::Admin)
    }

    /// Always-fresh check against the principal store; bypasses the cache.
    pub async fn is_super_admin(&self, principal_id: &PrincipalId) -> bool {
        self.fresh_role(principal_id).await == Some(Role::SuperAdmin)
    }

    async fn fresh_role(&self, principal_id: &PrincipalId) -> Option<Role> {
        match self.principals.get_role(principal_id).await {
            Ok(role) => Some(role),
            Err(StoreError::NotFound(_)) => None,
            Err(source) => {
                absorb(&ResolveError::PrincipalStore {
                    principal: principal_id.clone(),
                    source,
                });
                None
            }
        }
    }

    /// Must be called after any change to the principal's role or grants.
    pub fn invalidate(&self, principal_id: &PrincipalId) {
        if self.cache.invalidate(principal_id) {
            tracing::debug!(principal = %principal_id, "capability cache entry invalidated");
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

// Collapse a resolution failure into "denied", keeping a trace of why.
fn absorb(err: &ResolveError) {
    match err {
        ResolveError::PrincipalNotFound(principal) => {
            tracing::debug!(principal = %principal, "unknown principal resolved to no capabilities");
        }
        ResolveError::PrincipalStore { principal, source } => {
            telemetry::record_store_failure(StoreKind::Principal);
            tracing::warn!(principal = %principal, error = %source, "principal store failure; denying");
        }
        ResolveError::GrantStore { principal, source } => {
            telemetry::record_store_failure(StoreKind::Grant);
            tracing::warn!(principal = %principal, error = %source, "grant store failure; denying");
        }
    }
}
