//! In-memory implementations of the principal and grant stores.
//!
//! # Purpose
//! These stores keep raw rows in `HashMap`s guarded by `tokio::sync::RwLock`.
//! They exist for:
//! - local development and tests (no external dependencies)
//! - single-process embeddings where durability is not required
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: writes take the write lock, reads the read lock.
//!
//! # Test hooks
//! Every read bumps a counter (`read_count`) so callers can tell a cache hit
//! from a store round trip, and `set_unavailable` makes reads fail with
//! [`StoreError::Unavailable`] to exercise fail-closed paths.
use super::{
    GrantAdminStore, GrantRow, GrantStore, PrincipalAdminStore, PrincipalRow, PrincipalStore,
    StoreError, StoreResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use warden_authz::{Capability, Grant, Principal, PrincipalId};

#[derive(Debug, Default)]
struct StoreHooks {
    reads: AtomicUsize,
    unavailable: AtomicBool,
}

impl StoreHooks {
    fn begin_read(&self, backend: &str) -> StoreResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{backend} offline")));
        }
        Ok(())
    }
}

/// In-memory principal store keyed by principal id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPrincipalStore {
    rows: Arc<RwLock<HashMap<String, PrincipalRow>>>,
    hooks: Arc<StoreHooks>,
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw row as-is. Validation happens on read.
    pub async fn insert_row(&self, row: PrincipalRow) {
        self.rows
            .write()
            .await
            .insert(row.principal_id.clone(), row);
    }

    pub fn read_count(&self) -> usize {
        self.hooks.reads.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.hooks.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn get_principal(&self, principal_id: &PrincipalId) -> StoreResult<Principal> {
        self.hooks.begin_read("principal store")?;
        let row = self
            .rows
            .read()
            .await
            .get(principal_id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(principal_id.to_string()))?;
        Principal::try_from(row)
    }
}

#[async_trait]
impl PrincipalAdminStore for InMemoryPrincipalStore {
    async fn upsert_principal(&self, principal: Principal) -> StoreResult<()> {
        self.insert_row(principal.into()).await;
        Ok(())
    }

    async fn remove_principal(&self, principal_id: &PrincipalId) -> StoreResult<()> {
        self.rows
            .write()
            .await
            .remove(principal_id.as_str())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(principal_id.to_string()))
    }
}

/// In-memory grant store keyed by principal id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGrantStore {
    rows: Arc<RwLock<HashMap<String, Vec<GrantRow>>>>,
    hooks: Arc<StoreHooks>,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw row as-is. Validation happens on read.
    pub async fn insert_row(&self, row: GrantRow) {
        self.rows
            .write()
            .await
            .entry(row.principal_id.clone())
            .or_default()
            .push(row);
    }

    pub fn read_count(&self) -> usize {
        self.hooks.reads.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.hooks.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl GrantStore for InMemoryGrantStore {
    async fn get_grants(&self, principal_id: &PrincipalId) -> StoreResult<Vec<Grant>> {
        self.hooks.begin_read("grant store")?;
        let rows = self
            .rows
            .read()
            .await
            .get(principal_id.as_str())
            .cloned()
            .unwrap_or_default();
        rows.into_iter().map(Grant::try_from).collect()
    }
}

#[async_trait]
impl GrantAdminStore for InMemoryGrantStore {
    async fn add_grant(&self, grant: Grant) -> StoreResult<()> {
        self.insert_row(grant.into()).await;
        Ok(())
    }

    async fn revoke_grant(
        &self,
        principal_id: &PrincipalId,
        capability: Capability,
    ) -> StoreResult<usize> {
        let mut rows = self.rows.write().await;
        let Some(entries) = rows.get_mut(principal_id.as_str()) else {
            return Ok(0);
        };
        let before = entries.len();
        entries.retain(|row| row.capability != capability.as_str());
        let removed = before - entries.len();
        if entries.is_empty() {
            rows.remove(principal_id.as_str());
        }
        Ok(removed)
    }

    async fn revoke_all(&self, principal_id: &PrincipalId) -> StoreResult<usize> {
        Ok(self
            .rows
            .write()
            .await
            .remove(principal_id.as_str())
            .map(|entries| entries.len())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use warden_authz::Role;

    #[tokio::test]
    async fn principal_roundtrip_and_not_found() {
        let store = InMemoryPrincipalStore::new();
        store
            .upsert_principal(Principal::new("u-1".into(), Role::Moderator))
            .await
            .expect("upsert");

        let role = store.get_role(&"u-1".into()).await.expect("role");
        assert_eq!(role, Role::Moderator);

        let err = store.get_role(&"u-2".into()).await.expect_err("missing");
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.read_count(), 2);
    }

    #[tokio::test]
    async fn unknown_role_row_is_invalid_on_read() {
        let store = InMemoryPrincipalStore::new();
        store
            .insert_row(PrincipalRow {
                principal_id: "u-1".to_string(),
                role: "owner".to_string(),
            })
            .await;
        let err = store.get_principal(&"u-1".into()).await.expect_err("invalid");
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn remove_principal_reports_missing() {
        let store = InMemoryPrincipalStore::new();
        store
            .upsert_principal(Principal::new("u-1".into(), Role::User))
            .await
            .expect("upsert");
        store.remove_principal(&"u-1".into()).await.expect("remove");
        let err = store
            .remove_principal(&"u-1".into())
            .await
            .expect_err("already removed");
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn unavailable_store_fails_reads() {
        let principals = InMemoryPrincipalStore::new();
        let grants = InMemoryGrantStore::new();
        principals.set_unavailable(true);
        grants.set_unavailable(true);

        let err = principals.get_role(&"u-1".into()).await.expect_err("offline");
        assert!(matches!(err, StoreError::Unavailable(_)));
        let err = grants.get_grants(&"u-1".into()).await.expect_err("offline");
        assert!(matches!(err, StoreError::Unavailable(_)));

        principals.set_unavailable(false);
        assert!(matches!(
            principals.get_role(&"u-1".into()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn grants_add_list_and_revoke() {
        let store = InMemoryGrantStore::new();
        let now = Utc::now();
        let id = PrincipalId::new("u-1");

        assert!(store.get_grants(&id).await.expect("empty").is_empty());

        store
            .add_grant(Grant::new(id.clone(), Capability::ViewUsers, "root".into(), now))
            .await
            .expect("grant");
        store
            .add_grant(
                Grant::new(id.clone(), Capability::DeleteUsers, "root".into(), now)
                    .expiring_at(now + TimeDelta::hours(1)),
            )
            .await
            .expect("grant");
        store
            .add_grant(Grant::new(id.clone(), Capability::ViewUsers, "other".into(), now))
            .await
            .expect("grant");

        let grants = store.get_grants(&id).await.expect("grants");
        assert_eq!(grants.len(), 3);

        let removed = store
            .revoke_grant(&id, Capability::ViewUsers)
            .await
            .expect("revoke");
        assert_eq!(removed, 2);
        let remaining = store.get_grants(&id).await.expect("grants");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].capability, Capability::DeleteUsers);

        assert_eq!(store.revoke_all(&id).await.expect("revoke all"), 1);
        assert_eq!(store.revoke_all(&id).await.expect("revoke all"), 0);
        assert_eq!(
            store
                .revoke_grant(&id, Capability::DeleteUsers)
                .await
                .expect("revoke"),
            0
        );
    }

    #[tokio::test]
    async fn malformed_grant_row_fails_read() {
        let store = InMemoryGrantStore::new();
        store
            .insert_row(GrantRow {
                principal_id: "u-1".to_string(),
                capability: "LAUNCH_ROCKETS".to_string(),
                granted_by: "root".to_string(),
                granted_at: Utc::now(),
                expires_at: None,
            })
            .await;
        let err = store.get_grants(&"u-1".into()).await.expect_err("invalid");
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = InMemoryPrincipalStore::new();
        let clone = store.clone();
        clone
            .upsert_principal(Principal::new("u-1".into(), Role::Admin))
            .await
            .expect("upsert");
        assert_eq!(store.get_role(&"u-1".into()).await.expect("role"), Role::Admin);
        assert_eq!(clone.read_count(), 1);
    }
}
