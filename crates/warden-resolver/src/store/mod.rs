//! Contracts for the principal and grant stores.
//!
//! # Purpose
//! The resolver reads roles and grants through these traits only. Backends
//! convert their raw rows into typed records at this boundary
//! ([`PrincipalRow`], [`GrantRow`]) so nothing downstream handles untyped data.
//!
//! # Error model
//! `NotFound` is a normal outcome for an unknown principal. `Unavailable` and
//! `Unexpected` describe infrastructure failures. `Invalid` marks rows that
//! exist but do not fit the catalog (for example an unknown role tag).
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_authz::{Capability, Grant, Principal, PrincipalId, Role};

pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid record: {0}")]
    Invalid(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Fails with [`StoreError::NotFound`] when no record exists.
    async fn get_principal(&self, principal_id: &PrincipalId) -> StoreResult<Principal>;

    async fn get_role(&self, principal_id: &PrincipalId) -> StoreResult<Role> {
        Ok(self.get_principal(principal_id).await?.role)
    }
}

#[async_trait]
pub trait GrantStore: Send + Sync {
    /// All grants issued to the principal, expired ones included. An unknown
    /// principal has no grants.
    async fn get_grants(&self, principal_id: &PrincipalId) -> StoreResult<Vec<Grant>>;
}

#[async_trait]
pub trait PrincipalAdminStore: PrincipalStore {
    async fn upsert_principal(&self, principal: Principal) -> StoreResult<()>;
    async fn remove_principal(&self, principal_id: &PrincipalId) -> StoreResult<()>;
}

#[async_trait]
pub trait GrantAdminStore: GrantStore {
    async fn add_grant(&self, grant: Grant) -> StoreResult<()>;
    /// Removes every grant of `capability` to the principal; returns how many.
    async fn revoke_grant(
        &self,
        principal_id: &PrincipalId,
        capability: Capability,
    ) -> StoreResult<usize>;
    async fn revoke_all(&self, principal_id: &PrincipalId) -> StoreResult<usize>;
}

/// Principal record as persisted, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRow {
    pub principal_id: String,
    pub role: String,
}

impl From<Principal> for PrincipalRow {
    fn from(principal: Principal) -> Self {
        Self {
            principal_id: principal.principal_id.to_string(),
            role: principal.role.to_string(),
        }
    }
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = StoreError;

    fn try_from(row: PrincipalRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|err| StoreError::Invalid(format!("principal {}: {err}", row.principal_id)))?;
        Ok(Principal::new(PrincipalId::new(row.principal_id), role))
    }
}

/// Grant record as persisted, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRow {
    pub principal_id: String,
    pub capability: String,
    pub granted_by: String,
    pub granted_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Grant> for GrantRow {
    fn from(grant: Grant) -> Self {
        Self {
            principal_id: grant.principal_id.to_string(),
            capability: grant.capability.to_string(),
            granted_by: grant.granted_by.to_string(),
            granted_at: grant.granted_at,
            expires_at: grant.expires_at,
        }
    }
}

impl TryFrom<GrantRow> for Grant {
    type Error = StoreError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        let capability = row
            .capability
            .parse::<Capability>()
            .map_err(|err| StoreError::Invalid(format!("grant for {}: {err}", row.principal_id)))?;
        Ok(Grant {
            principal_id: PrincipalId::new(row.principal_id),
            capability,
            granted_by: PrincipalId::new(row.granted_by),
            granted_at: row.granted_at,
            expires_at: row.expires_at,
        })
    }
}
