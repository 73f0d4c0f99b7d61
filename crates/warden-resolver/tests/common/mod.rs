#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use warden_authz::{Capability, Grant, Principal, PrincipalId, Role};
use warden_resolver::store::memory::{InMemoryGrantStore, InMemoryPrincipalStore};
use warden_resolver::store::{GrantAdminStore, PrincipalAdminStore};
use warden_resolver::{ManualClock, ResolutionCache, Resolver};

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub struct Harness {
    pub principals: InMemoryPrincipalStore,
    pub grants: InMemoryGrantStore,
    pub clock: Arc<ManualClock>,
    pub resolver: Arc<Resolver>,
}

pub fn harness() -> Harness {
    let principals = InMemoryPrincipalStore::new();
    let grants = InMemoryGrantStore::new();
    let clock = Arc::new(ManualClock::new(epoch()));
    let cache = Arc::new(ResolutionCache::new(clock.clone()));
    let resolver = Arc::new(Resolver::new(
        Arc::new(principals.clone()),
        Arc::new(grants.clone()),
        cache,
    ));
    Harness {
        principals,
        grants,
        clock,
        resolver,
    }
}

impl Harness {
    pub async fn principal(&self, id: &str, role: Role) -> PrincipalId {
        let id = PrincipalId::new(id);
        self.principals
            .upsert_principal(Principal::new(id.clone(), role))
            .await
            .expect("upsert principal");
        id
    }

    pub async fn grant(
        &self,
        id: &PrincipalId,
        capability: Capability,
        expires_at: Option<DateTime<Utc>>,
    ) {
        let mut grant = Grant::new(id.clone(), capability, "root".into(), epoch());
        grant.expires_at = expires_at;
        self.grants.add_grant(grant).await.expect("add grant");
    }

    pub fn store_reads(&self) -> (usize, usize) {
        (self.principals.read_count(), self.grants.read_count())
    }
}
