//! # Purpose
//! Walk through cached capability resolution end to end using the in-memory
//! stores and a manual clock.
//!
//! # What this demo proves
//! - Role capabilities and explicit grants combine into one effective set.
//! - Expired grants never contribute.
//! - Reads inside the TTL window never touch the stores; reads after it do.
//! - Unknown principals and store outages resolve to "denied" and are not cached.
//! - Role/grant changes made through `AccessAdmin` are visible immediately.
//!
//! # Notes on determinism
//! - Time only moves when the demo advances the `ManualClock`.
//! - The cache TTL comes from `WARDEN_CACHE_TTL_SECS` / `WARDEN_CONFIG`; step
//!   offsets are derived from it.
use anyhow::{Context, Result, bail};
use chrono::{TimeDelta, TimeZone, Utc};
use std::sync::Arc;
use warden_authz::{Capability, Grant, Principal, PrincipalId, Role};
use warden_resolver::observability::init_observability;
use warden_resolver::store::memory::{InMemoryGrantStore, InMemoryPrincipalStore};
use warden_resolver::store::{GrantAdminStore, PrincipalAdminStore};
use warden_resolver::{AccessAdmin, ManualClock, ResolutionSource, Resolver, ResolverConfig};

const MODERATOR: &str = "mod-1";
const WRITER: &str = "writer-1";
const ROOT: &str = "root";

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn resolver_live_demo_end_to_end() -> Result<()> {
        tokio::time::timeout(Duration::from_secs(10), run_demo())
            .await
            .context("resolver-live demo timeout")?
    }
}

async fn run_demo() -> Result<()> {
    println!("== Warden Demo: Cached Capability Resolution ==");

    let metrics = init_observability("resolver-live");
    let config = ResolverConfig::from_env_or_yaml().context("load resolver config")?;
    let ttl = TimeDelta::from_std(config.cache_ttl).context("cache ttl out of range")?;
    println!("STEP 0 config loaded: PASS (cache_ttl={}s)", ttl.num_seconds());

    let start = Utc
        .with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
        .single()
        .context("demo start time")?;
    let clock = Arc::new(ManualClock::new(start));
    let principals = InMemoryPrincipalStore::new();
    let grants = InMemoryGrantStore::new();
    let cache = Arc::new(config.build_cache(clock.clone()));
    let resolver = Arc::new(Resolver::new(
        Arc::new(principals.clone()),
        Arc::new(grants.clone()),
        cache,
    ));
    let admin = AccessAdmin::new(
        Arc::new(principals.clone()),
        Arc::new(grants.clone()),
        resolver.clone(),
    );

    let moderator = PrincipalId::new(MODERATOR);
    let writer = PrincipalId::new(WRITER);
    let root = PrincipalId::new(ROOT);
    seed(&principals, &grants, &moderator, &writer, &root, start).await?;
    println!("STEP 1 stores seeded: PASS (principals=3)");

    check(
        "STEP 2 moderator VIEW_USERS via grant",
        resolver.has_capability(&moderator, Capability::ViewUsers).await,
        true,
    )?;
    check(
        "STEP 3 moderator DELETE_USERS",
        resolver.has_capability(&moderator, Capability::DeleteUsers).await,
        false,
    )?;
    check(
        "STEP 4 writer DELETE_USERS (grant expired yesterday)",
        resolver.has_capability(&writer, Capability::DeleteUsers).await,
        false,
    )?;

    let reads_before = principals.read_count();
    clock.advance(ttl / 2);
    let resolution = resolver
        .try_capabilities(&moderator)
        .await
        .context("resolve inside ttl")?;
    check(
        "STEP 5 read inside ttl served from cache",
        resolution.source == ResolutionSource::Cache && principals.read_count() == reads_before,
        true,
    )?;

    clock.advance(ttl);
    let resolution = resolver
        .try_capabilities(&moderator)
        .await
        .context("resolve after ttl")?;
    check(
        "STEP 6 read after ttl goes back to stores",
        resolution.source == ResolutionSource::Stores,
        true,
    )?;

    let ghost = PrincipalId::new("ghost");
    let ghost_caps = resolver.get_capabilities(&ghost).await;
    check(
        "STEP 7 unknown principal denied and uncached",
        ghost_caps.is_empty()
            && !resolver
                .stats()
                .entries
                .iter()
                .any(|entry| entry.principal_id == ghost),
        true,
    )?;

    admin
        .grant_capability(&writer, Capability::UploadMedia, &root, None)
        .await
        .context("grant UPLOAD_MEDIA")?;
    check(
        "STEP 8 grant visible before ttl",
        resolver.has_capability(&writer, Capability::UploadMedia).await,
        true,
    )?;

    admin
        .assign_role(&writer, Role::Moderator)
        .await
        .context("promote writer")?;
    check(
        "STEP 9 promotion visible before ttl",
        resolver
            .has_all_capabilities(&writer, &[Capability::PublishPost, Capability::UploadMedia])
            .await,
        true,
    )?;

    check(
        "STEP 10 isAdmin/isSuperAdmin read fresh",
        resolver.is_super_admin(&root).await && !resolver.is_admin(&moderator).await,
        true,
    )?;

    resolver.clear();
    grants.set_unavailable(true);
    let denied = !resolver.has_capability(&root, Capability::ManageSettings).await;
    let indeterminate = resolver.try_capabilities(&root).await.is_err();
    grants.set_unavailable(false);
    check(
        "STEP 11 grant store outage fails closed",
        denied && indeterminate && resolver.cache().is_empty(),
        true,
    )?;

    let _ = resolver.get_capabilities(&root).await;
    let stats = serde_json::to_string_pretty(&resolver.stats()).context("encode stats")?;
    println!("STEP 12 cache stats:\n{stats}");

    let rendered = metrics.render();
    for line in rendered
        .lines()
        .filter(|line| line.starts_with("warden_"))
    {
        println!("  {line}");
    }
    tracing::info!("resolver-live demo complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    run_demo().await
}

async fn seed(
    principals: &InMemoryPrincipalStore,
    grants: &InMemoryGrantStore,
    moderator: &PrincipalId,
    writer: &PrincipalId,
    root: &PrincipalId,
    now: chrono::DateTime<Utc>,
) -> Result<()> {
    principals
        .upsert_principal(Principal::new(moderator.clone(), Role::Moderator))
        .await
        .context("seed moderator")?;
    principals
        .upsert_principal(Principal::new(writer.clone(), Role::User))
        .await
        .context("seed writer")?;
    principals
        .upsert_principal(Principal::new(root.clone(), Role::SuperAdmin))
        .await
        .context("seed root")?;

    grants
        .add_grant(Grant::new(
            moderator.clone(),
            Capability::ViewUsers,
            root.clone(),
            now - TimeDelta::days(7),
        ))
        .await
        .context("seed VIEW_USERS grant")?;
    grants
        .add_grant(
            Grant::new(
                writer.clone(),
                Capability::DeleteUsers,
                root.clone(),
                now - TimeDelta::days(7),
            )
            .expiring_at(now - TimeDelta::days(1)),
        )
        .await
        .context("seed expired DELETE_USERS grant")?;
    Ok(())
}

fn check(label: &str, actual: bool, expected: bool) -> Result<()> {
    if actual == expected {
        println!("{label}: PASS ({actual})");
        Ok(())
    } else {
        bail!("{label}: FAIL (expected {expected}, got {actual})");
    }
}
