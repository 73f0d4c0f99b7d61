use crate::cache::{DEFAULT_TTL, ResolutionCache};
use crate::clock::Clock;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CACHE_TTL_SECS: u64 = DEFAULT_TTL.as_secs();

// Resolver configuration sourced from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub cache_ttl: Duration,
}

#[derive(Debug, Deserialize)]
struct ResolverConfigOverride {
    cache_ttl_secs: Option<u64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
        }
    }
}

impl ResolverConfig {
    pub fn from_env() -> Result<Self> {
        let secs = match std::env::var("WARDEN_CACHE_TTL_SECS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .with_context(|| "parse WARDEN_CACHE_TTL_SECS")?,
            Err(_) => DEFAULT_CACHE_TTL_SECS,
        };
        Ok(Self {
            cache_ttl: ttl_from_secs(secs)?,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("WARDEN_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read WARDEN_CONFIG: {path}"))?;
            let override_cfg: ResolverConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse resolver config yaml")?;
            if let Some(secs) = override_cfg.cache_ttl_secs {
                config.cache_ttl = ttl_from_secs(secs).with_context(|| "cache_ttl_secs")?;
            }
        }
        Ok(config)
    }

    pub fn build_cache(&self, clock: Arc<dyn Clock>) -> ResolutionCache {
        ResolutionCache::with_ttl(clock, self.cache_ttl)
    }
}

fn ttl_from_secs(secs: u64) -> Result<Duration> {
    if secs == 0 {
        bail!("cache ttl must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use serial_test::serial;
    use std::io::Write;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => unsafe {
                    std::env::set_var(self.key, value);
                },
                None => unsafe {
                    std::env::remove_var(self.key);
                },
            }
        }
    }

    #[test]
    #[serial]
    fn defaults_to_five_minutes() {
        let _g1 = EnvGuard::unset("WARDEN_CACHE_TTL_SECS");
        let _g2 = EnvGuard::unset("WARDEN_CONFIG");
        let config = ResolverConfig::from_env_or_yaml().expect("config");
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    #[serial]
    fn env_overrides_ttl() {
        let _g = EnvGuard::set("WARDEN_CACHE_TTL_SECS", "42");
        let config = ResolverConfig::from_env().expect("config");
        assert_eq!(config.cache_ttl, Duration::from_secs(42));
    }

    #[test]
    #[serial]
    fn env_rejects_bad_values() {
        let _g = EnvGuard::set("WARDEN_CACHE_TTL_SECS", "soon");
        assert!(ResolverConfig::from_env().is_err());

        let _g = EnvGuard::set("WARDEN_CACHE_TTL_SECS", "0");
        assert!(ResolverConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn yaml_overrides_env() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "cache_ttl_secs: 90").expect("write yaml");
        let path = file.path().to_string_lossy().to_string();

        let _g1 = EnvGuard::set("WARDEN_CACHE_TTL_SECS", "42");
        let _g2 = EnvGuard::set("WARDEN_CONFIG", &path);
        let config = ResolverConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.cache_ttl, Duration::from_secs(90));
    }

    #[test]
    #[serial]
    fn yaml_without_ttl_keeps_env_value() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "{{}}").expect("write yaml");
        let path = file.path().to_string_lossy().to_string();

        let _g1 = EnvGuard::set("WARDEN_CACHE_TTL_SECS", "42");
        let _g2 = EnvGuard::set("WARDEN_CONFIG", &path);
        let config = ResolverConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.cache_ttl, Duration::from_secs(42));
    }

    #[test]
    #[serial]
    fn missing_yaml_file_is_an_error() {
        let _g1 = EnvGuard::unset("WARDEN_CACHE_TTL_SECS");
        let _g2 = EnvGuard::set("WARDEN_CONFIG", "/nonexistent/warden.yaml");
        let err = ResolverConfig::from_env_or_yaml().expect_err("missing file");
        assert!(err.to_string().contains("WARDEN_CONFIG"));
    }

    #[test]
    fn build_cache_uses_configured_ttl() {
        let config = ResolverConfig {
            cache_ttl: Duration::from_secs(7),
        };
        let cache = config.build_cache(Arc::new(SystemClock));
        assert_eq!(cache.default_ttl(), Duration::from_secs(7));
    }
}
