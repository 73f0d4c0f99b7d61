//! Warden capability resolver library crate.
//!
//! # Purpose
//! Answers "does principal P hold capability C?" by combining the static role
//! catalog with time-limited explicit grants, memoizing the combined set in an
//! in-process TTL cache.
//!
//! # Notes
//! Store backends are injected behind async traits; the in-memory backends in
//! [`store::memory`] serve tests, demos, and single-process embedding.
pub mod admin;
pub mod cache;
pub mod clock;
pub mod config;
pub mod observability;
pub mod resolver;
pub mod store;
pub mod telemetry;

pub use admin::AccessAdmin;
pub use cache::{CacheEntryStats, CacheStats, DEFAULT_TTL, LoadTicket, ResolutionCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ResolverConfig;
pub use resolver::{Resolution, ResolutionSource, ResolveError, ResolveResult, Resolver};
