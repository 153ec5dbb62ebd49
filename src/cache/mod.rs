//! Caching subsystem.
//!
//! [`LookupCache`] is an opt-in LRU + TTL cache for database-resolved
//! profiles. Activated via the builder's `.lookup_cache()` method and
//! consulted by [`CachingResolver`](crate::resolve::CachingResolver).

pub mod lookup;

pub use lookup::{CacheConfig, LookupCache};
