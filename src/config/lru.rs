//! Configuration for the Least Recently Used (LRU) eviction policy.
//!
//! # Sizing Guidelines
//!
//! `max_size` bounds the number of entries the policy lets the cache hold
//! before it starts evicting. It is a soft bound: while threads are racing to
//! insert, the cache may briefly hold more entries, by at most the length of
//! one shrink pass.
//!
//! Set it from the memory budget for cached entries:
//!
//! ```text
//! max_size ≈ memory budget / (average entry size + per-entry overhead)
//! ```
//!
//! # Examples
//!
//! ```
//! use lru_evict::config::LruPolicyConfig;
//! use lru_evict::LruEvictionPolicy;
//! use core::num::NonZeroUsize;
//! # use lru_evict::{EvictableEntry, MetaSlot, NodeHandle, PolicyTag};
//! # struct Entry(MetaSlot<Entry>);
//! # impl EvictableEntry for Entry {
//! #     fn is_cached(&self) -> bool { true }
//! #     fn evict(&self) -> bool { true }
//! #     fn meta(&self, _: PolicyTag) -> Option<NodeHandle<Self>> { self.0.get() }
//! #     fn put_meta_if_absent(&self, _: PolicyTag, h: NodeHandle<Self>) -> Option<NodeHandle<Self>> { self.0.put_if_absent(h) }
//! #     fn replace_meta(&self, _: PolicyTag, c: &NodeHandle<Self>, n: NodeHandle<Self>) -> bool { self.0.replace(c, n) }
//! #     fn remove_meta(&self, _: PolicyTag, c: &NodeHandle<Self>) -> bool { self.0.remove(c) }
//! # }
//!
//! // ~64MB budget for ~1KB entries
//! let config = LruPolicyConfig {
//!     max_size: NonZeroUsize::new(64 * 1024).unwrap(),
//! };
//! let policy: LruEvictionPolicy<Entry> = LruEvictionPolicy::init(config);
//! assert_eq!(policy.max_size(), 64 * 1024);
//! ```

use super::ConfigError;
use core::fmt;
use core::num::NonZeroUsize;

/// Default capacity bound of an LRU policy.
pub const DEFAULT_MAX_SIZE: usize = 100_000;

const DEFAULT_MAX_SIZE_NONZERO: NonZeroUsize = match NonZeroUsize::new(DEFAULT_MAX_SIZE) {
    Some(max_size) => max_size,
    None => panic!("DEFAULT_MAX_SIZE must be positive"),
};

/// Configuration for an LRU (Least Recently Used) eviction policy.
///
/// # Fields
///
/// - `max_size`: Number of entries the cache may hold before the policy starts
///   evicting the least recently used ones.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LruPolicyConfig {
    /// Maximum number of entries before eviction kicks in.
    pub max_size: NonZeroUsize,
}

impl LruPolicyConfig {
    /// Builds a config from a raw capacity, rejecting zero.
    pub fn new(max_size: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(max_size)
            .map(|max_size| LruPolicyConfig { max_size })
            .ok_or(ConfigError::InvalidMaxSize(max_size))
    }
}

impl Default for LruPolicyConfig {
    fn default() -> Self {
        LruPolicyConfig {
            max_size: DEFAULT_MAX_SIZE_NONZERO,
        }
    }
}

impl fmt::Debug for LruPolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruPolicyConfig")
            .field("max_size", &self.max_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_config_creation() {
        let config = LruPolicyConfig::new(1000).unwrap();
        assert_eq!(config.max_size.get(), 1000);
    }

    #[test]
    fn test_lru_config_rejects_zero() {
        assert_eq!(
            LruPolicyConfig::new(0),
            Err(ConfigError::InvalidMaxSize(0))
        );
    }

    #[test]
    fn test_lru_config_default() {
        let config = LruPolicyConfig::default();
        assert_eq!(config.max_size.get(), DEFAULT_MAX_SIZE);
        assert_eq!(
            format!("{:?}", config),
            "LruPolicyConfig { max_size: 100000 }"
        );
    }
}
