//! Eviction Policy Configuration
//!
//! Configuration structs have public fields for simple instantiation, plus a
//! validating constructor for values that come from outside the program
//! (command-line flags, config files, management endpoints).
//!
//! # Validation
//!
//! The only rule is that a capacity bound must be positive. It is enforced at
//! the boundary, when a config is built from a raw number or when the bound of
//! a running policy is changed, and reported as a [`ConfigError`]. A rejected
//! value never reaches the policy, so its state is unchanged.
//!
//! | Config | Policy | Description |
//! |--------|--------|-------------|
//! | `LruPolicyConfig` | [`LruEvictionPolicy`](crate::LruEvictionPolicy) | Least Recently Used |
//!
//! # Examples
//!
//! ```
//! use lru_evict::config::{ConfigError, LruPolicyConfig};
//!
//! let config = LruPolicyConfig::new(10_000).unwrap();
//! assert_eq!(config.max_size.get(), 10_000);
//!
//! assert_eq!(LruPolicyConfig::new(0), Err(ConfigError::InvalidMaxSize(0)));
//! ```

pub mod lru;

pub use lru::{LruPolicyConfig, DEFAULT_MAX_SIZE};

/// Errors reported when a policy is configured with invalid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The capacity bound was zero.
    #[error("max size must be greater than zero (got {0})")]
    InvalidMaxSize(usize),
}
