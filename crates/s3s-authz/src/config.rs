//! Authorizer configuration
//!
//! # Features
//! - `serde` support for serialization/deserialization
//! - Default values for all parameters
//! - Static configuration via [`StaticConfigProvider`]
//! - Hot-reload configuration via [`HotReloadConfigProvider`]
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use s3s_authz::config::{AuthzConfig, AuthzConfigProvider, HotReloadConfigProvider, StaticConfigProvider};
//!
//! let mut config = AuthzConfig::default();
//! config.max_policy_size = 64 * 1024;
//!
//! let static_provider = StaticConfigProvider::new(Arc::new(config));
//! assert_eq!(static_provider.snapshot().max_policy_size, 64 * 1024);
//!
//! let hot_reload_provider = HotReloadConfigProvider::default();
//! assert!(hot_reload_provider.snapshot().cache_policies);
//!
//! let mut new_config = AuthzConfig::default();
//! new_config.cache_policies = false;
//! hot_reload_provider.update(Arc::new(new_config));
//! assert!(!hot_reload_provider.snapshot().cache_policies);
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// Authorizer configuration provider.
///
/// A snapshot is taken once per operation, so that one decision never sees two different
/// configurations.
pub trait AuthzConfigProvider: Send + Sync + 'static {
    /// Returns a snapshot of the current configuration.
    fn snapshot(&self) -> Arc<AuthzConfig>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct AuthzConfig {
    /// Keep parsed bucket policies in memory between requests.
    ///
    /// Default: true
    pub cache_policies: bool,

    /// Maximum size of a stored policy document in bytes.
    ///
    /// Larger documents are ignored and the bucket is treated as having no policy.
    ///
    /// Default: 20 KB (20 * 1024), the S3 bucket policy limit
    pub max_policy_size: usize,

    /// Maximum number of buckets whose policy (or its absence) is cached.
    ///
    /// The oldest entries are evicted first. Zero disables caching.
    ///
    /// Default: 10000
    pub max_cached_policies: usize,

    /// Drop statements that fail verification instead of discarding the whole policy.
    ///
    /// Default: false
    pub skip_malformed_statements: bool,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            cache_policies: true,
            max_policy_size: 20 * 1024, // 20 KB
            max_cached_policies: 10_000,
            skip_malformed_statements: false,
        }
    }
}

/// Static configuration provider.
#[derive(Debug)]
pub struct StaticConfigProvider {
    inner: Arc<AuthzConfig>,
}

impl StaticConfigProvider {
    #[must_use]
    pub fn new(config: Arc<AuthzConfig>) -> Self {
        Self { inner: config }
    }
}

impl Default for StaticConfigProvider {
    fn default() -> Self {
        Self::new(Arc::new(AuthzConfig::default()))
    }
}

impl AuthzConfigProvider for StaticConfigProvider {
    fn snapshot(&self) -> Arc<AuthzConfig> {
        Arc::clone(&self.inner)
    }
}

/// Hot-reload configuration provider.
///
/// Reads are lock-free; [`update`](Self::update) swaps the whole configuration atomically.
#[derive(Debug)]
pub struct HotReloadConfigProvider {
    inner: ArcSwap<AuthzConfig>,
}

impl HotReloadConfigProvider {
    #[must_use]
    pub fn new(config: Arc<AuthzConfig>) -> Self {
        Self {
            inner: ArcSwap::from(config),
        }
    }

    pub fn update(&self, config: Arc<AuthzConfig>) {
        self.inner.store(config);
    }
}

impl Default for HotReloadConfigProvider {
    fn default() -> Self {
        Self::new(Arc::new(AuthzConfig::default()))
    }
}

impl AuthzConfigProvider for HotReloadConfigProvider {
    fn snapshot(&self) -> Arc<AuthzConfig> {
        self.inner.load_full()
    }
}
