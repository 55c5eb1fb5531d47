//! Bucket policy cache
//!
//! Parsed policies are shared by every request against their bucket. The first request
//! for a bucket loads and parses its document; concurrent requests for the same bucket
//! wait for that load instead of starting their own.
//!
//! The cache holds at most [`AuthzConfig::max_cached_policies`] buckets and evicts the
//! oldest entry first. A failed load leaves nothing behind.

use crate::config::{AuthzConfig, AuthzConfigProvider};
use crate::error::LoadPolicyError;
use crate::parser::PolicyParser;
use crate::store::PolicyStore;

use s3s_policy::BucketPolicy;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use tokio::sync::OnceCell;
use tracing::{debug, trace, warn};

type Slot = Arc<OnceCell<Option<Arc<BucketPolicy>>>>;

/// A single-flight cache of parsed bucket policies.
pub struct PolicyCache {
    store: Arc<dyn PolicyStore>,
    parser: Arc<dyn PolicyParser>,
    config: Arc<dyn AuthzConfigProvider>,
    slots: Mutex<IndexMap<String, Slot>>,
}

impl PolicyCache {
    #[must_use]
    pub fn new(store: Arc<dyn PolicyStore>, parser: Arc<dyn PolicyParser>, config: Arc<dyn AuthzConfigProvider>) -> Self {
        Self {
            store,
            parser,
            config,
            slots: Mutex::new(IndexMap::new()),
        }
    }

    /// Returns the policy of `bucket`, loading it on a miss.
    ///
    /// `None` means the bucket has no usable policy: no document is stored, or loading it
    /// failed. Failed loads are logged and not cached, so the next call retries.
    pub async fn get(&self, bucket: &str) -> Option<Arc<BucketPolicy>> {
        let config = self.config.snapshot();

        let result = if config.cache_policies && config.max_cached_policies > 0 {
            let slot = self.slot(bucket, config.max_cached_policies);
            let result = slot.get_or_try_init(|| self.load(bucket, &config)).await.cloned();
            if result.is_err() {
                self.discard(bucket, &slot);
            }
            result
        } else {
            self.load(bucket, &config).await
        };

        match result {
            Ok(policy) => policy,
            Err(err) => {
                warn!(%bucket, %err, "failed to load bucket policy");
                None
            }
        }
    }

    /// Drops the cached policy of `bucket`.
    ///
    /// Call this after the stored document changes.
    pub fn invalidate(&self, bucket: &str) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.shift_remove(bucket).is_some() {
            debug!(%bucket, "invalidated cached bucket policy");
        }
    }

    /// Drops every cached policy.
    pub fn clear(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.clear();
    }

    /// Returns the number of buckets with a cache entry, including loads in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if a policy (or its absence) is cached for `bucket`.
    #[must_use]
    pub fn is_cached(&self, bucket: &str) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(bucket).is_some_and(|slot| slot.initialized())
    }

    fn slot(&self, bucket: &str, capacity: usize) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(bucket) {
            return Arc::clone(slot);
        }

        while slots.len() >= capacity {
            let Some((evicted, _)) = slots.shift_remove_index(0) else { break };
            trace!(bucket = %evicted, "evicted cached bucket policy");
        }

        let slot = Slot::default();
        slots.insert(bucket.to_owned(), Arc::clone(&slot));
        slot
    }

    /// Removes the slot of a failed load, unless it was replaced or filled meanwhile.
    fn discard(&self, bucket: &str, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let stale = slots
            .get(bucket)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized());
        if stale {
            slots.shift_remove(bucket);
        }
    }

    async fn load(&self, bucket: &str, config: &AuthzConfig) -> Result<Option<Arc<BucketPolicy>>, LoadPolicyError> {
        let document = self
            .store
            .get_policy_document(bucket)
            .await
            .map_err(LoadPolicyError::Store)?;

        let Some(document) = document else {
            debug!(%bucket, "bucket has no policy");
            return Ok(None);
        };

        if document.len() > config.max_policy_size {
            return Err(LoadPolicyError::TooLarge {
                size: document.len(),
                limit: config.max_policy_size,
            });
        }

        let policy = self.parser.parse(&document, bucket, config)?;
        debug!(%bucket, statements = policy.statements().len(), "loaded bucket policy");
        Ok(Some(Arc::new(policy)))
    }
}

impl fmt::Debug for PolicyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("PolicyCache").field("buckets", &slots.len()).finish_non_exhaustive()
    }
}
