use super::{AclStore, PolicyStore};

use crate::acl::{AccessControlList, AclTarget, Grant, Grantee};
use crate::error::StdError;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// An in-memory [`PolicyStore`]
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryPolicyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a policy document to `bucket`, replacing any previous one.
    pub fn insert(&self, bucket: impl Into<String>, document: impl Into<String>) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(bucket.into(), document.into());
    }

    pub fn remove(&self, bucket: &str) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(bucket);
    }
}

#[async_trait::async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn get_policy_document(&self, bucket: &str) -> Result<Option<String>, StdError> {
        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(bucket).cloned())
    }
}

/// An in-memory [`AclStore`]
#[derive(Debug, Default)]
pub struct MemoryAclStore {
    map: RwLock<HashMap<AclTarget, AccessControlList>>,
}

impl MemoryAclStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the ACL of `target`.
    pub fn set_acl(&self, target: AclTarget, acl: AccessControlList) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(target, acl);
    }

    pub fn remove_acl(&self, target: &AclTarget) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(target);
    }
}

#[async_trait::async_trait]
impl AclStore for MemoryAclStore {
    async fn list_grants(&self, target: &AclTarget, grantee: &Grantee) -> Result<Vec<Grant>, StdError> {
        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
        let Some(acl) = map.get(target) else { return Ok(Vec::new()) };
        Ok(acl.grants_for(grantee).cloned().collect())
    }
}
