//! Storage collaborators
//!
//! The gate never owns policy documents or ACLs. It reads them through these traits, so
//! that a deployment can back them with a database, a metadata service or plain memory.
//!
//! # Example
//!
//! ```
//! use s3s_authz::store::{PolicyStore, MemoryPolicyStore};
//! use s3s_authz::StdError;
//!
//! struct DatabasePolicyStore {
//!     // Your database connection
//! }
//!
//! #[async_trait::async_trait]
//! impl PolicyStore for DatabasePolicyStore {
//!     async fn get_policy_document(&self, bucket: &str) -> Result<Option<String>, StdError> {
//!         // SELECT policy FROM buckets WHERE name = ?
//! #       let _ = bucket;
//!         Ok(None)
//!     }
//! }
//!
//! let memory = MemoryPolicyStore::new();
//! memory.insert("photos", r#"{"Statement": []}"#);
//! ```

mod memory;
pub use self::memory::{MemoryAclStore, MemoryPolicyStore};

use crate::acl::{AclTarget, Grant, Grantee};
use crate::error::StdError;

/// Source of raw bucket policy documents.
#[async_trait::async_trait]
pub trait PolicyStore: Send + Sync + 'static {
    /// Returns the policy document attached to `bucket`, if any.
    ///
    /// # Errors
    /// Any error is logged by the caller and the bucket is treated as having no policy.
    async fn get_policy_document(&self, bucket: &str) -> Result<Option<String>, StdError>;
}

/// Source of ACL grants.
///
/// Grants are read on every ACL check and are never cached by this crate.
#[async_trait::async_trait]
pub trait AclStore: Send + Sync + 'static {
    /// Returns the grants held by `grantee` on `target`.
    ///
    /// # Errors
    /// Any error is logged by the caller and the ACL check fails.
    async fn list_grants(&self, target: &AclTarget, grantee: &Grantee) -> Result<Vec<Grant>, StdError>;
}
