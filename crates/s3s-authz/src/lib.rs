//! S3 Authorization
//!
//! `s3s-authz` decides whether an S3 request is allowed by combining the bucket policy
//! (evaluated with [`s3s_policy`]) and the ACL of the target resource.
//!
//! # Decision
//!
//! | bucket policy | result |
//! |---------------|--------|
//! | `Allow`       | allowed, ACLs are not consulted |
//! | `Deny`        | denied, ACLs are not consulted |
//! | `DefaultDeny` or no policy | allowed iff the ACL grants the requested permission |
//!
//! Failures of the policy store or the ACL store never allow a request: a policy that
//! cannot be loaded counts as no policy, and an ACL that cannot be read grants nothing.
//!
//! # Example
//!
//! ```
//! use s3s_authz::acl::{AclTarget, CannedAcl, Permission};
//! use s3s_authz::store::{MemoryAclStore, MemoryPolicyStore};
//! use s3s_authz::AuthorizerBuilder;
//! use s3s_policy::{Action, PolicyContext};
//!
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let policies = Arc::new(MemoryPolicyStore::new());
//! let acls = Arc::new(MemoryAclStore::new());
//!
//! acls.set_acl(AclTarget::bucket("photos"), CannedAcl::PublicRead.grants("alice", "alice"));
//!
//! let authorizer = AuthorizerBuilder::from_shared(policies.clone(), acls.clone()).build();
//!
//! let cx = PolicyContext::new(Action::ListBucket, "photos");
//! let target = AclTarget::bucket("photos");
//!
//! // no bucket policy: the public-read ACL decides
//! assert!(authorizer.authorize(&cx, "", &target, Permission::READ).await.is_ok());
//! assert!(authorizer.authorize(&cx, "", &target, Permission::WRITE).await.is_err());
//!
//! policies.insert("photos", r#"{
//!     "Statement": [{
//!         "Sid": "NoListing",
//!         "Effect": "Deny",
//!         "Principal": "*",
//!         "Action": "s3:ListBucket",
//!         "Resource": "arn:aws:s3:::photos"
//!     }]
//! }"#);
//! authorizer.invalidate_policy("photos");
//!
//! // an explicit deny wins over the ACL
//! assert!(authorizer.authorize(&cx, "", &target, Permission::READ).await.is_err());
//! # }
//! ```
//!
//! # Modules
//!
//! - [`acl`]: Permission bits, grants and canned ACLs
//! - [`store`]: Policy and ACL storage traits
//! - [`config`]: Runtime configuration

#![allow(
    clippy::bool_assert_comparison,  // I don't like `assert!(!expression)`. It's very misleading.
    clippy::module_name_repetitions,
    clippy::single_match_else,
)]

mod cache;
mod error;
mod gate;
mod parser;

pub mod acl;
pub mod config;
pub mod store;

pub use self::cache::PolicyCache;
pub use self::error::{LoadPolicyError, PermissionDenied, StdError};
pub use self::gate::{Authorizer, AuthorizerBuilder};
pub use self::parser::{JsonPolicyParser, PolicyParser};
