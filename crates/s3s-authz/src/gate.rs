//! Authorization gate
//!
//! The gate combines the two tiers of S3 access control:
//!
//! 1. The bucket policy is evaluated. `Allow` grants the request and `Deny` rejects it;
//!    ACLs are not consulted in either case.
//! 2. Only when the policy is silent (`DefaultDeny`, or the bucket has no policy) are the
//!    ACL grants of the target resource checked against the requested permission.

use crate::acl::{AclTarget, Grantee, Permission, permission_granted};
use crate::cache::PolicyCache;
use crate::config::{AuthzConfigProvider, StaticConfigProvider};
use crate::error::PermissionDenied;
use crate::parser::{JsonPolicyParser, PolicyParser};
use crate::store::{AclStore, PolicyStore};

use s3s_policy::{EvalResult, PolicyContext};

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

/// Builder for [`Authorizer`].
pub struct AuthorizerBuilder {
    policy_store: Arc<dyn PolicyStore>,
    acl_store: Arc<dyn AclStore>,
    parser: Option<Arc<dyn PolicyParser>>,
    config: Option<Arc<dyn AuthzConfigProvider>>,
}

impl AuthorizerBuilder {
    /// Creates a builder reading policies from `policy_store` and grants from `acl_store`.
    #[must_use]
    pub fn new(policy_store: impl PolicyStore, acl_store: impl AclStore) -> Self {
        Self::from_shared(Arc::new(policy_store), Arc::new(acl_store))
    }

    /// Like [`new`](Self::new), for stores that are shared with other components.
    #[must_use]
    pub fn from_shared(policy_store: Arc<dyn PolicyStore>, acl_store: Arc<dyn AclStore>) -> Self {
        Self {
            policy_store,
            acl_store,
            parser: None,
            config: None,
        }
    }

    /// Sets the policy document parser.
    ///
    /// If not set, defaults to [`JsonPolicyParser`].
    pub fn set_parser(&mut self, parser: impl PolicyParser) {
        self.parser = Some(Arc::new(parser));
    }

    /// Sets the configuration provider.
    ///
    /// If not set, defaults to [`StaticConfigProvider::default()`].
    pub fn set_config(&mut self, config: Arc<dyn AuthzConfigProvider>) {
        self.config = Some(config);
    }

    #[must_use]
    pub fn build(self) -> Authorizer {
        let parser = self.parser.unwrap_or_else(|| Arc::new(JsonPolicyParser));
        let config = self.config.unwrap_or_else(|| Arc::new(StaticConfigProvider::default()));
        Authorizer {
            policies: PolicyCache::new(self.policy_store, parser, config),
            acl_store: self.acl_store,
        }
    }
}

/// Authorizes S3 requests against bucket policies and ACLs.
///
/// An `Authorizer` is cheap to share behind an `Arc`: every method takes `&self`.
pub struct Authorizer {
    policies: PolicyCache,
    acl_store: Arc<dyn AclStore>,
}

impl Authorizer {
    /// Decides whether `requester` may perform the request described by `cx`.
    ///
    /// `target` is the resource whose ACL is consulted when the bucket policy is silent, and
    /// `requested` is the ACL permission the operation needs. An empty `requester` is an
    /// anonymous request.
    ///
    /// # Errors
    /// Returns [`PermissionDenied`] if the policy denies the request, or if the policy is
    /// silent and the ACL does not grant `requested`.
    #[tracing::instrument(
        level = "debug",
        skip(self, cx),
        fields(bucket = cx.bucket(), key = cx.key(), action = %cx.action()),
    )]
    pub async fn authorize(
        &self,
        cx: &PolicyContext,
        requester: &str,
        target: &AclTarget,
        requested: Permission,
    ) -> Result<(), PermissionDenied> {
        let allowed = match self.verify_policy(cx, requester).await {
            EvalResult::Allow => true,
            EvalResult::Deny => false,
            EvalResult::DefaultDeny => self.check_acl(target, requester, requested).await,
        };

        if allowed {
            Ok(())
        } else {
            debug!("permission denied");
            Err(PermissionDenied {
                bucket: cx.bucket().to_owned(),
                key: cx.key().map(str::to_owned),
                action: cx.action(),
            })
        }
    }

    /// Evaluates the bucket policy only, without any ACL fallback.
    ///
    /// A bucket without a usable policy yields [`EvalResult::DefaultDeny`].
    pub async fn verify_policy(&self, cx: &PolicyContext, requester: &str) -> EvalResult {
        let result = match self.policies.get(cx.bucket()).await {
            Some(policy) => policy.eval(cx, requester),
            None => EvalResult::DefaultDeny,
        };
        debug!(bucket = cx.bucket(), action = %cx.action(), %requester, %result, "evaluated bucket policy");
        result
    }

    /// Checks the ACL of `target` for `requester`.
    ///
    /// [`Permission::PASS`] succeeds without reading any grant. A store failure is logged
    /// and fails the check.
    pub async fn check_acl(&self, target: &AclTarget, requester: &str, requested: Permission) -> bool {
        if requested.is_pass() {
            return true;
        }

        for grantee in Grantee::lookup_order(requester) {
            match self.acl_store.list_grants(target, &grantee).await {
                Ok(grants) => {
                    if permission_granted(&grants, requested) {
                        debug!(?target, ?grantee, %requested, "granted by acl");
                        return true;
                    }
                }
                Err(err) => {
                    warn!(?target, ?grantee, %err, "failed to list acl grants");
                    return false;
                }
            }
        }
        false
    }

    /// Drops the cached policy of `bucket`.
    ///
    /// Call this after putting or deleting the bucket policy.
    pub fn invalidate_policy(&self, bucket: &str) {
        self.policies.invalidate(bucket);
    }

    #[must_use]
    pub fn policy_cache(&self) -> &PolicyCache {
        &self.policies
    }
}

impl fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorizer")
            .field("policies", &self.policies)
            .finish_non_exhaustive()
    }
}
