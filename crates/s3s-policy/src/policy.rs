//! Bucket policies

use crate::context::PolicyContext;
use crate::error::PolicyError;
use crate::statement::{Effect, Statement};

use std::fmt;

use tracing::trace;

/// The result of evaluating a whole policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvalResult {
    Allow,
    Deny,
    /// No statement decided the request. Callers fall back to ACLs.
    DefaultDeny,
}

impl From<Effect> for EvalResult {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Allow => Self::Allow,
            Effect::Deny => Self::Deny,
        }
    }
}

impl fmt::Display for EvalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
            Self::DefaultDeny => "DefaultDeny",
        })
    }
}

/// The ordered statements attached to one bucket.
///
/// A policy is immutable once built, so a single instance can be shared by every
/// concurrent evaluation against its bucket.
#[derive(Debug, Clone)]
pub struct BucketPolicy {
    bucket: String,
    id: Option<String>,
    statements: Vec<Statement>,
}

impl BucketPolicy {
    /// Builds a policy, verifying every statement.
    ///
    /// # Errors
    /// Returns the first statement verification error.
    pub fn new(bucket: impl Into<String>, id: Option<String>, statements: Vec<Statement>) -> Result<Self, PolicyError> {
        for statement in &statements {
            statement.verify()?;
        }
        Ok(Self {
            bucket: bucket.into(),
            id,
            statements,
        })
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Evaluates the policy for `requester` (an empty id means anonymous).
    ///
    /// Statements are walked in document order. A matching `Deny` returns immediately;
    /// a matching `Allow` overwrites the running result. When nothing matches the result
    /// is [`EvalResult::DefaultDeny`].
    #[must_use]
    pub fn eval(&self, cx: &PolicyContext, requester: &str) -> EvalResult {
        let mut result = EvalResult::DefaultDeny;
        for statement in &self.statements {
            let Some(effect) = statement.applies(cx, requester) else { continue };
            trace!(
                bucket = %self.bucket,
                sid = statement.sid.as_deref().unwrap_or_default(),
                %effect,
                "statement matched"
            );
            result = effect.into();
            if result == EvalResult::Deny {
                return result;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::action::{Action, ActionSet};
    use crate::condition::{Condition, ConditionBlock, ConditionKey};
    use crate::principal::PrincipalSet;
    use crate::statement::Resource;

    fn statement(sid: &str, effect: Effect, action: Action, resource: &str) -> Statement {
        Statement {
            sid: Some(sid.into()),
            effect: Some(effect),
            principals: Some(PrincipalSet::any()),
            actions: Some(ActionSet::new(vec![action])),
            not_action: None,
            resource: Some(Resource::new(resource).unwrap()),
            conditions: None,
        }
    }

    fn get(key: &str) -> PolicyContext {
        PolicyContext::new(Action::GetObject, "my-bucket").with_key(key)
    }

    #[test]
    fn new_verifies_statements() {
        let mut bad = statement("s", Effect::Allow, Action::GetObject, "b/*");
        bad.effect = None;
        assert!(BucketPolicy::new("b", None, vec![bad]).is_err());
    }

    #[test]
    fn empty_policy_is_default_deny() {
        let p = BucketPolicy::new("my-bucket", None, vec![]).unwrap();
        assert_eq!(p.eval(&get("k"), "alice"), EvalResult::DefaultDeny);
    }

    #[test]
    fn deny_wins_in_any_position() {
        let allow = statement("allow", Effect::Allow, Action::GetObject, "my-bucket/*");
        let deny = statement("deny", Effect::Deny, Action::GetObject, "my-bucket/secret/*");

        let p = BucketPolicy::new("my-bucket", None, vec![allow.clone(), deny.clone()]).unwrap();
        assert_eq!(p.eval(&get("secret/key.pem"), "alice"), EvalResult::Deny);
        assert_eq!(p.eval(&get("readme.txt"), "alice"), EvalResult::Allow);

        let p = BucketPolicy::new("my-bucket", None, vec![deny, allow]).unwrap();
        assert_eq!(p.eval(&get("secret/key.pem"), "alice"), EvalResult::Deny);
        assert_eq!(p.eval(&get("readme.txt"), "alice"), EvalResult::Allow);
    }

    #[test]
    fn later_allow_overwrites_earlier_allow() {
        let a = statement("a", Effect::Allow, Action::GetObject, "my-bucket/*");
        let b = statement("b", Effect::Allow, Action::GetObject, "my-bucket/k");
        let p = BucketPolicy::new("my-bucket", Some("policy-1".into()), vec![a, b]).unwrap();
        assert_eq!(p.id(), Some("policy-1"));
        assert_eq!(p.eval(&get("k"), "alice"), EvalResult::Allow);
    }

    #[test]
    fn unsatisfied_deny_does_not_apply() {
        let allow = statement("allow", Effect::Allow, Action::GetObject, "my-bucket/*");
        let mut deny = statement("deny", Effect::Deny, Action::GetObject, "my-bucket/*");
        deny.conditions = Some(ConditionBlock::new(vec![Condition::from_operator(
            "Bool",
            [(ConditionKey::SecureTransport, vec!["false".to_owned()])],
        )
        .unwrap()]));
        let p = BucketPolicy::new("my-bucket", None, vec![deny, allow]).unwrap();
        // without a secure transport the Bool condition is false, so only Allow matches
        assert_eq!(p.eval(&get("k"), "alice"), EvalResult::Allow);
    }

    #[test]
    fn unrelated_action_is_default_deny() {
        let allow = statement("allow", Effect::Allow, Action::GetObject, "my-bucket/*");
        let p = BucketPolicy::new("my-bucket", None, vec![allow]).unwrap();
        let cx = PolicyContext::new(Action::DeleteBucket, "my-bucket");
        assert_eq!(p.eval(&cx, "alice"), EvalResult::DefaultDeny);
    }
}
