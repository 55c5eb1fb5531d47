//! Policy statements

use crate::action::{Action, ActionSet};
use crate::condition::ConditionBlock;
use crate::context::PolicyContext;
use crate::error::PolicyError;
use crate::pattern::WildcardPattern;
use crate::principal::PrincipalSet;

use std::fmt;
use std::str::FromStr;

/// The outcome a matching statement asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

impl FromStr for Effect {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Allow" => Ok(Self::Allow),
            "Deny" => Ok(Self::Deny),
            _ => Err(PolicyError::InvalidEffect(s.to_owned())),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource pattern and its compiled form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pattern: WildcardPattern,
}

impl Resource {
    /// The ARN prefix accepted in front of S3 resources.
    pub const S3_ARN_PREFIX: &'static str = "arn:aws:s3:::";

    /// Compiles a `bucket[/key]` pattern. A leading `arn:aws:s3:::` is stripped.
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidPattern`] if the pattern cannot be compiled.
    pub fn new(pattern: &str) -> Result<Self, PolicyError> {
        let pattern = pattern.strip_prefix(Self::S3_ARN_PREFIX).unwrap_or(pattern);
        Ok(Self {
            pattern: WildcardPattern::new(pattern)?,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

/// One rule of a bucket policy.
///
/// Every element is optional at construction so that documents can be represented as
/// written; [`Statement::verify`] rejects statements that lack a required element.
#[derive(Debug, Clone, Default)]
pub struct Statement {
    pub sid: Option<String>,
    pub effect: Option<Effect>,
    pub principals: Option<PrincipalSet>,
    pub actions: Option<ActionSet>,
    /// A single excluded action. The statement applies to every other action.
    pub not_action: Option<Action>,
    pub resource: Option<Resource>,
    pub conditions: Option<ConditionBlock>,
}

impl Statement {
    /// Checks that every required element is present.
    ///
    /// # Errors
    /// Returns [`PolicyError::MissingElement`] naming the first absent element, or
    /// [`PolicyError::BothActionAndNotAction`].
    pub fn verify(&self) -> Result<(), PolicyError> {
        if self.sid.is_none() {
            return Err(PolicyError::MissingElement("Sid"));
        }
        if self.effect.is_none() {
            return Err(PolicyError::MissingElement("Effect"));
        }
        if self.principals.is_none() {
            return Err(PolicyError::MissingElement("Principal"));
        }
        match (&self.actions, &self.not_action) {
            (None, None) => return Err(PolicyError::MissingElement("Action")),
            (Some(_), Some(_)) => return Err(PolicyError::BothActionAndNotAction),
            _ => {}
        }
        if self.resource.is_none() {
            return Err(PolicyError::MissingElement("Resource"));
        }
        Ok(())
    }

    /// Returns `true` if the statement speaks about this request at all:
    /// the principal, the action and the resource all match.
    #[must_use]
    pub fn is_relevant(&self, cx: &PolicyContext, requester: &str) -> bool {
        let Some(principals) = &self.principals else { return false };
        if !principals.contains(requester) {
            return false;
        }

        let action = cx.action();
        match self.not_action {
            Some(not_action) if not_action != Action::UnknownAction => {
                if not_action == action {
                    return false;
                }
            }
            _ => {
                if !self.actions.as_ref().is_some_and(|set| set.contains(action)) {
                    return false;
                }
            }
        }

        let Some(resource) = &self.resource else { return false };
        resource.is_match(&cx.resource_path())
    }

    /// Returns `true` if the condition block holds; an absent block holds vacuously.
    #[must_use]
    pub fn is_satisfied(&self, cx: &PolicyContext) -> bool {
        self.conditions.as_ref().is_none_or(|block| block.is_true(cx))
    }

    /// The effect this statement asserts for the request, if it applies.
    #[must_use]
    pub fn applies(&self, cx: &PolicyContext, requester: &str) -> Option<Effect> {
        if self.is_relevant(cx, requester) && self.is_satisfied(cx) {
            self.effect
        } else {
            None
        }
    }
}
