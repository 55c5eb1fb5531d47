//! JSON policy documents
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/userguide/access-policy-language-overview.html>
//!
//! Only the subset of the grammar that the evaluator understands is accepted. In particular
//! `NotAction` and `Resource` hold a single value each.

use crate::action::{Action, ActionSet};
use crate::condition::{Condition, ConditionBlock, ConditionKey};
use crate::error::PolicyError;
use crate::policy::BucketPolicy;
use crate::principal::PrincipalSet;
use crate::statement::{Effect, Resource, Statement};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::warn;

/// Options for [`parse_policy`].
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct ParseOptions {
    /// Drop statements that fail verification instead of rejecting the whole document.
    pub skip_malformed_statements: bool,
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn skip_malformed_statements(mut self, skip: bool) -> Self {
        self.skip_malformed_statements = skip;
        self
    }
}

/// Parses a JSON bucket policy document for `bucket`.
///
/// # Errors
/// Returns an error if the text is not a policy document, or if a statement fails
/// verification and `options.skip_malformed_statements` is not set.
///
/// # Example
/// ```
/// use s3s_policy::{Action, EvalResult, ParseOptions, PolicyContext, parse_policy};
///
/// let text = r#"{
///     "Statement": [{
///         "Sid": "PublicRead",
///         "Effect": "Allow",
///         "Principal": "*",
///         "Action": "s3:GetObject",
///         "Resource": "arn:aws:s3:::my-bucket/*"
///     }]
/// }"#;
/// let policy = parse_policy(text, "my-bucket", &ParseOptions::default()).unwrap();
///
/// let cx = PolicyContext::new(Action::GetObject, "my-bucket").with_key("readme.txt");
/// assert_eq!(policy.eval(&cx, ""), EvalResult::Allow);
/// ```
pub fn parse_policy(text: &str, bucket: &str, options: &ParseOptions) -> Result<BucketPolicy, PolicyError> {
    let doc: RawDocument = serde_json::from_str(text)?;
    let Some(raw_statements) = doc.statement else {
        return Err(PolicyError::EmptyStatementList);
    };
    let raw_statements = raw_statements.into_vec();
    if raw_statements.is_empty() {
        return Err(PolicyError::EmptyStatementList);
    }

    let mut statements = Vec::with_capacity(raw_statements.len());
    for (index, raw) in raw_statements.into_iter().enumerate() {
        let sid = raw.sid.clone();
        match raw.into_statement().and_then(|s| s.verify().map(|()| s)) {
            Ok(statement) => statements.push(statement),
            Err(err) if options.skip_malformed_statements => {
                warn!(%bucket, index, ?sid, %err, "dropping malformed policy statement");
            }
            Err(err) => return Err(err),
        }
    }

    BucketPolicy::new(bucket, doc.id, statements)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(v) => v,
            Self::One(x) => vec![x],
        }
    }

    fn into_single(self, err: PolicyError) -> Result<T, PolicyError> {
        let mut v = self.into_vec();
        if v.len() == 1 {
            Ok(v.remove(0))
        } else {
            Err(err)
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawDocument {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    statement: Option<OneOrMany<RawStatement>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrincipal {
    Single(String),
    Map(IndexMap<String, OneOrMany<String>>),
}

impl RawPrincipal {
    fn into_set(self) -> PrincipalSet {
        match self {
            Self::Single(id) => [id].into_iter().collect(),
            // `AWS`, `CanonicalUser`, ...: ids from every member are accepted.
            Self::Map(map) => map.into_values().flat_map(OneOrMany::into_vec).collect(),
        }
    }
}

type RawConditions = IndexMap<String, IndexMap<String, OneOrMany<serde_json::Value>>>;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawStatement {
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    effect: Option<String>,
    #[serde(default)]
    principal: Option<RawPrincipal>,
    #[serde(default)]
    action: Option<OneOrMany<String>>,
    #[serde(default)]
    not_action: Option<OneOrMany<String>>,
    #[serde(default)]
    resource: Option<OneOrMany<String>>,
    #[serde(default)]
    condition: Option<RawConditions>,
}

impl RawStatement {
    fn into_statement(self) -> Result<Statement, PolicyError> {
        let effect = self.effect.as_deref().map(str::parse::<Effect>).transpose()?;

        let not_action = match self.not_action {
            Some(v) => Some(Action::from_name(&v.into_single(PolicyError::MultipleNotActions)?)),
            None => None,
        };

        let resource = match self.resource {
            Some(v) => Some(Resource::new(&v.into_single(PolicyError::MultipleResources)?)?),
            None => None,
        };

        let conditions = match self.condition {
            Some(raw) => Some(convert_conditions(raw)?),
            None => None,
        };

        Ok(Statement {
            sid: self.sid,
            effect,
            principals: self.principal.map(RawPrincipal::into_set),
            actions: self.action.map(|a| ActionSet::from_names(a.into_vec())),
            not_action,
            resource,
            conditions,
        })
    }
}

fn convert_conditions(raw: RawConditions) -> Result<ConditionBlock, PolicyError> {
    let mut block = Vec::with_capacity(raw.len());
    for (operator, keys) in raw {
        let mut entries = Vec::with_capacity(keys.len());
        for (key, values) in keys {
            let values = values
                .into_vec()
                .into_iter()
                .map(value_to_string)
                .collect::<Result<Vec<_>, _>>()?;
            entries.push((ConditionKey::from_name(&key), values));
        }
        block.push(Condition::from_operator(&operator, entries)?);
    }
    Ok(ConditionBlock::new(block))
}

fn value_to_string(value: serde_json::Value) -> Result<String, PolicyError> {
    use serde_json::Value;

    match value {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(PolicyError::InvalidValue { element: "Condition" }),
    }
}
