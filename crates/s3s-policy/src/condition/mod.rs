//! Policy conditions
//!
//! A [`Condition`] is one operator (e.g. `StringEquals`) applied to a map of condition keys,
//! each with one or more comparison values:
//!
//! ```json
//! "StringEquals": { "s3:x-amz-acl": ["public-read", "authenticated-read"] }
//! ```
//!
//! Evaluation is AND across keys and OR across the values of one key. A condition with no
//! keys is malformed and never satisfied. A [`ConditionBlock`] combines conditions with AND
//! and is vacuously true when empty.

mod key;
pub use self::key::ConditionKey;

use crate::context::PolicyContext;
use crate::error::PolicyError;
use crate::pattern::WildcardPattern;

use std::fmt;
use std::net::IpAddr;

use indexmap::IndexMap;
use ipnetwork::IpNetwork;
use time::format_description::well_known::Iso8601;
use time::{Date, OffsetDateTime};
use tracing::warn;

/// Typed comparison values, keyed by condition key in document order.
pub type KeyValues<T> = IndexMap<ConditionKey, Vec<T>>;

/// String family operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringOp {
    Equals,
    NotEquals,
    EqualsIgnoreCase,
    NotEqualsIgnoreCase,
    Like,
    NotLike,
}

/// Ordering operators shared by the numeric and date families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equals,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
}

/// IP address family operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpOp {
    IpAddress,
    NotIpAddress,
}

/// ARN family operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArnOp {
    Equals,
    NotEquals,
    Like,
    NotLike,
}

/// A condition operator, as named in a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    String(StringOp),
    Numeric(CompareOp),
    Date(CompareOp),
    Bool,
    Ip(IpOp),
    Arn(ArnOp),
}

impl Operator {
    /// Looks up an operator by name. Matching is case-sensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "StringEquals" => Self::String(StringOp::Equals),
            "StringNotEquals" => Self::String(StringOp::NotEquals),
            "StringEqualsIgnoreCase" => Self::String(StringOp::EqualsIgnoreCase),
            "StringNotEqualsIgnoreCase" => Self::String(StringOp::NotEqualsIgnoreCase),
            "StringLike" => Self::String(StringOp::Like),
            "StringNotLike" => Self::String(StringOp::NotLike),
            "NumericEquals" => Self::Numeric(CompareOp::Equals),
            "NumericNotEquals" => Self::Numeric(CompareOp::NotEquals),
            "NumericLessThan" => Self::Numeric(CompareOp::LessThan),
            "NumericLessThanEquals" => Self::Numeric(CompareOp::LessThanEquals),
            "NumericGreaterThan" => Self::Numeric(CompareOp::GreaterThan),
            "NumericGreaterThanEquals" => Self::Numeric(CompareOp::GreaterThanEquals),
            "DateEquals" => Self::Date(CompareOp::Equals),
            "DateNotEquals" => Self::Date(CompareOp::NotEquals),
            "DateLessThan" => Self::Date(CompareOp::LessThan),
            "DateLessThanEquals" => Self::Date(CompareOp::LessThanEquals),
            "DateGreaterThan" => Self::Date(CompareOp::GreaterThan),
            "DateGreaterThanEquals" => Self::Date(CompareOp::GreaterThanEquals),
            "Bool" => Self::Bool,
            "IpAddress" => Self::Ip(IpOp::IpAddress),
            "NotIpAddress" => Self::Ip(IpOp::NotIpAddress),
            "ArnEquals" => Self::Arn(ArnOp::Equals),
            "ArnNotEquals" => Self::Arn(ArnOp::NotEquals),
            "ArnLike" => Self::Arn(ArnOp::Like),
            "ArnNotLike" => Self::Arn(ArnOp::NotLike),
            _ => return None,
        };
        Some(op)
    }
}

impl CompareOp {
    fn apply<T: PartialOrd>(self, lhs: &T, rhs: &T) -> bool {
        match self {
            Self::Equals => lhs == rhs,
            Self::NotEquals => lhs != rhs,
            Self::LessThan => lhs < rhs,
            Self::LessThanEquals => lhs <= rhs,
            Self::GreaterThan => lhs > rhs,
            Self::GreaterThanEquals => lhs >= rhs,
        }
    }
}

/// A string comparison value; `*Like` operators carry a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringOperand {
    Literal(String),
    Pattern(WildcardPattern),
}

impl StringOperand {
    fn new(raw: String, like: bool) -> Result<Self, PolicyError> {
        Ok(if like {
            Self::Pattern(WildcardPattern::new(raw)?)
        } else {
            Self::Literal(raw)
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) => s,
            Self::Pattern(p) => p.as_str(),
        }
    }

    fn is_match(&self, actual: &str) -> bool {
        match self {
            Self::Literal(s) => s == actual,
            Self::Pattern(p) => p.is_match(actual),
        }
    }
}

/// One operator applied to a set of keys.
///
/// Conditions are immutable once built and can be shared across threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    String { op: StringOp, keys: KeyValues<StringOperand> },
    Numeric { op: CompareOp, keys: KeyValues<f64> },
    Date { op: CompareOp, keys: KeyValues<OffsetDateTime> },
    Bool { keys: KeyValues<String> },
    IpAddress { op: IpOp, keys: KeyValues<IpNetwork> },
    Arn { op: ArnOp, keys: KeyValues<StringOperand> },
    /// An operator outside of the catalog. Never satisfied.
    Unknown { operator: String },
}

impl Condition {
    /// Builds a condition from an operator name and raw string values.
    ///
    /// Unknown operator names yield [`Condition::Unknown`]. Values that cannot be converted
    /// to the family's type are dropped with a warning, so they can never satisfy the key.
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidPattern`] if a `*Like` value cannot be compiled.
    pub fn from_operator<I, V>(operator: &str, raw: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (ConditionKey, V)>,
        V: IntoIterator<Item = String>,
    {
        match Operator::from_name(operator) {
            Some(op) => Self::new(op, raw),
            None => {
                warn!(%operator, "unknown condition operator");
                Ok(Self::Unknown {
                    operator: operator.to_owned(),
                })
            }
        }
    }

    /// Builds a condition for a known operator.
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidPattern`] if a `*Like` value cannot be compiled.
    pub fn new<I, V>(op: Operator, raw: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (ConditionKey, V)>,
        V: IntoIterator<Item = String>,
    {
        let cond = match op {
            Operator::String(op) => {
                let like = matches!(op, StringOp::Like | StringOp::NotLike);
                Self::String {
                    op,
                    keys: convert(raw, |_, v| StringOperand::new(v, like).map(Some))?,
                }
            }
            Operator::Numeric(op) => Self::Numeric {
                op,
                keys: convert(raw, |_, v| Ok(parse_number(&v)))?,
            },
            Operator::Date(op) => Self::Date {
                op,
                keys: convert(raw, |k, v| Ok(parse_date(k, &v)))?,
            },
            Operator::Bool => Self::Bool {
                keys: convert(raw, |_, v| Ok(Some(v)))?,
            },
            Operator::Ip(op) => Self::IpAddress {
                op,
                keys: convert(raw, |_, v| Ok(parse_network(&v)))?,
            },
            Operator::Arn(op) => {
                let like = matches!(op, ArnOp::Like | ArnOp::NotLike);
                Self::Arn {
                    op,
                    keys: convert(raw, |_, v| StringOperand::new(v, like).map(Some))?,
                }
            }
        };
        Ok(cond)
    }

    /// Returns `true` if the request satisfies the condition.
    #[must_use]
    pub fn is_true(&self, cx: &PolicyContext) -> bool {
        match self {
            Self::String { op, keys } => each_key(keys, |key, values| {
                let Some(actual) = cx.value(key) else { return false };
                values.iter().any(|v| eval_string(*op, &actual, v))
            }),
            Self::Numeric { op, keys } => each_key(keys, |key, values| {
                let Some(actual) = cx.value(key).and_then(|v| parse_number(&v)) else {
                    return false;
                };
                values.iter().any(|v| op.apply(&actual, v))
            }),
            Self::Date { op, keys } => each_key(keys, |key, values| {
                // The stored dates are compared against the evaluation instant, the
                // context value only has to be present.
                if cx.value(key).is_none() {
                    return false;
                }
                let now = cx.now();
                values.iter().any(|v| op.apply(&now, v))
            }),
            Self::Bool { keys } => each_key(keys, |key, values| {
                if key != ConditionKey::SecureTransport {
                    return false;
                }
                values.iter().any(|_| cx.is_secure())
            }),
            Self::IpAddress { op, keys } => each_key(keys, |key, values| {
                if key != ConditionKey::SourceIp {
                    return false;
                }
                let Some(ip) = cx.remote_ip() else { return false };
                values.iter().any(|net| match op {
                    IpOp::IpAddress => net.contains(ip),
                    IpOp::NotIpAddress => !net.contains(ip),
                })
            }),
            Self::Arn { op, keys } => each_key(keys, |key, values| {
                let Some(actual) = cx.value(key) else { return false };
                values.iter().any(|v| match op {
                    ArnOp::Equals => v.as_str() == actual,
                    ArnOp::NotEquals => v.as_str() != actual,
                    ArnOp::Like => v.is_match(&actual),
                    ArnOp::NotLike => !v.is_match(&actual),
                })
            }),
            Self::Unknown { .. } => false,
        }
    }

    /// Returns `true` if the condition has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String { keys, .. } | Self::Arn { keys, .. } => keys.is_empty(),
            Self::Numeric { keys, .. } => keys.is_empty(),
            Self::Date { keys, .. } => keys.is_empty(),
            Self::Bool { keys } => keys.is_empty(),
            Self::IpAddress { keys, .. } => keys.is_empty(),
            Self::Unknown { .. } => true,
        }
    }
}

fn eval_string(op: StringOp, actual: &str, operand: &StringOperand) -> bool {
    match op {
        StringOp::Equals => operand.as_str() == actual,
        StringOp::NotEquals => operand.as_str() != actual,
        StringOp::EqualsIgnoreCase => eq_ignore_case(operand.as_str(), actual),
        StringOp::NotEqualsIgnoreCase => !eq_ignore_case(operand.as_str(), actual),
        StringOp::Like => operand.is_match(actual),
        StringOp::NotLike => !operand.is_match(actual),
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// AND across keys, with an empty key set failing.
fn each_key<T>(keys: &KeyValues<T>, mut check: impl FnMut(ConditionKey, &[T]) -> bool) -> bool {
    !keys.is_empty() && keys.iter().all(|(key, values)| check(*key, values))
}

fn convert<T, I, V>(
    raw: I,
    mut f: impl FnMut(ConditionKey, String) -> Result<Option<T>, PolicyError>,
) -> Result<KeyValues<T>, PolicyError>
where
    I: IntoIterator<Item = (ConditionKey, V)>,
    V: IntoIterator<Item = String>,
{
    let mut keys: KeyValues<T> = IndexMap::new();
    for (key, values) in raw {
        let slot = keys.entry(key).or_default();
        for value in values {
            match f(key, value.clone())? {
                Some(v) => slot.push(v),
                None => warn!(%key, %value, "dropping unparsable condition value"),
            }
        }
    }
    Ok(keys)
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

fn parse_date(key: ConditionKey, s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();
    if key == ConditionKey::EpochTime {
        let secs = s.parse::<i64>().ok()?;
        return OffsetDateTime::from_unix_timestamp(secs).ok();
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Iso8601::DEFAULT) {
        return Some(dt);
    }
    Date::parse(s, &Iso8601::DEFAULT).ok().map(|d| d.midnight().assume_utc())
}

fn parse_network(s: &str) -> Option<IpNetwork> {
    let s = s.trim();
    s.parse::<IpNetwork>()
        .ok()
        .or_else(|| s.parse::<IpAddr>().ok().map(IpNetwork::from))
}

/// A statement's `Condition` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionBlock(Vec<Condition>);

impl ConditionBlock {
    #[must_use]
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self(conditions)
    }

    /// AND over all conditions. An empty block is true.
    #[must_use]
    pub fn is_true(&self, cx: &PolicyContext) -> bool {
        self.0.iter().all(|c| c.is_true(cx))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }
}

impl FromIterator<Condition> for ConditionBlock {
    fn from_iter<T: IntoIterator<Item = Condition>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ConditionBlock {
    type Item = &'a Condition;
    type IntoIter = std::slice::Iter<'a, Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let family = match self {
            Self::String(op) => return write!(f, "String{op:?}"),
            Self::Numeric(op) => return write!(f, "Numeric{op:?}"),
            Self::Date(op) => return write!(f, "Date{op:?}"),
            Self::Bool => "Bool",
            Self::Ip(IpOp::IpAddress) => "IpAddress",
            Self::Ip(IpOp::NotIpAddress) => "NotIpAddress",
            Self::Arn(op) => return write!(f, "Arn{op:?}"),
        };
        f.write_str(family)
    }
}
