//! S3 Policy Language
//!
//! `s3s-policy` models and evaluates S3 bucket policies. A [`BucketPolicy`] is an ordered list
//! of [`Statement`]s; evaluating it against a [`PolicyContext`] yields an [`EvalResult`].
//!
//! # Evaluation
//!
//! A statement matches a request when all of the following hold:
//!
//! - its principal set names the requester or contains `"*"`
//! - its action set contains the requested [`Action`] (or its `NotAction` excludes some other action)
//! - its resource pattern matches `bucket` or `bucket/key` in full
//! - every condition in its condition block is satisfied
//!
//! Statements are walked in document order. A matching `Deny` ends evaluation immediately.
//! Otherwise the last matching effect wins, and [`EvalResult::DefaultDeny`] means that no
//! statement spoke about the request, so that the caller can fall back to ACLs.
//!
//! # Example
//!
//! ```
//! use s3s_policy::{Action, ConditionKey, EvalResult, ParseOptions, PolicyContext, parse_policy};
//!
//! let text = r#"{
//!     "Statement": [
//!         {
//!             "Sid": "ReadOnlyV1",
//!             "Effect": "Allow",
//!             "Principal": {"AWS": "alice"},
//!             "Action": "s3:GetObject",
//!             "Resource": "arn:aws:s3:::photos/*",
//!             "Condition": {"StringEquals": {"s3:VersionId": "v1"}}
//!         }
//!     ]
//! }"#;
//! let policy = parse_policy(text, "photos", &ParseOptions::default()).unwrap();
//!
//! let cx = PolicyContext::new(Action::GetObject, "photos")
//!     .with_key("cat.png")
//!     .with_param(ConditionKey::VersionId, "v1");
//! assert_eq!(policy.eval(&cx, "alice"), EvalResult::Allow);
//! assert_eq!(policy.eval(&cx, "bob"), EvalResult::DefaultDeny);
//! ```
//!
//! # Modules
//!
//! - [`condition`]: Condition operators, keys and blocks

#![allow(
    clippy::bool_assert_comparison,  // I don't like `assert!(!expression)`. It's very misleading.
    clippy::module_name_repetitions,
    clippy::single_match_else,
    clippy::float_cmp,
)]

mod action;
mod context;
mod document;
mod error;
mod pattern;
mod policy;
mod principal;
mod statement;

pub mod condition;

pub use self::action::{Action, ActionSet};
pub use self::condition::{Condition, ConditionBlock, ConditionKey, Operator};
pub use self::context::{PolicyContext, RequestFacts, TransportFacts};
pub use self::document::{ParseOptions, parse_policy};
pub use self::error::PolicyError;
pub use self::pattern::WildcardPattern;
pub use self::policy::{BucketPolicy, EvalResult};
pub use self::principal::PrincipalSet;
pub use self::statement::{Effect, Resource, Statement};
