//! Integration tests for bucket policy evaluation

use s3s_policy::{Action, ConditionKey, EvalResult, PolicyContext, RequestFacts};
use s3s_policy::{ParseOptions, PolicyError, WildcardPattern, parse_policy};

use std::sync::Arc;

use http::HeaderMap;
use http::header::{REFERER, USER_AGENT};
use time::macros::datetime;

const PUBLIC_READ: &str = r#"{
    "Version": "2012-10-17",
    "Statement": [
        {
            "Sid": "PublicRead",
            "Effect": "Allow",
            "Principal": "*",
            "Action": "s3:GetObject",
            "Resource": "arn:aws:s3:::my-bucket/*"
        }
    ]
}"#;

const PUBLIC_READ_EXCEPT_SECRETS: &str = r#"{
    "Version": "2012-10-17",
    "Statement": [
        {
            "Sid": "PublicRead",
            "Effect": "Allow",
            "Principal": "*",
            "Action": "s3:GetObject",
            "Resource": "arn:aws:s3:::my-bucket/*"
        },
        {
            "Sid": "HideSecrets",
            "Effect": "Deny",
            "Principal": "*",
            "Action": "s3:GetObject",
            "Resource": "arn:aws:s3:::my-bucket/secret/*"
        }
    ]
}"#;

fn parse(text: &str) -> s3s_policy::BucketPolicy {
    parse_policy(text, "my-bucket", &ParseOptions::default()).unwrap()
}

fn get(key: &str) -> PolicyContext {
    PolicyContext::new(Action::GetObject, "my-bucket").with_key(key)
}

#[test]
fn test_public_read() {
    let policy = parse(PUBLIC_READ);
    assert_eq!(policy.eval(&get("readme.txt"), "alice"), EvalResult::Allow);
    assert_eq!(policy.eval(&get("readme.txt"), ""), EvalResult::Allow);
    assert_eq!(policy.eval(&get("a/b/c.txt"), "bob"), EvalResult::Allow);
}

#[test]
fn test_deny_overrides_allow() {
    let policy = parse(PUBLIC_READ_EXCEPT_SECRETS);
    assert_eq!(policy.eval(&get("secret/key.pem"), "alice"), EvalResult::Deny);
    assert_eq!(policy.eval(&get("public/key.pem"), "alice"), EvalResult::Allow);
}

#[test]
fn test_silent_policy_is_default_deny() {
    let policy = parse(PUBLIC_READ_EXCEPT_SECRETS);
    let cx = PolicyContext::new(Action::DeleteBucket, "my-bucket");
    assert_eq!(policy.eval(&cx, "alice"), EvalResult::DefaultDeny);
}

#[test]
fn test_resource_requires_full_match() {
    let policy = parse(PUBLIC_READ);
    let cx = PolicyContext::new(Action::GetObject, "other-bucket").with_key("x");
    assert_eq!(policy.eval(&cx, "alice"), EvalResult::DefaultDeny);

    // a bucket-level request has no key, so `my-bucket/*` does not cover it
    let cx = PolicyContext::new(Action::GetObject, "my-bucket");
    assert_eq!(policy.eval(&cx, "alice"), EvalResult::DefaultDeny);
}

#[test]
fn test_string_condition_on_acl_param() {
    let policy = parse(
        r#"{
        "Statement": [{
            "Sid": "PublicUploads",
            "Effect": "Allow",
            "Principal": "*",
            "Action": "s3:PutObject",
            "Resource": "my-bucket/*",
            "Condition": {"StringEquals": {"s3:x-amz-acl": "public-read"}}
        }]
    }"#,
    );

    let put = PolicyContext::new(Action::PutObject, "my-bucket").with_key("photo.png");

    let private = put.clone().with_param(ConditionKey::Acl, "private");
    assert_eq!(policy.eval(&private, "alice"), EvalResult::DefaultDeny);

    let public = put.clone().with_param(ConditionKey::Acl, "public-read");
    assert_eq!(policy.eval(&public, "alice"), EvalResult::Allow);

    // no parameter at all fails closed
    assert_eq!(policy.eval(&put, "alice"), EvalResult::DefaultDeny);
}

#[test]
fn test_wildcard_round_trip() {
    let star = WildcardPattern::new("my-bucket/*.txt").unwrap();
    assert!(star.is_match("my-bucket/.txt"));
    assert!(star.is_match("my-bucket/notes/today.txt"));
    assert!(!star.is_match("my-bucket/notes.txt.bak"));

    let question = WildcardPattern::new("my-bucket/log-?.gz").unwrap();
    assert!(question.is_match("my-bucket/log-1.gz"));
    assert!(!question.is_match("my-bucket/log-.gz"));
    assert!(!question.is_match("my-bucket/log-12.gz"));

    let literal = WildcardPattern::new("my-bucket/a+b(c).txt").unwrap();
    assert!(literal.is_match("my-bucket/a+b(c).txt"));
    assert!(!literal.is_match("my-bucket/aab(c).txt"));
}

fn with_huge_pattern(statement: &str, huge: &str) -> String {
    let statement = statement.replace("HUGE", huge);
    format!(
        r#"{{"Statement": [
            {{"Sid": "PublicRead", "Effect": "Allow", "Principal": "*", "Action": "s3:GetObject", "Resource": "my-bucket/*"}},
            {statement}
        ]}}"#
    )
}

#[test]
fn test_oversized_patterns_reject_the_policy() {
    let huge = "?".repeat(19_000);

    let deny_resource = with_huge_pattern(
        r#"{"Sid": "Deny", "Effect": "Deny", "Principal": "*", "Action": "s3:GetObject", "Resource": "my-bucket/HUGE"}"#,
        &huge,
    );
    let deny_not_like = with_huge_pattern(
        r#"{"Sid": "Deny", "Effect": "Deny", "Principal": "*", "Action": "s3:GetObject", "Resource": "my-bucket/*",
            "Condition": {"StringNotLike": {"s3:prefix": "HUGE"}}}"#,
        &huge,
    );

    for text in [deny_resource, deny_not_like] {
        assert!(text.len() < 20 * 1024);
        let result = parse_policy(&text, "my-bucket", &ParseOptions::default());
        assert!(matches!(result, Err(PolicyError::InvalidPattern(_))));
    }
}

#[test]
fn test_transport_conditions() {
    let policy = parse(
        r#"{
        "Statement": [
            {
                "Sid": "OfficeOnly",
                "Effect": "Allow",
                "Principal": "*",
                "Action": ["s3:GetObject", "s3:PutObject"],
                "Resource": "my-bucket/*",
                "Condition": {
                    "IpAddress": {"aws:SourceIp": ["10.0.0.0/8", "192.168.1.7"]},
                    "Bool": {"aws:SecureTransport": "true"}
                }
            },
            {
                "Sid": "NoCrawlers",
                "Effect": "Deny",
                "Principal": "*",
                "Action": "s3:*",
                "Resource": "my-bucket/*",
                "Condition": {"StringLike": {"aws:UserAgent": "*bot*"}}
            }
        ]
    }"#,
    );

    let facts = RequestFacts::new().with_secure(true).with_remote_addr("10.1.2.3:51234");
    let cx = get("k").with_transport(Arc::new(facts.clone()));
    assert_eq!(policy.eval(&cx, "alice"), EvalResult::Allow);

    let insecure = get("k").with_transport(Arc::new(facts.clone().with_secure(false)));
    assert_eq!(policy.eval(&insecure, "alice"), EvalResult::DefaultDeny);

    let outside = get("k").with_transport(Arc::new(facts.clone().with_remote_addr("172.16.0.1")));
    assert_eq!(policy.eval(&outside, "alice"), EvalResult::DefaultDeny);

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, "googlebot/2.1".parse().unwrap());
    let crawler = get("k").with_transport(Arc::new(facts.with_headers(headers)));
    assert_eq!(policy.eval(&crawler, "alice"), EvalResult::Deny);

    // the user agent is never taken from explicit parameters
    let spoofed = get("k").with_param(ConditionKey::UserAgent, "googlebot/2.1");
    assert_eq!(policy.eval(&spoofed, "alice"), EvalResult::DefaultDeny);
}

#[test]
fn test_referer_condition() {
    let policy = parse(
        r#"{
        "Statement": [{
            "Sid": "Hotlinks",
            "Effect": "Allow",
            "Principal": "*",
            "Action": "s3:GetObject",
            "Resource": "my-bucket/*",
            "Condition": {"StringLike": {"aws:Referer": ["https://example.com/*"]}}
        }]
    }"#,
    );

    let mut headers = HeaderMap::new();
    headers.insert(REFERER, "https://example.com/gallery".parse().unwrap());
    let cx = get("cat.png").with_transport(Arc::new(RequestFacts::new().with_headers(headers)));
    assert_eq!(policy.eval(&cx, ""), EvalResult::Allow);

    assert_eq!(policy.eval(&get("cat.png"), ""), EvalResult::DefaultDeny);
}

#[test]
fn test_date_conditions_use_evaluation_instant() {
    let policy = parse(
        r#"{
        "Statement": [{
            "Sid": "Window",
            "Effect": "Allow",
            "Principal": "*",
            "Action": "s3:GetObject",
            "Resource": "my-bucket/*",
            "Condition": {
                "DateGreaterThan": {"aws:CurrentTime": "2024-01-01T00:00:00Z"},
                "DateLessThan": {"aws:CurrentTime": "2024-02-01"}
            }
        }]
    }"#,
    );

    let inside = get("k").with_now(datetime!(2024-01-15 12:00 UTC));
    assert_eq!(policy.eval(&inside, "alice"), EvalResult::Allow);

    let after = get("k").with_now(datetime!(2024-03-01 00:00 UTC));
    assert_eq!(policy.eval(&after, "alice"), EvalResult::DefaultDeny);

    // an explicit CurrentTime parameter does not move the instant being compared
    let replayed = get("k")
        .with_now(datetime!(2024-03-01 00:00 UTC))
        .with_param(ConditionKey::CurrentTime, "2024-01-15T12:00:00Z");
    assert_eq!(policy.eval(&replayed, "alice"), EvalResult::DefaultDeny);
}

#[test]
fn test_numeric_condition_on_max_keys() {
    let policy = parse(
        r#"{
        "Statement": [{
            "Sid": "SmallListings",
            "Effect": "Allow",
            "Principal": {"CanonicalUser": ["alice"]},
            "Action": "s3:ListBucket",
            "Resource": "my-bucket",
            "Condition": {"NumericLessThanEquals": {"s3:max-keys": 100}}
        }]
    }"#,
    );

    let list = PolicyContext::new(Action::ListBucket, "my-bucket");
    assert_eq!(
        policy.eval(&list.clone().with_param(ConditionKey::MaxKeys, "100"), "alice"),
        EvalResult::Allow
    );
    assert_eq!(
        policy.eval(&list.clone().with_param(ConditionKey::MaxKeys, "1000"), "alice"),
        EvalResult::DefaultDeny
    );
    assert_eq!(
        policy.eval(&list.clone().with_param(ConditionKey::MaxKeys, "many"), "alice"),
        EvalResult::DefaultDeny
    );
    assert_eq!(
        policy.eval(&list.with_param(ConditionKey::MaxKeys, "10"), "bob"),
        EvalResult::DefaultDeny
    );
}

#[test]
fn test_not_action_excludes_one_action() {
    let policy = parse(
        r#"{
        "Statement": [{
            "Sid": "EverythingButDelete",
            "Effect": "Allow",
            "Principal": "*",
            "NotAction": "s3:DeleteObject",
            "Resource": "my-bucket/*"
        }]
    }"#,
    );

    let put = PolicyContext::new(Action::PutObject, "my-bucket").with_key("k");
    assert_eq!(policy.eval(&put, "alice"), EvalResult::Allow);

    let delete = PolicyContext::new(Action::DeleteObject, "my-bucket").with_key("k");
    assert_eq!(policy.eval(&delete, "alice"), EvalResult::DefaultDeny);
}
