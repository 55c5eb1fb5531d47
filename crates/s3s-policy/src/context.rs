//! Per-request evaluation context

use crate::action::Action;
use crate::condition::ConditionKey;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use http::HeaderMap;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Facts about the transport a request arrived on.
///
/// They are resolved lazily: the engine only asks for them when a condition needs
/// `aws:SecureTransport`, `aws:SourceIp`, `aws:UserAgent` or `aws:Referer`.
pub trait TransportFacts: Send + Sync + 'static {
    /// Whether the request arrived over TLS.
    fn is_secure(&self) -> bool;

    /// The remote peer address, as reported by the transport.
    fn remote_addr(&self) -> Option<String>;

    /// A request header value. Names are case-insensitive.
    fn header(&self, name: &str) -> Option<String>;
}

/// A plain [`TransportFacts`] implementation backed by an [`http::HeaderMap`].
#[derive(Debug, Clone, Default)]
pub struct RequestFacts {
    secure: bool,
    remote_addr: Option<String>,
    headers: HeaderMap,
}

impl RequestFacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

impl TransportFacts for RequestFacts {
    fn is_secure(&self) -> bool {
        self.secure
    }

    fn remote_addr(&self) -> Option<String> {
        self.remote_addr.clone()
    }

    fn header(&self, name: &str) -> Option<String> {
        let value = self.headers.get(name)?;
        value.to_str().ok().map(str::to_owned)
    }
}

/// Everything a policy needs to know about one request.
///
/// A context is built fresh for every request and dropped once the decision is made.
///
/// Condition keys are resolved from two sources:
/// - `aws:SecureTransport`, `aws:SourceIp`, `aws:UserAgent` and `aws:Referer` always come
///   from the [`TransportFacts`], never from the explicit parameters;
/// - every other key comes from the parameters set with [`PolicyContext::set_param`].
///   `aws:CurrentTime` and `aws:EpochTime` fall back to the evaluation instant.
#[derive(Clone)]
pub struct PolicyContext {
    action: Action,
    bucket: String,
    key: Option<String>,
    params: HashMap<ConditionKey, String>,
    transport: Option<Arc<dyn TransportFacts>>,
    now: OffsetDateTime,
}

impl PolicyContext {
    /// Creates a context for `action` on `bucket`, stamped with the current time.
    #[must_use]
    pub fn new(action: Action, bucket: impl Into<String>) -> Self {
        Self {
            action,
            bucket: bucket.into(),
            key: None,
            params: HashMap::new(),
            transport: None,
            now: OffsetDateTime::now_utc(),
        }
    }

    /// Sets the object key. An empty key is treated as no key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.key = if key.is_empty() { None } else { Some(key) };
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: ConditionKey, value: impl Into<String>) -> Self {
        self.set_param(key, value);
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn TransportFacts>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Overrides the evaluation instant used by date conditions.
    #[must_use]
    pub fn with_now(mut self, now: OffsetDateTime) -> Self {
        self.now = now;
        self
    }

    /// Sets an explicit evaluation parameter.
    pub fn set_param(&mut self, key: ConditionKey, value: impl Into<String>) {
        self.params.insert(key, value.into());
    }

    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    #[must_use]
    pub fn now(&self) -> OffsetDateTime {
        self.now
    }

    /// The path that statement resources are matched against:
    /// `bucket` without a key, `bucket/key` with one.
    #[must_use]
    pub fn resource_path(&self) -> Cow<'_, str> {
        match &self.key {
            None => Cow::Borrowed(&self.bucket),
            Some(key) => Cow::Owned(format!("{}/{}", self.bucket, key)),
        }
    }

    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_secure())
    }

    #[must_use]
    pub fn remote_addr(&self) -> Option<String> {
        self.transport.as_ref().and_then(|t| t.remote_addr())
    }

    /// The remote address as an IP, accepting both `ip` and `ip:port` forms.
    #[must_use]
    pub fn remote_ip(&self) -> Option<IpAddr> {
        let addr = self.remote_addr()?;
        let addr = addr.trim();
        addr.parse::<IpAddr>()
            .ok()
            .or_else(|| addr.parse::<SocketAddr>().ok().map(|sa| sa.ip()))
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<String> {
        self.transport.as_ref().and_then(|t| t.header(name))
    }

    /// Resolves the value of a condition key for this request.
    #[must_use]
    pub fn value(&self, key: ConditionKey) -> Option<Cow<'_, str>> {
        match key {
            ConditionKey::UserAgent => self.header("User-Agent").map(Cow::Owned),
            ConditionKey::Referer => self.header("Referer").map(Cow::Owned),
            ConditionKey::SecureTransport => {
                let secure = if self.is_secure() { "true" } else { "false" };
                Some(Cow::Borrowed(secure))
            }
            ConditionKey::SourceIp => self.remote_ip().map(|ip| Cow::Owned(ip.to_string())),
            ConditionKey::CurrentTime => match self.params.get(&key) {
                Some(v) => Some(Cow::Borrowed(v)),
                None => self.now.format(&Rfc3339).ok().map(Cow::Owned),
            },
            ConditionKey::EpochTime => match self.params.get(&key) {
                Some(v) => Some(Cow::Borrowed(v)),
                None => Some(Cow::Owned(self.now.unix_timestamp().to_string())),
            },
            ConditionKey::UnknownKey => None,
            _ => self.params.get(&key).map(|v| Cow::Borrowed(v.as_str())),
        }
    }
}

impl fmt::Debug for PolicyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyContext")
            .field("action", &self.action)
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("params", &self.params)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use http::HeaderValue;

    fn facts() -> Arc<dyn TransportFacts> {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("aws-cli/2.0"));
        headers.insert("referer", HeaderValue::from_static("https://example.com/"));
        Arc::new(
            RequestFacts::new()
                .with_secure(true)
                .with_remote_addr("192.168.1.10:51234")
                .with_headers(headers),
        )
    }

    #[test]
    fn resource_path() {
        let cx = PolicyContext::new(Action::ListBucket, "my-bucket");
        assert_eq!(cx.resource_path(), "my-bucket");

        let cx = cx.with_key("a/b.txt");
        assert_eq!(cx.resource_path(), "my-bucket/a/b.txt");

        let cx = PolicyContext::new(Action::GetObject, "my-bucket").with_key("");
        assert_eq!(cx.key(), None);
        assert_eq!(cx.resource_path(), "my-bucket");
    }

    #[test]
    fn transport_keys_ignore_explicit_params() {
        let cx = PolicyContext::new(Action::GetObject, "b")
            .with_param(ConditionKey::UserAgent, "forged")
            .with_param(ConditionKey::Referer, "forged")
            .with_param(ConditionKey::SecureTransport, "true")
            .with_param(ConditionKey::SourceIp, "10.0.0.1");

        assert_eq!(cx.value(ConditionKey::UserAgent), None);
        assert_eq!(cx.value(ConditionKey::Referer), None);
        assert_eq!(cx.value(ConditionKey::SecureTransport).as_deref(), Some("false"));
        assert_eq!(cx.value(ConditionKey::SourceIp), None);

        let cx = cx.with_transport(facts());
        assert_eq!(cx.value(ConditionKey::UserAgent).as_deref(), Some("aws-cli/2.0"));
        assert_eq!(cx.value(ConditionKey::Referer).as_deref(), Some("https://example.com/"));
        assert_eq!(cx.value(ConditionKey::SecureTransport).as_deref(), Some("true"));
        assert_eq!(cx.value(ConditionKey::SourceIp).as_deref(), Some("192.168.1.10"));
    }

    #[test]
    fn source_ip_drops_the_port() {
        let cx = |addr: &str| {
            let facts = RequestFacts::new().with_remote_addr(addr);
            PolicyContext::new(Action::GetObject, "b").with_transport(Arc::new(facts))
        };
        assert_eq!(cx("10.0.0.1").value(ConditionKey::SourceIp).as_deref(), Some("10.0.0.1"));
        assert_eq!(cx("10.0.0.1:8080").value(ConditionKey::SourceIp).as_deref(), Some("10.0.0.1"));
        assert_eq!(cx("[2001:db8::1]:443").value(ConditionKey::SourceIp).as_deref(), Some("2001:db8::1"));
        assert_eq!(cx("not-an-ip").value(ConditionKey::SourceIp), None);
    }

    #[test]
    fn explicit_params() {
        let cx = PolicyContext::new(Action::PutObject, "b")
            .with_param(ConditionKey::Acl, "public-read")
            .with_param(ConditionKey::MaxKeys, "100");
        assert_eq!(cx.value(ConditionKey::Acl).as_deref(), Some("public-read"));
        assert_eq!(cx.value(ConditionKey::MaxKeys).as_deref(), Some("100"));
        assert_eq!(cx.value(ConditionKey::Prefix), None);
        assert_eq!(cx.value(ConditionKey::UnknownKey), None);
    }

    #[test]
    fn time_keys_fall_back_to_now() {
        let now = time::macros::datetime!(2024-05-01 12:00:00 UTC);
        let cx = PolicyContext::new(Action::GetObject, "b").with_now(now);
        assert_eq!(cx.value(ConditionKey::EpochTime).as_deref(), Some("1714564800"));
        assert_eq!(cx.value(ConditionKey::CurrentTime).as_deref(), Some("2024-05-01T12:00:00Z"));

        let cx = cx.with_param(ConditionKey::EpochTime, "42");
        assert_eq!(cx.value(ConditionKey::EpochTime).as_deref(), Some("42"));
    }

    #[test]
    fn remote_ip_accepts_socket_addr() {
        let cx = PolicyContext::new(Action::GetObject, "b").with_transport(facts());
        assert_eq!(cx.remote_ip(), Some("192.168.1.10".parse().unwrap()));

        let plain = Arc::new(RequestFacts::new().with_remote_addr("::1"));
        let cx = PolicyContext::new(Action::GetObject, "b").with_transport(plain);
        assert_eq!(cx.remote_ip(), Some("::1".parse().unwrap()));

        let junk = Arc::new(RequestFacts::new().with_remote_addr("not-an-ip"));
        let cx = PolicyContext::new(Action::GetObject, "b").with_transport(junk);
        assert_eq!(cx.remote_ip(), None);
    }
}
