use crate::config::AuthzConfig;

use s3s_policy::{BucketPolicy, ParseOptions, PolicyError, parse_policy};

/// Turns a stored policy document into a [`BucketPolicy`].
///
/// The default is [`JsonPolicyParser`]. Deployments that store policies in another format
/// can plug in their own front-end.
pub trait PolicyParser: Send + Sync + 'static {
    /// # Errors
    /// Returns an error if the document cannot be used. The bucket is then treated as
    /// having no policy.
    fn parse(&self, document: &str, bucket: &str, config: &AuthzConfig) -> Result<BucketPolicy, PolicyError>;
}

/// Parses S3 JSON policy documents with [`s3s_policy::parse_policy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPolicyParser;

impl PolicyParser for JsonPolicyParser {
    fn parse(&self, document: &str, bucket: &str, config: &AuthzConfig) -> Result<BucketPolicy, PolicyError> {
        let options = ParseOptions::new().skip_malformed_statements(config.skip_malformed_statements);
        parse_policy(document, bucket, &options)
    }
}
