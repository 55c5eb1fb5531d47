use s3s_policy::{Action, PolicyError};

pub type StdError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The request is not authorized.
///
/// This is the only failure [`Authorizer::authorize`](crate::Authorizer::authorize) reports.
/// Collaborator failures are logged and surface as a denial.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("permission denied: {action} on {bucket}{}", key_suffix(.key.as_deref()))]
pub struct PermissionDenied {
    pub bucket: String,
    pub key: Option<String>,
    pub action: Action,
}

fn key_suffix(key: Option<&str>) -> String {
    key.map(|key| format!("/{key}")).unwrap_or_default()
}

/// Why a bucket policy could not be loaded.
///
/// A failed load is never cached. The bucket is evaluated as if it had no policy.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadPolicyError {
    #[error("policy store error: {0}")]
    Store(StdError),

    #[error("policy document is too large: {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error(transparent)]
    Malformed(#[from] PolicyError),
}
