/// A policy document or statement that cannot be used.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PolicyError {
    /// A required statement element is absent.
    #[error("malformed policy: statement is missing `{0}`")]
    MissingElement(&'static str),

    #[error("malformed policy: invalid effect `{0}`")]
    InvalidEffect(String),

    #[error("malformed policy: statement has both `Action` and `NotAction`")]
    BothActionAndNotAction,

    /// `NotAction` holds a single action.
    #[error("malformed policy: `NotAction` must name exactly one action")]
    MultipleNotActions,

    /// `Resource` holds a single pattern.
    #[error("malformed policy: `Resource` must name exactly one resource")]
    MultipleResources,

    #[error("malformed policy: invalid `{element}` value")]
    InvalidValue { element: &'static str },

    /// A wildcard pattern exceeds the size the matcher can compile.
    #[error("malformed policy: wildcard pattern is too large")]
    InvalidPattern(#[source] regex::Error),

    #[error("malformed policy: no statements")]
    EmptyStatementList,

    #[error("malformed policy: {0}")]
    Json(#[from] serde_json::Error),
}
