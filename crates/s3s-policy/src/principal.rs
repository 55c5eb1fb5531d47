//! Principal sets

use std::collections::HashSet;

/// The `Principal` element of a statement: a set of canonical user ids.
///
/// The id `"*"` stands for any principal, anonymous requesters included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalSet(HashSet<String>);

impl PrincipalSet {
    /// The wildcard principal.
    pub const ANY: &'static str = "*";

    /// Returns a set containing only the wildcard.
    #[must_use]
    pub fn any() -> Self {
        [Self::ANY].into_iter().collect()
    }

    /// Returns `true` if the set holds the wildcard or exactly `id`.
    ///
    /// There is no case folding and no hierarchical matching.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(Self::ANY) || self.0.contains(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }
}

impl<S: Into<String>> FromIterator<S> for PrincipalSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
