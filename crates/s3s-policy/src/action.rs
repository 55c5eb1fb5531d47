//! Action catalog

use std::fmt;

macro_rules! define_actions {
    ($($variant:ident => $name:literal,)+) => {
        /// An S3 operation that a policy statement can allow or deny.
        ///
        /// The catalog is closed. Names outside of it parse to [`Action::UnknownAction`],
        /// which never matches anything but itself.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum Action {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
            /// `s3:*`
            AllActions,
            /// Any name outside of the catalog.
            UnknownAction,
        }

        impl Action {
            /// Every named action, excluding the wildcard and the sentinel.
            pub const CATALOG: &'static [Action] = &[$(Action::$variant,)+];

            /// Looks up an action by its policy name.
            ///
            /// Matching is case-sensitive, except for the wildcard `s3:*`.
            ///
            /// # Example
            /// ```
            /// # use s3s_policy::Action;
            /// assert_eq!(Action::from_name("s3:GetObject"), Action::GetObject);
            /// assert_eq!(Action::from_name("s3:*"), Action::AllActions);
            /// assert_eq!(Action::from_name("s3:getobject"), Action::UnknownAction);
            /// ```
            #[must_use]
            pub fn from_name(name: &str) -> Self {
                match name {
                    $($name => Action::$variant,)+
                    Self::ALL_ACTIONS_NAME => Action::AllActions,
                    _ => Action::UnknownAction,
                }
            }

            /// Returns the policy name of the action.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Action::$variant => $name,)+
                    Action::AllActions => Self::ALL_ACTIONS_NAME,
                    Action::UnknownAction => "s3:Unknown",
                }
            }
        }
    };
}

define_actions! {
    ListAllMyBuckets => "s3:ListAllMyBuckets",
    CreateBucket => "s3:CreateBucket",
    DeleteBucket => "s3:DeleteBucket",
    ListBucket => "s3:ListBucket",
    ListBucketVersions => "s3:ListBucketVersions",
    ListBucketMultipartUploads => "s3:ListBucketMultipartUploads",
    GetBucketAcl => "s3:GetBucketAcl",
    PutBucketAcl => "s3:PutBucketAcl",
    GetBucketVersioning => "s3:GetBucketVersioning",
    PutBucketVersioning => "s3:PutBucketVersioning",
    GetBucketLocation => "s3:GetBucketLocation",
    GetBucketPolicy => "s3:GetBucketPolicy",
    PutBucketPolicy => "s3:PutBucketPolicy",
    DeleteBucketPolicy => "s3:DeleteBucketPolicy",
    GetBucketLogging => "s3:GetBucketLogging",
    PutBucketLogging => "s3:PutBucketLogging",
    GetBucketNotification => "s3:GetBucketNotification",
    PutBucketNotification => "s3:PutBucketNotification",
    GetBucketWebsite => "s3:GetBucketWebsite",
    PutBucketWebsite => "s3:PutBucketWebsite",
    DeleteBucketWebsite => "s3:DeleteBucketWebsite",
    GetLifecycleConfiguration => "s3:GetLifecycleConfiguration",
    PutLifecycleConfiguration => "s3:PutLifecycleConfiguration",
    GetBucketRequestPayment => "s3:GetBucketRequestPayment",
    PutBucketRequestPayment => "s3:PutBucketRequestPayment",
    GetObject => "s3:GetObject",
    GetObjectVersion => "s3:GetObjectVersion",
    PutObject => "s3:PutObject",
    GetObjectAcl => "s3:GetObjectAcl",
    GetObjectVersionAcl => "s3:GetObjectVersionAcl",
    PutObjectAcl => "s3:PutObjectAcl",
    PutObjectVersionAcl => "s3:PutObjectVersionAcl",
    DeleteObject => "s3:DeleteObject",
    DeleteObjectVersion => "s3:DeleteObjectVersion",
    ListMultipartUploadParts => "s3:ListMultipartUploadParts",
    AbortMultipartUpload => "s3:AbortMultipartUpload",
    RestoreObject => "s3:RestoreObject",
}

impl Action {
    const ALL_ACTIONS_NAME: &'static str = "s3:*";
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `Action` element of a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet(Vec<Action>);

impl ActionSet {
    #[must_use]
    pub fn new(actions: Vec<Action>) -> Self {
        Self(actions)
    }

    /// Builds a set from policy names; unknown names become [`Action::UnknownAction`].
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(names.into_iter().map(|n| Action::from_name(n.as_ref())).collect())
    }

    /// Returns `true` if the set holds [`Action::AllActions`] or exactly `requested`.
    ///
    /// `AllActions` matches every requested action, [`Action::UnknownAction`] included.
    #[must_use]
    pub fn contains(&self, requested: Action) -> bool {
        self.0.iter().any(|&a| a == Action::AllActions || a == requested)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.0.iter()
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<T: IntoIterator<Item = Action>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ActionSet {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_round_trips_through_names() {
        for &action in Action::CATALOG {
            assert_eq!(Action::from_name(action.as_str()), action);
        }
    }

    #[test]
    fn names_are_case_sensitive() {
        assert_eq!(Action::from_name("s3:PutObject"), Action::PutObject);
        assert_eq!(Action::from_name("s3:putobject"), Action::UnknownAction);
        assert_eq!(Action::from_name("PutObject"), Action::UnknownAction);
        assert_eq!(Action::from_name(""), Action::UnknownAction);
    }

    #[test]
    fn wildcard() {
        assert_eq!(Action::from_name("s3:*"), Action::AllActions);
        assert_eq!(Action::from_name("*"), Action::UnknownAction);
    }

    #[test]
    fn set_contains() {
        let set = ActionSet::from_names(["s3:GetObject", "s3:PutObject"]);
        assert!(set.contains(Action::GetObject));
        assert!(set.contains(Action::PutObject));
        assert!(!set.contains(Action::DeleteObject));

        let all = ActionSet::new(vec![Action::AllActions]);
        assert!(all.contains(Action::DeleteBucket));
        assert!(all.contains(Action::UnknownAction));
    }

    #[test]
    fn unknown_only_matches_itself() {
        let set = ActionSet::from_names(["s3:NoSuchThing"]);
        assert!(!set.contains(Action::GetObject));
        assert!(set.contains(Action::UnknownAction));
        assert!(!ActionSet::default().contains(Action::GetObject));
    }
}
