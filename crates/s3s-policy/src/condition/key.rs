use std::fmt;

macro_rules! define_keys {
    ($($variant:ident => $name:literal,)+) => {
        /// A named fact that a condition compares against.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ConditionKey {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
            /// Any name outside of the catalog. Never resolves to a value.
            UnknownKey,
        }

        impl ConditionKey {
            /// Every named key, excluding the sentinel.
            pub const CATALOG: &'static [ConditionKey] = &[$(ConditionKey::$variant,)+];

            /// Returns the policy name of the key.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(ConditionKey::$variant => $name,)+
                    ConditionKey::UnknownKey => "UnknownKey",
                }
            }
        }
    };
}

define_keys! {
    CurrentTime => "aws:CurrentTime",
    SecureTransport => "aws:SecureTransport",
    SourceIp => "aws:SourceIp",
    SourceArn => "aws:SourceArn",
    UserAgent => "aws:UserAgent",
    EpochTime => "aws:EpochTime",
    Referer => "aws:Referer",
    Acl => "s3:x-amz-acl",
    Location => "s3:LocationConstraint",
    Prefix => "s3:prefix",
    Delimiter => "s3:delimiter",
    MaxKeys => "s3:max-keys",
    CopySource => "s3:x-amz-copy-source",
    MetaData => "s3:x-amz-metadata-directive",
    VersionId => "s3:VersionId",
}

impl ConditionKey {
    /// Looks up a key by its policy name, ignoring ASCII case.
    ///
    /// # Example
    /// ```
    /// # use s3s_policy::ConditionKey;
    /// assert_eq!(ConditionKey::from_name("s3:x-amz-acl"), ConditionKey::Acl);
    /// assert_eq!(ConditionKey::from_name("AWS:SecureTransport"), ConditionKey::SecureTransport);
    /// assert_eq!(ConditionKey::from_name("s3:nope"), ConditionKey::UnknownKey);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::CATALOG
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
            .unwrap_or(ConditionKey::UnknownKey)
    }
}

impl fmt::Display for ConditionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
