//! Access control lists
//!
//! See <https://docs.aws.amazon.com/AmazonS3/latest/userguide/acl-overview.html>
//!
//! An ACL is an ordered list of [`Grant`]s attached to a bucket or to one object version.
//! Permissions are bit flags, so a request for [`Permission::WRITE`] is satisfied by any grant
//! whose flags include `WRITE`, such as [`Permission::FULL_CONTROL`].

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// A set of ACL permission bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(u8);

impl Permission {
    pub const NONE: Self = Self(0);
    pub const READ: Self = Self(1);
    pub const WRITE: Self = Self(1 << 1);
    pub const READ_ACP: Self = Self(1 << 2);
    pub const WRITE_ACP: Self = Self(1 << 3);
    pub const FULL_CONTROL: Self = Self(Self::READ.0 | Self::WRITE.0 | Self::READ_ACP.0 | Self::WRITE_ACP.0);
    /// Requests carrying this bit are granted without looking at any ACL.
    pub const PASS: Self = Self(1 << 4);

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_pass(self) -> bool {
        self.0 & Self::PASS.0 != 0
    }

    /// Parses an S3 permission name such as `READ_ACP` or `FULL_CONTROL`.
    #[must_use]
    pub fn from_s3_name(name: &str) -> Option<Self> {
        match name {
            "READ" => Some(Self::READ),
            "WRITE" => Some(Self::WRITE),
            "READ_ACP" => Some(Self::READ_ACP),
            "WRITE_ACP" => Some(Self::WRITE_ACP),
            "FULL_CONTROL" => Some(Self::FULL_CONTROL),
            _ => None,
        }
    }

    /// The S3 name of this permission, if it is exactly one of the named permissions.
    #[must_use]
    pub fn s3_name(self) -> Option<&'static str> {
        match self {
            Self::READ => Some("READ"),
            Self::WRITE => Some("WRITE"),
            Self::READ_ACP => Some("READ_ACP"),
            Self::WRITE_ACP => Some("WRITE_ACP"),
            Self::FULL_CONTROL => Some("FULL_CONTROL"),
            _ => None,
        }
    }
}

impl BitOr for Permission {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permission {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permission {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.s3_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#07b}", self.0),
        }
    }
}

/// Who a grant applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grantee {
    /// A specific canonical user id.
    CanonicalUser(String),
    /// Any authenticated principal.
    AuthenticatedUsers,
    /// Everyone, including anonymous requests.
    AllUsers,
}

impl Grantee {
    pub const AUTHENTICATED_USERS_URI: &'static str = "http://acs.amazonaws.com/groups/global/AuthenticatedUsers";
    pub const ALL_USERS_URI: &'static str = "http://acs.amazonaws.com/groups/global/AllUsers";

    /// Parses a predefined group URI.
    #[must_use]
    pub fn from_group_uri(uri: &str) -> Option<Self> {
        match uri {
            Self::AUTHENTICATED_USERS_URI => Some(Self::AuthenticatedUsers),
            Self::ALL_USERS_URI => Some(Self::AllUsers),
            _ => None,
        }
    }

    /// The grantees an ACL lookup checks for `requester`, in order.
    ///
    /// An authenticated requester is checked under their own id and then as a member of
    /// `AuthenticatedUsers`. An anonymous requester (empty id) is checked against
    /// `AllUsers` only.
    #[must_use]
    pub fn lookup_order(requester: &str) -> Vec<Self> {
        if requester.is_empty() {
            vec![Self::AllUsers]
        } else {
            vec![Self::CanonicalUser(requester.to_owned()), Self::AuthenticatedUsers]
        }
    }
}

/// One ACL entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub grantee: Grantee,
    pub permission: Permission,
}

impl Grant {
    #[must_use]
    pub fn new(grantee: Grantee, permission: Permission) -> Self {
        Self { grantee, permission }
    }

    #[must_use]
    pub fn user(id: impl Into<String>, permission: Permission) -> Self {
        Self::new(Grantee::CanonicalUser(id.into()), permission)
    }
}

/// Returns `true` if any grant carries every bit of `requested`.
///
/// [`Permission::PASS`] is satisfied without looking at the grants.
#[must_use]
pub fn permission_granted(grants: &[Grant], requested: Permission) -> bool {
    requested.is_pass() || grants.iter().any(|g| g.permission.contains(requested))
}

/// The grants attached to one bucket or object version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessControlList(Vec<Grant>);

impl AccessControlList {
    #[must_use]
    pub fn new(grants: Vec<Grant>) -> Self {
        Self(grants)
    }

    pub fn push(&mut self, grant: Grant) {
        self.0.push(grant);
    }

    #[must_use]
    pub fn grants(&self) -> &[Grant] {
        &self.0
    }

    /// The grants held by `grantee`, in list order.
    pub fn grants_for<'a>(&'a self, grantee: &'a Grantee) -> impl Iterator<Item = &'a Grant> + 'a {
        self.0.iter().filter(move |g| g.grantee == *grantee)
    }

    /// Checks `requested` for `requester` using the grantee lookup order of
    /// [`Grantee::lookup_order`].
    #[must_use]
    pub fn permission_granted(&self, requester: &str, requested: Permission) -> bool {
        if requested.is_pass() {
            return true;
        }
        Grantee::lookup_order(requester)
            .iter()
            .any(|grantee| self.grants_for(grantee).any(|g| g.permission.contains(requested)))
    }
}

impl FromIterator<Grant> for AccessControlList {
    fn from_iter<T: IntoIterator<Item = Grant>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Grant>> for AccessControlList {
    fn from(grants: Vec<Grant>) -> Self {
        Self(grants)
    }
}

/// A canned ACL, as sent in the `x-amz-acl` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CannedAcl {
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl CannedAcl {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "private" => Some(Self::Private),
            "public-read" => Some(Self::PublicRead),
            "public-read-write" => Some(Self::PublicReadWrite),
            "authenticated-read" => Some(Self::AuthenticatedRead),
            "bucket-owner-read" => Some(Self::BucketOwnerRead),
            "bucket-owner-full-control" => Some(Self::BucketOwnerFullControl),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::AuthenticatedRead => "authenticated-read",
            Self::BucketOwnerRead => "bucket-owner-read",
            Self::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }

    /// Expands the canned ACL for a resource owned by `owner`.
    ///
    /// `bucket_owner` is only used by the `bucket-owner-*` variants.
    #[must_use]
    pub fn grants(self, owner: &str, bucket_owner: &str) -> AccessControlList {
        let mut acl = AccessControlList::new(vec![Grant::user(owner, Permission::FULL_CONTROL)]);
        match self {
            Self::Private => {}
            Self::PublicRead => acl.push(Grant::new(Grantee::AllUsers, Permission::READ)),
            Self::PublicReadWrite => acl.push(Grant::new(Grantee::AllUsers, Permission::READ | Permission::WRITE)),
            Self::AuthenticatedRead => acl.push(Grant::new(Grantee::AuthenticatedUsers, Permission::READ)),
            Self::BucketOwnerRead => acl.push(Grant::user(bucket_owner, Permission::READ)),
            Self::BucketOwnerFullControl => acl.push(Grant::user(bucket_owner, Permission::FULL_CONTROL)),
        }
        acl
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of resource an ACL is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Bucket,
    Object,
}

/// The resource whose ACL is consulted.
///
/// `id` is opaque to this crate; for objects it typically identifies one version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclTarget {
    pub kind: TargetKind,
    pub id: String,
}

impl AclTarget {
    #[must_use]
    pub fn bucket(id: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Bucket,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn object(id: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Object,
            id: id.into(),
        }
    }
}
