//! Opaque identifiers for feed entities
//!
//! All identifiers are server-generated opaque strings. The client never
//! inspects their structure; it only compares, hashes, and orders them.
//! Ordering is lexicographic and is used solely as a tie-break for records
//! sharing a creation timestamp.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from a server-provided string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Accept both raw and prefixed forms
                Ok(Self(s.strip_prefix($prefix).unwrap_or(s).to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a post.
    PostId,
    "post-"
);

string_id!(
    /// Identifier of a comment.
    CommentId,
    "comment-"
);

string_id!(
    /// Identity of an authenticated actor (the account performing likes,
    /// posts, and comments).
    ActorId,
    "actor-"
);

string_id!(
    /// A username as it appears in post mentions.
    Username,
    "@"
);
