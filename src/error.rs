//! Unified error type.

use std::fmt;

/// The error type returned by routa's fallible operations.
///
/// An unmatched request or an unparseable JSON body is not an `Error`: the
/// dispatcher answers those with a fallback page, a 404 or an empty map.
/// This type covers startup failures (bad route templates, bad config) and
/// handler-side misuse of a [`Response`](crate::Response).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed route `{template}`: {kind}")]
    MalformedRoute { template: String, kind: Malformed },

    /// A response mutator or terminal method ran after the response was sent.
    #[error("response already sent")]
    ResponseAlreadySent,

    /// A status code outside `100..=999`.
    #[error("invalid status code {0}")]
    InvalidStatus(i64),

    #[error("response is already lent to another handler argument")]
    ResponseUnavailable,

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Why a route registration was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    /// A `{}` segment with nothing between the braces.
    EmptyName,
    /// A placeholder whose name is not `[A-Za-z_][A-Za-z0-9_]*`.
    InvalidName(String),
    /// The same placeholder name used twice in one template.
    DuplicateName(String),
    /// The handler would need the response in more than one argument.
    ResponseBoundTwice,
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName          => f.write_str("empty placeholder name"),
            Self::InvalidName(name)  => write!(f, "invalid placeholder name `{name}`"),
            Self::DuplicateName(name) => write!(f, "placeholder `{name}` appears more than once"),
            Self::ResponseBoundTwice => f.write_str("handler binds the response to more than one argument"),
        }
    }
}
