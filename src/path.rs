//! Request path normalization.

use std::fmt;

use percent_encoding::percent_decode_str;

/// Characters stripped from both ends of templates and request paths.
fn is_boundary(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '/')
}

pub(crate) fn trim_boundary(s: &str) -> &str {
    s.trim_matches(is_boundary)
}

/// Splits a trimmed path into `/`-delimited segments. The empty path has none.
pub(crate) fn split_segments(s: &str) -> Vec<&str> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split('/').collect()
    }
}

/// A request path that has been percent-decoded and trimmed exactly once.
///
/// The router only matches against this type, so a path can never be decoded
/// twice on its way from the transport to the route table (`%2541` stays `%41`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    /// Decodes percent-escapes (invalid UTF-8 becomes U+FFFD) and trims
    /// whitespace and slashes from both ends.
    ///
    /// `raw` is the path component only; strip the query string first.
    pub fn new(raw: &str) -> Self {
        let decoded = percent_decode_str(raw).decode_utf8_lossy();
        Self(trim_boundary(&decoded).to_owned())
    }

    pub fn as_str(&self) -> &str { &self.0 }

    pub(crate) fn segments(&self) -> Vec<&str> {
        split_segments(&self.0)
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
