//! Route template compiler.
//!
//! A template such as `/api/users/{name}` is trimmed, split on `/`, and each
//! segment becomes either a literal or a named capture. Matching is then a
//! segment-by-segment comparison: equal segment counts, equal literals, and
//! any non-empty segment at a capture position.

use crate::error::Malformed;
use crate::path::{split_segments, trim_boundary};

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Literal(String),
    /// Captures are numbered left to right, like [`Pattern::names`].
    Capture,
}

/// A compiled route template. Immutable once built.
#[derive(Clone, Debug)]
pub(crate) struct Pattern {
    template: String,
    segments: Vec<Segment>,
    names: Vec<String>,
}

impl Pattern {
    pub(crate) fn compile(template: &str) -> Result<Self, Malformed> {
        let mut segments = Vec::new();
        let mut names: Vec<String> = Vec::new();

        for part in split_segments(trim_boundary(template)) {
            let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) else {
                segments.push(Segment::Literal(part.to_owned()));
                continue;
            };
            if name.is_empty() {
                return Err(Malformed::EmptyName);
            }
            if !is_identifier(name) {
                return Err(Malformed::InvalidName(name.to_owned()));
            }
            if names.iter().any(|n| n == name) {
                return Err(Malformed::DuplicateName(name.to_owned()));
            }
            segments.push(Segment::Capture);
            names.push(name.to_owned());
        }

        Ok(Self { template: template.to_owned(), segments, names })
    }

    /// The template as it was registered.
    pub(crate) fn template(&self) -> &str { &self.template }

    /// Placeholder names in left-to-right order.
    pub(crate) fn names(&self) -> &[String] { &self.names }

    /// Tests already-split path segments against the pattern. On a match,
    /// returns the captured segments in the order of [`names`](Self::names).
    pub(crate) fn captures<'p>(&self, path: &[&'p str]) -> Option<Vec<&'p str>> {
        if path.len() != self.segments.len() {
            return None;
        }
        let mut captured = Vec::with_capacity(self.names.len());
        for (segment, candidate) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(lit) if lit == candidate => {}
                Segment::Capture if !candidate.is_empty() => captured.push(*candidate),
                _ => return None,
            }
        }
        Some(captured)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(path: &str) -> Vec<&str> {
        split_segments(path)
    }

    #[test]
    fn compiles_literals_and_placeholders_in_order() {
        let p = Pattern::compile(" /api/{kind}/users/{name}/ ").unwrap();
        assert_eq!(p.names(), ["kind", "name"]);
        assert_eq!(p.captures(&segs("api/admin/users/Ada")), Some(vec!["admin", "Ada"]));
    }

    #[test]
    fn literal_segments_are_case_sensitive_and_unicode_aware() {
        let p = Pattern::compile("/สวัสดี/{who}").unwrap();
        assert_eq!(p.captures(&segs("สวัสดี/โลก")), Some(vec!["โลก"]));
        assert_eq!(Pattern::compile("/Api").unwrap().captures(&segs("api")), None);
    }

    #[test]
    fn segment_count_must_match_exactly() {
        let p = Pattern::compile("/a/{x}").unwrap();
        assert_eq!(p.captures(&segs("a")), None);
        assert_eq!(p.captures(&segs("a/b/c")), None);
    }

    #[test]
    fn placeholders_never_capture_empty_segments() {
        let p = Pattern::compile("/a/{x}/c").unwrap();
        assert_eq!(p.captures(&segs("a//c")), None);
        let literal = Pattern::compile("/a//c").unwrap();
        assert_eq!(literal.captures(&segs("a//c")), Some(vec![]));
    }

    #[test]
    fn root_template_matches_root_path() {
        let p = Pattern::compile("/").unwrap();
        assert!(p.names().is_empty());
        assert_eq!(p.captures(&segs("")), Some(vec![]));
        assert_eq!(p.captures(&segs("x")), None);
    }

    #[test]
    fn braces_inside_a_segment_are_literal() {
        let p = Pattern::compile("/file-{id}").unwrap();
        assert!(p.names().is_empty());
        assert_eq!(p.captures(&segs("file-{id}")), Some(vec![]));
    }

    #[test]
    fn rejects_malformed_placeholders() {
        assert_eq!(Pattern::compile("/a/{}").unwrap_err(), Malformed::EmptyName);
        assert_eq!(
            Pattern::compile("/a/{1st}").unwrap_err(),
            Malformed::InvalidName("1st".into()),
        );
        assert_eq!(
            Pattern::compile("/a/{first-name}").unwrap_err(),
            Malformed::InvalidName("first-name".into()),
        );
        assert_eq!(
            Pattern::compile("/{id}/x/{id}").unwrap_err(),
            Malformed::DuplicateName("id".into()),
        );
    }

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("_"));
        assert!(is_identifier("user_id2"));
        assert!(!is_identifier("2fa"));
        assert!(!is_identifier("naïve"));
    }
}
