//! Incoming HTTP request type.

use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::debug;

use crate::method::Method;
use crate::path::NormalizedPath;

/// A matched request, as seen by a handler.
///
/// Built once per dispatch, after routing, and read-only from then on.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: NormalizedPath,
    pub(crate) params: Vec<(String, String)>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) fields: Vec<(String, String)>,
    pub(crate) json: Map<String, Value>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
}

impl Request {
    /// `query` is the raw query string (without `?`). Form fields and the JSON
    /// body are both derived from `body`, independently of each other.
    pub(crate) fn new(
        method: Method,
        path: NormalizedPath,
        params: Vec<(String, String)>,
        query: &str,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        let is_form = headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .is_some_and(|(_, v)| {
                v.trim_start().to_ascii_lowercase().starts_with("application/x-www-form-urlencoded")
            });
        let fields = if is_form { parse_form(&body) } else { Vec::new() };
        let json = parse_json_object(&body);

        Self { method, path, params, query: parse_form(query.as_bytes()), fields, json, headers, body }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { self.path.as_str() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn json(&self) -> &Map<String, Value> { &self.json }

    /// Path parameters in template order.
    pub fn params(&self) -> &[(String, String)] { &self.params }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        lookup(&self.params, key)
    }

    pub(crate) fn param_at(&self, i: usize) -> Option<&str> {
        self.params.get(i).map(|(_, v)| v.as_str())
    }

    /// Query-string value. For a repeated key the last one wins.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.iter().rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a repeated query key, in order.
    pub fn query_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.query.iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// A submitted value: the url-encoded form field if present, otherwise the
    /// member of the JSON body. A JSON `null` counts as missing.
    pub fn input(&self, key: &str) -> Option<Input<'_>> {
        if let Some(v) = lookup(&self.fields, key) {
            return Some(Input::Field(v));
        }
        self.json.get(key)
            .filter(|v| !v.is_null())
            .map(Input::Json)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A value returned by [`Request::input`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Input<'a> {
    /// From an `application/x-www-form-urlencoded` body.
    Field(&'a str),
    /// From a JSON object body.
    Json(&'a Value),
}

impl<'a> Input<'a> {
    /// The value as text, if it is a form field or a JSON string.
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Self::Field(s) => Some(s),
            Self::Json(v) => v.as_str(),
        }
    }

    pub fn to_value(&self) -> Value {
        match *self {
            Self::Field(s) => Value::String(s.to_owned()),
            Self::Json(v) => v.clone(),
        }
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn parse_form(input: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input)
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Anything but a JSON object becomes the empty map.
fn parse_json_object(body: &[u8]) -> Map<String, Value> {
    if body.is_empty() {
        return Map::new();
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            debug!("request body is JSON but not an object, ignoring");
            Map::new()
        }
        Err(e) => {
            debug!(error = %e, "request body is not JSON, ignoring");
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(query: &str, headers: &[(&str, &str)], body: &str) -> Request {
        Request::new(
            Method::Post,
            NormalizedPath::new("/users/42"),
            vec![("id".into(), "42".into())],
            query,
            headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            Bytes::copy_from_slice(body.as_bytes()),
        )
    }

    const FORM: (&str, &str) = ("Content-Type", "application/x-www-form-urlencoded");

    #[test]
    fn param_lookup() {
        let req = request("", &[], "");
        assert_eq!(req.param("id"), Some("42"));
        assert_eq!(req.param("name"), None);
        assert_eq!(req.param_at(0), Some("42"));
        assert_eq!(req.param_at(1), None);
    }

    #[test]
    fn query_last_value_wins() {
        let req = request("a=1&b=x%20y&a=2&c", &[], "");
        assert_eq!(req.query("a"), Some("2"));
        assert_eq!(req.query("b"), Some("x y"));
        assert_eq!(req.query("c"), Some(""));
        assert_eq!(req.query("missing").unwrap_or("fallback"), "fallback");
        assert_eq!(req.query_all("a").collect::<Vec<_>>(), ["1", "2"]);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = request("", &[("X-Request-Id", "abc")], "");
        assert_eq!(req.header("x-request-id"), Some("abc"));
        assert_eq!(req.header("X-REQUEST-ID"), Some("abc"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn json_body_is_parsed_independently_of_content_type() {
        let req = request("", &[], r#"{"name":"Ada","age":36}"#);
        assert_eq!(req.json().get("name"), Some(&json!("Ada")));
        assert_eq!(req.input("age"), Some(Input::Json(&json!(36))));
        assert_eq!(req.input("name").and_then(|i| i.as_str()), Some("Ada"));
    }

    #[test]
    fn malformed_or_non_object_json_is_an_empty_map() {
        assert!(request("", &[], "{not json").json().is_empty());
        assert!(request("", &[], "[1,2,3]").json().is_empty());
        assert!(request("", &[], "\"text\"").json().is_empty());
        assert!(request("", &[], "").json().is_empty());
    }

    #[test]
    fn form_fields_take_precedence_over_json() {
        // a form body that also happens to parse as JSON is impossible, so the
        // precedence is checked with a form body and a hand-built JSON map.
        let mut req = request("", &[FORM], "name=form&only=field");
        req.json = json!({ "name": "json", "extra": 1 }).as_object().cloned().unwrap();

        assert_eq!(req.input("name"), Some(Input::Field("form")));
        assert_eq!(req.input("only").and_then(|i| i.as_str()), Some("field"));
        assert_eq!(req.input("extra").map(|i| i.to_value()), Some(json!(1)));
    }

    #[test]
    fn form_fields_require_form_content_type() {
        let req = request("", &[], "name=form");
        assert_eq!(req.input("name"), None);
    }

    #[test]
    fn json_null_counts_as_missing() {
        let req = request("", &[], r#"{"gone":null}"#);
        assert_eq!(req.input("gone"), None);
        assert_eq!(req.input("gone").and_then(|i| i.as_str()).unwrap_or("default"), "default");
    }
}
