//! Cookies set by a handler and their `Set-Cookie` wire form.

use std::fmt;

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Bytes left as-is in a cookie value; everything else is percent-encoded.
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_');

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            Self::Lax    => "Lax",
            Self::Strict => "Strict",
            Self::None   => "None",
        }
    }
}

/// When a cookie expires.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Expires {
    /// Dropped when the browser closes.
    #[default]
    Session,
    /// Unix timestamp, in seconds.
    At(i64),
    /// Written to the `Expires` attribute verbatim.
    Raw(String),
}

impl From<i64> for Expires {
    fn from(ts: i64) -> Self {
        if ts == 0 { Self::Session } else { Self::At(ts) }
    }
}

impl From<&str> for Expires {
    fn from(s: &str) -> Self {
        match s.trim().parse::<i64>() {
            Ok(ts) => ts.into(),
            Err(_) => Self::Raw(s.to_owned()),
        }
    }
}

/// Attributes of a cookie.
///
/// `res.cookie(name, value, opts)` accepts the full options, or just an
/// expiry (a number or a string) which gets the defaults for everything else:
///
/// ```rust
/// # fn demo(res: &mut routa::Response) -> Result<(), routa::Error> {
/// use routa::{CookieOptions, SameSite};
///
/// res.cookie("theme", "dark", 1_900_000_000)?;
/// res.cookie("sid", "abc", CookieOptions::new().http_only(true).same_site(SameSite::Strict))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CookieOptions {
    pub expires: Expires,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expires(mut self, expires: impl Into<Expires>) -> Self {
        self.expires = expires.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            expires: Expires::Session,
            path: "/".to_owned(),
            domain: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }
}

impl From<i64> for CookieOptions {
    fn from(ts: i64) -> Self { Self::new().expires(ts) }
}

// Integer literals default to i32.
impl From<i32> for CookieOptions {
    fn from(ts: i32) -> Self { Self::new().expires(i64::from(ts)) }
}

impl From<&str> for CookieOptions {
    fn from(s: &str) -> Self { Self::new().expires(s) }
}

impl From<String> for CookieOptions {
    fn from(s: String) -> Self { Self::new().expires(s.as_str()) }
}

/// A cookie queued on a response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
}

impl Cookie {
    /// The value of the `Set-Cookie` header for this cookie.
    pub fn to_header_value(&self) -> String {
        self.header_value_at(Utc::now())
    }

    fn header_value_at(&self, now: DateTime<Utc>) -> String {
        let opts = &self.options;
        let mut out = format!("{}={}", self.name, utf8_percent_encode(&self.value, COOKIE_VALUE));

        match &opts.expires {
            Expires::Session => {}
            Expires::At(ts) => {
                if let Some(at) = DateTime::<Utc>::from_timestamp(*ts, 0) {
                    let max_age = (*ts - now.timestamp()).max(0);
                    out.push_str(&format!(
                        "; Expires={}; Max-Age={max_age}",
                        at.format("%a, %d %b %Y %H:%M:%S GMT"),
                    ));
                }
            }
            Expires::Raw(raw) => out.push_str(&format!("; Expires={raw}")),
        }
        if !opts.path.is_empty() {
            out.push_str(&format!("; Path={}", opts.path));
        }
        if let Some(domain) = &opts.domain {
            out.push_str(&format!("; Domain={domain}"));
        }
        if opts.secure {
            out.push_str("; Secure");
        }
        if opts.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = opts.same_site {
            out.push_str(&format!("; SameSite={}", same_site.as_str()));
        }
        out
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(value: &str, options: impl Into<CookieOptions>) -> Cookie {
        Cookie { name: "c".into(), value: value.into(), options: options.into() }
    }

    #[test]
    fn bare_expiry_gets_default_options() {
        let opts: CookieOptions = 3600.into();
        assert_eq!(opts.expires, Expires::At(3600));
        assert_eq!(opts.path, "/");
        assert_eq!(opts.domain, None);
        assert!(!opts.secure && !opts.http_only);
        assert_eq!(opts.same_site, None);

        assert_eq!(CookieOptions::from("0").expires, Expires::Session);
        assert_eq!(CookieOptions::from("42").expires, Expires::At(42));
        assert_eq!(
            CookieOptions::from("Wed, 21 Oct 2037 07:28:00 GMT").expires,
            Expires::Raw("Wed, 21 Oct 2037 07:28:00 GMT".into()),
        );
    }

    #[test]
    fn session_cookie_with_defaults() {
        assert_eq!(cookie("v", CookieOptions::new()).to_header_value(), "c=v; Path=/");
    }

    #[test]
    fn all_attributes() {
        let opts = CookieOptions::new()
            .path("/app")
            .domain("example.com")
            .secure(true)
            .http_only(true)
            .same_site(SameSite::Strict);
        assert_eq!(
            cookie("v", opts).to_header_value(),
            "c=v; Path=/app; Domain=example.com; Secure; HttpOnly; SameSite=Strict",
        );
    }

    #[test]
    fn timestamp_expiry_sets_date_and_max_age() {
        let now = DateTime::<Utc>::from_timestamp(1_000, 0).unwrap();
        let c = cookie("v", 1_060);
        assert_eq!(
            c.header_value_at(now),
            "c=v; Expires=Thu, 01 Jan 1970 00:17:40 GMT; Max-Age=60; Path=/",
        );
    }

    #[test]
    fn value_is_percent_encoded() {
        let c = cookie("a b;é", CookieOptions::new().path(""));
        assert_eq!(c.to_header_value(), "c=a%20b%3B%C3%A9");
    }
}
