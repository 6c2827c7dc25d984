//! Outgoing response, its finalized [`Reply`], and the [`IntoBody`] trait.
//!
//! A handler mutates the [`Response`] it was given and ends it with
//! [`send`](Response::send) or [`json`](Response::json). Or it returns data
//! and lets the dispatcher call `json` for it. Either way the response is
//! finalized exactly once.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::cookie::{Cookie, CookieOptions};
use crate::error::Error;
use crate::status::{IntoStatus, Status};

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content types the dispatcher itself emits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Html, // text/html; charset=utf-8
    Json, // application/json; charset=utf-8
    Text, // text/plain; charset=utf-8
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "text/html; charset=utf-8",
            Self::Json => "application/json; charset=utf-8",
            Self::Text => "text/plain; charset=utf-8",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// The response a handler builds.
///
/// Mutators return `&mut Self` for chaining and fail with
/// [`Error::ResponseAlreadySent`] once the response is finalized:
///
/// ```rust
/// # fn demo(res: &mut routa::Response) -> Result<(), routa::Error> {
/// use routa::Status;
///
/// res.status(Status::Created)?
///     .header("Location", "/users/42")?
///     .cookie("seen", "1", 0)?
///     .json(&serde_json::json!({ "id": 42 }))
/// # }
/// ```
#[derive(Debug)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    cookies: Vec<Cookie>,
    body: Option<Bytes>,
}

impl Response {
    /// A fresh `200 OK` with no headers.
    pub fn new() -> Self {
        Self { status: Status::Ok.into(), headers: Vec::new(), cookies: Vec::new(), body: None }
    }

    /// Sets a header, replacing an earlier one of the same name (any case).
    pub fn header(&mut self, name: &str, value: impl Into<String>) -> Result<&mut Self, Error> {
        self.ensure_open()?;
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name.to_owned(), value)),
        }
        Ok(self)
    }

    /// Queues a cookie. Cookies accumulate; nothing is replaced.
    pub fn cookie(
        &mut self,
        name: &str,
        value: impl Into<String>,
        options: impl Into<CookieOptions>,
    ) -> Result<&mut Self, Error> {
        self.ensure_open()?;
        self.cookies.push(Cookie {
            name: name.to_owned(),
            value: value.into(),
            options: options.into(),
        });
        Ok(self)
    }

    /// Sets the status code. Takes a [`Status`] or an integer in `100..=999`.
    pub fn status(&mut self, code: impl IntoStatus) -> Result<&mut Self, Error> {
        self.ensure_open()?;
        self.status = code.into_status()?;
        Ok(self)
    }

    /// Serializes `data` (non-ASCII left unescaped), sets a JSON content type
    /// and sends it.
    pub fn json<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<(), Error> {
        self.ensure_open()?;
        let body = serde_json::to_vec(data)?;
        self.header("Content-Type", ContentType::Json.as_str())?;
        self.send(body)
    }

    /// Finalizes the response with `body`. Nothing can be changed afterwards.
    pub fn send(&mut self, body: impl Into<Bytes>) -> Result<(), Error> {
        self.ensure_open()?;
        self.body = Some(body.into());
        Ok(())
    }

    pub fn is_sent(&self) -> bool {
        self.body.is_some()
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.is_sent() { Err(Error::ResponseAlreadySent) } else { Ok(()) }
    }

    /// The finalized reply, or `None` if nothing was sent.
    pub(crate) fn into_reply(self) -> Option<Reply> {
        let body = self.body?;
        Some(Reply { status: self.status, headers: self.headers, cookies: self.cookies, body })
    }
}

impl Default for Response {
    fn default() -> Self { Self::new() }
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// A finalized response, ready for the transport.
#[derive(Clone, Debug)]
pub struct Reply {
    pub(crate) status: u16,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) cookies: Vec<Cookie>,
    pub(crate) body: Bytes,
}

impl Reply {
    pub(crate) fn with_body(status: impl Into<u16>, content_type: ContentType, body: impl Into<Bytes>) -> Self {
        Self {
            status: status.into(),
            headers: vec![("Content-Type".to_owned(), content_type.as_str().to_owned())],
            cookies: Vec::new(),
            body: body.into(),
        }
    }

    pub(crate) fn empty(status: impl Into<u16>) -> Self {
        Self { status: status.into(), headers: Vec::new(), cookies: Vec::new(), body: Bytes::new() }
    }

    pub fn status(&self) -> u16 { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn cookies(&self) -> &[Cookie] { &self.cookies }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// ── IntoBody ──────────────────────────────────────────────────────────────────

/// Turns a handler's return value into an optional JSON body.
///
/// `None` means "nothing returned": the handler is expected to have sent the
/// response itself. `()`, `Option::None` and JSON `null` are all nothing.
pub trait IntoBody {
    fn into_body(self) -> Result<Option<Value>, Error>;
}

impl IntoBody for () {
    fn into_body(self) -> Result<Option<Value>, Error> { Ok(None) }
}

impl IntoBody for Value {
    fn into_body(self) -> Result<Option<Value>, Error> {
        Ok((!self.is_null()).then_some(self))
    }
}

impl<T: IntoBody> IntoBody for Option<T> {
    fn into_body(self) -> Result<Option<Value>, Error> {
        self.map_or(Ok(None), IntoBody::into_body)
    }
}

impl<T, E> IntoBody for Result<T, E>
where
    T: IntoBody,
    Error: From<E>,
{
    fn into_body(self) -> Result<Option<Value>, Error> {
        self?.into_body()
    }
}

/// Any `Serialize` value, sent as JSON.
///
/// ```rust
/// use routa::{Json, handler};
///
/// #[derive(serde::Serialize)]
/// struct User { name: String }
///
/// let h = handler!(|name: Option<String>| Json(User { name: name.unwrap_or_default() }));
/// ```
#[derive(Clone, Debug)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoBody for Json<T> {
    fn into_body(self) -> Result<Option<Value>, Error> {
        serde_json::to_value(self.0)?.into_body()
    }
}

macro_rules! into_body_via_value {
    ($($ty:ty),* $(,)?) => {$(
        impl IntoBody for $ty {
            fn into_body(self) -> Result<Option<Value>, Error> {
                Ok(Some(Value::from(self)))
            }
        }
    )*};
}

into_body_via_value!(&'static str, String, bool, i32, i64, u32, u64, f64);
