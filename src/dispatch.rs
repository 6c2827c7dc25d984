//! Request dispatch: match, bind, invoke, finalize.
//!
//! [`Dispatcher::dispatch`] is synchronous and runs one request to completion.
//! It never fails: an unmatched path gets the fallback page or a 404, a
//! handler error becomes a 500 (or is logged if the handler had already sent
//! its response), and a handler that returns nothing without sending gets an
//! empty 200.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::method::Method;
use crate::path::NormalizedPath;
use crate::request::Request;
use crate::response::{ContentType, Reply, Response};
use crate::router::Router;
use crate::status::Status;

/// Body of the 404 sent when neither a route nor the fallback answers.
pub const NOT_FOUND_BODY: &str = "404 Not Found";

const INTERNAL_ERROR_BODY: &str = "500 Internal Server Error";

// ── Transport input ───────────────────────────────────────────────────────────

/// A request as the transport delivers it: nothing parsed, nothing decoded.
#[derive(Clone, Debug)]
pub struct RawRequest {
    pub method: String,
    /// The request target: path plus optional `?query`.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl RawRequest {
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self { method: method.into(), target: target.into(), headers: Vec::new(), body: Bytes::new() }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Splits the target into its path and query string; any `#fragment` is dropped.
    fn split_target(&self) -> (&str, &str) {
        let target = self.target.split('#').next().unwrap_or_default();
        target.split_once('?').unwrap_or((target, ""))
    }
}

// ── Fallback ──────────────────────────────────────────────────────────────────

/// Content served with `200 OK` when no route matches.
pub trait Fallback: Send + Sync + 'static {
    /// `None` sends the 404 instead.
    fn content(&self) -> Option<Bytes>;
}

/// Serves one file from disk, if it exists at request time.
///
/// Conventionally the `index.html` of a single-page app, so client-side
/// routes still load the app.
#[derive(Clone, Debug)]
pub struct StaticFile {
    path: PathBuf,
}

impl StaticFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Fallback for StaticFile {
    fn content(&self) -> Option<Bytes> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Some(Bytes::from(bytes)),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "fallback file unavailable");
                None
            }
        }
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// A router plus the fallback used when it has no answer.
///
/// Immutable once built; share it across threads behind an `Arc`.
pub struct Dispatcher {
    router: Router,
    fallback: Option<Arc<dyn Fallback>>,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self { router, fallback: None }
    }

    pub fn fallback(mut self, fallback: impl Fallback) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    pub(crate) fn with_fallback(mut self, fallback: Option<Arc<dyn Fallback>>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn router(&self) -> &Router { &self.router }

    /// Processes one request to completion and returns what to send.
    pub fn dispatch(&self, raw: RawRequest) -> Reply {
        let (raw_path, query) = raw.split_target();
        let path = NormalizedPath::new(raw_path);

        let Ok(method) = raw.method.parse::<Method>() else {
            debug!(method = %raw.method, %path, "unroutable method");
            return self.no_match();
        };
        let Some(matched) = self.router.lookup(method, &path) else {
            debug!(%method, %path, "no route matched");
            return self.no_match();
        };

        let query = query.to_owned();
        let req = Request::new(method, path, matched.params, &query, raw.headers, raw.body);
        let mut res = Response::new();
        let route = matched.route;

        let outcome = route.call(&req, &mut res)
            .and_then(|body| match body {
                Some(value) => res.json(&value),
                None => Ok(()),
            });

        if let Err(e) = outcome {
            if res.is_sent() {
                // the reply that was sent stands; the request ends here
                error!(%method, template = route.template(), error = %e, "handler failed after sending its response");
            } else {
                error!(%method, template = route.template(), error = %e, "handler failed");
                return Reply::with_body(Status::InternalServerError, ContentType::Text, INTERNAL_ERROR_BODY);
            }
        }

        res.into_reply().unwrap_or_else(|| {
            warn!(%method, template = route.template(), "handler returned nothing and sent nothing");
            Reply::empty(Status::Ok)
        })
    }

    fn no_match(&self) -> Reply {
        match self.fallback.as_ref().and_then(|f| f.content()) {
            Some(content) => Reply::with_body(Status::Ok, ContentType::Html, content),
            None => Reply::with_body(Status::NotFound, ContentType::Text, NOT_FOUND_BODY),
        }
    }
}

impl From<Router> for Dispatcher {
    fn from(router: Router) -> Self { Self::new(router) }
}
