//! Route table and matcher.
//!
//! One list of routes per HTTP method, kept in registration order. Lookup
//! walks the list and the first structural match wins: no specificity
//! ranking, no prefix matches. Registering the same template twice is
//! allowed; the second entry is simply never reached.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Malformed};
use crate::handler::{self, BoxedHandler, Context, Handler, Slot};
use crate::method::Method;
use crate::path::NormalizedPath;
use crate::pattern::Pattern;
use crate::request::Request;
use crate::response::Response;

/// A registered route: compiled template, handler, and the handler's
/// argument slots resolved against the template.
pub(crate) struct Route {
    pattern: Pattern,
    handler: BoxedHandler,
    slots: Vec<Slot>,
}

impl Route {
    pub(crate) fn template(&self) -> &str { self.pattern.template() }

    pub(crate) fn call(&self, req: &Request, res: &mut Response) -> Result<Option<Value>, Error> {
        self.handler.call(&self.slots, Context::new(req, res))
    }
}

/// A successful lookup.
pub struct Match<'r> {
    pub(crate) route: &'r Route,
    pub(crate) params: Vec<(String, String)>,
}

impl Match<'_> {
    /// The template of the route that matched, as registered.
    pub fn template(&self) -> &str { self.route.template() }

    /// Placeholder name → captured segment, in template order.
    pub fn params(&self) -> &[(String, String)] { &self.params }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

/// The application router.
///
/// Build it once at startup, then share it read-only. Each registration
/// returns `self` so calls chain:
///
/// ```rust
/// use routa::{Router, handler};
///
/// let app = Router::new()
///     .get("/users/{id}",    handler!(|id: Option<&str>| format!("user {}", id.unwrap_or("?"))))
///     .delete("/users/{id}", handler!(|| ()));
/// ```
///
/// The verb methods panic on a malformed template, since a bad route table
/// is a startup bug. Use [`try_route`](Router::try_route) to get the error.
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    pub fn get(self, template: &str, handler: impl Handler) -> Self {
        self.add(Method::Get, template, handler)
    }

    pub fn post(self, template: &str, handler: impl Handler) -> Self {
        self.add(Method::Post, template, handler)
    }

    pub fn put(self, template: &str, handler: impl Handler) -> Self {
        self.add(Method::Put, template, handler)
    }

    pub fn head(self, template: &str, handler: impl Handler) -> Self {
        self.add(Method::Head, template, handler)
    }

    pub fn delete(self, template: &str, handler: impl Handler) -> Self {
        self.add(Method::Delete, template, handler)
    }

    pub fn patch(self, template: &str, handler: impl Handler) -> Self {
        self.add(Method::Patch, template, handler)
    }

    fn add(self, method: Method, template: &str, handler: impl Handler) -> Self {
        self.try_route(method, template, handler)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Compiles `template`, binds the handler's arguments against it, and
    /// appends the route after every route already registered for `method`.
    pub fn try_route(mut self, method: Method, template: &str, handler: impl Handler) -> Result<Self, Error> {
        let malformed = |kind| Error::MalformedRoute { template: template.to_owned(), kind };

        let pattern = Pattern::compile(template).map_err(malformed)?;
        let handler = handler.into_boxed_handler();
        let slots = handler::resolve(handler.params(), pattern.names())
            .ok_or_else(|| malformed(Malformed::ResponseBoundTwice))?;

        debug!(%method, template, params = ?pattern.names(), ?slots, "route registered");

        self.routes.entry(method).or_default().push(Route { pattern, handler, slots });
        Ok(self)
    }

    /// Finds the first route registered under `method` whose template
    /// matches `path`.
    pub fn lookup(&self, method: Method, path: &NormalizedPath) -> Option<Match<'_>> {
        let routes = self.routes.get(&method)?;
        let segments = path.segments();

        routes.iter().find_map(|route| {
            let captured = route.pattern.captures(&segments)?;
            let params = route.pattern.names().iter()
                .zip(captured)
                .map(|(k, v)| (k.clone(), v.to_owned()))
                .collect();
            Some(Match { route, params })
        })
    }

    /// Number of registered routes across all methods.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
