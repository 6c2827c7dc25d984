//! Handler trait, argument binding, and type erasure.
//!
//! # How arguments are bound
//!
//! A handler declares parameters. Each one is fed from one of four places,
//! decided once at registration and stored with the route as a [`Slot`]:
//!
//! 1. its **type** says request or response (`&Request`, `&mut Response`);
//! 2. its **name** is `req`/`request` or `res`/`response`;
//! 3. its **name** equals a placeholder of the route template;
//! 4. otherwise it is bound to "absent" (`None` / [`Arg::Absent`]).
//!
//! Rust cannot ask a closure for its parameter names at runtime, so the
//! [`handler!`](crate::handler!) macro reads them at compile time:
//!
//! ```text
//! handler!(|res: &mut Response, name: Option<&str>| …)   ← user writes this
//!        ↓ macro expansion
//! FnHandler::new([("res", Response), ("name", Value)], …) ← declared params
//!        ↓ router.get("/users/{name}", h)
//! resolve(declared, ["name"]) = [Slot::Response, Slot::Param(0)]
//!        ↓ stored as BoxedHandler = Arc<dyn ErasedHandler> + Vec<Slot>
//! handler.call(&slots, Context { req, res })  at request time
//! ```
//!
//! Dispatch never looks a name up: it walks the slot list.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

// ── Binding descriptor ────────────────────────────────────────────────────────

/// What a parameter's type says about where it can be fed from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// `&Request`: always the request, whatever the name.
    Request,
    /// `&mut Response`: always the response, whatever the name.
    Response,
    /// `Option<&str>` / `Option<String>`: a path parameter or `None`.
    Value,
    /// [`Arg`]: whatever the name resolves to.
    Any,
}

/// One declared handler parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Declared {
    pub name: &'static str,
    pub role: Role,
}

/// Where one argument is taken from at dispatch time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Slot {
    Request,
    Response,
    /// Index into the route's placeholder list.
    Param(usize),
    Absent,
}

const REQUEST_ALIASES: [&str; 2] = ["req", "request"];
const RESPONSE_ALIASES: [&str; 2] = ["res", "response"];

/// Resolves declared parameters against a template's placeholder names.
///
/// Returns `None` when more than one argument would need the response.
pub(crate) fn resolve(declared: &[Declared], names: &[String]) -> Option<Vec<Slot>> {
    let slots: Vec<Slot> = declared.iter().map(|d| slot_for(d, names)).collect();

    let lent = declared.iter().zip(&slots)
        .filter(|(d, s)| **s == Slot::Response && d.role != Role::Value)
        .count();
    (lent <= 1).then_some(slots)
}

fn slot_for(param: &Declared, names: &[String]) -> Slot {
    match param.role {
        Role::Request => return Slot::Request,
        Role::Response => return Slot::Response,
        Role::Value | Role::Any => {}
    }
    if REQUEST_ALIASES.contains(&param.name) {
        Slot::Request
    } else if RESPONSE_ALIASES.contains(&param.name) {
        Slot::Response
    } else if let Some(i) = names.iter().position(|n| n == param.name) {
        Slot::Param(i)
    } else {
        Slot::Absent
    }
}

// ── Argument sources ──────────────────────────────────────────────────────────

/// What a handler can borrow its arguments from during one dispatch.
///
/// The response sits in an `Option` so exactly one argument can take the
/// mutable borrow out of it.
pub struct Context<'a> {
    req: &'a Request,
    res: Option<&'a mut Response>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(req: &'a Request, res: &'a mut Response) -> Self {
        Self { req, res: Some(res) }
    }
}

/// A parameter type a handler may declare.
///
/// Implemented for `&Request`, `&mut Response`, `Option<&str>`,
/// `Option<String>` and [`Arg`].
pub trait Bind<'a>: Sized {
    const ROLE: Role;

    fn bind(slot: Slot, cx: &mut Context<'a>) -> Result<Self, Error>;
}

impl<'a> Bind<'a> for &'a Request {
    const ROLE: Role = Role::Request;

    fn bind(_: Slot, cx: &mut Context<'a>) -> Result<Self, Error> {
        Ok(cx.req)
    }
}

impl<'a> Bind<'a> for &'a mut Response {
    const ROLE: Role = Role::Response;

    fn bind(_: Slot, cx: &mut Context<'a>) -> Result<Self, Error> {
        cx.res.take().ok_or(Error::ResponseUnavailable)
    }
}

impl<'a> Bind<'a> for Option<&'a str> {
    const ROLE: Role = Role::Value;

    fn bind(slot: Slot, cx: &mut Context<'a>) -> Result<Self, Error> {
        Ok(match slot {
            Slot::Param(i) => cx.req.param_at(i),
            _ => None,
        })
    }
}

impl<'a> Bind<'a> for Option<String> {
    const ROLE: Role = Role::Value;

    fn bind(slot: Slot, cx: &mut Context<'a>) -> Result<Self, Error> {
        Ok(<Option<&'a str> as Bind<'a>>::bind(slot, cx)?.map(str::to_owned))
    }
}

/// A parameter bound purely by its name.
///
/// ```rust
/// use routa::{Arg, handler};
///
/// let h = handler!(|res: Arg, name: Arg| match (res, name) {
///     (Arg::Response(res), Arg::Param(name)) => res.send(format!("hi {name}")),
///     _ => Ok(()),
/// });
/// ```
#[derive(Debug)]
pub enum Arg<'a> {
    Request(&'a Request),
    Response(&'a mut Response),
    Param(&'a str),
    Absent,
}

impl<'a> Bind<'a> for Arg<'a> {
    const ROLE: Role = Role::Any;

    fn bind(slot: Slot, cx: &mut Context<'a>) -> Result<Self, Error> {
        Ok(match slot {
            Slot::Request => Arg::Request(cx.req),
            Slot::Response => cx.res.take().map_or(Arg::Absent, Arg::Response),
            Slot::Param(i) => cx.req.param_at(i).map_or(Arg::Absent, Arg::Param),
            Slot::Absent => Arg::Absent,
        })
    }
}

// ── Type erasure ──────────────────────────────────────────────────────────────

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn params(&self) -> &[Declared];

    /// Runs the handler. `Ok(Some(_))` is a return value to send as JSON.
    fn call(&self, slots: &[Slot], cx: Context<'_>) -> Result<Option<Value>, Error>;
}

/// A type-erased handler shared across concurrent dispatches.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself: build handlers with
/// [`handler!`](crate::handler!). The trait is sealed.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

/// The concrete handler produced by [`handler!`](crate::handler!).
#[doc(hidden)]
pub struct FnHandler<F> {
    params: Vec<Declared>,
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&[Slot], &mut Context<'_>) -> Result<Option<Value>, Error> + Send + Sync + 'static,
{
    pub fn new(params: Vec<Declared>, f: F) -> Self {
        Self { params, f }
    }
}

impl<F> private::Sealed for FnHandler<F>
where
    F: Fn(&[Slot], &mut Context<'_>) -> Result<Option<Value>, Error> + Send + Sync + 'static,
{
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&[Slot], &mut Context<'_>) -> Result<Option<Value>, Error> + Send + Sync + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl<F> ErasedHandler for FnHandler<F>
where
    F: Fn(&[Slot], &mut Context<'_>) -> Result<Option<Value>, Error> + Send + Sync,
{
    fn params(&self) -> &[Declared] {
        &self.params
    }

    fn call(&self, slots: &[Slot], mut cx: Context<'_>) -> Result<Option<Value>, Error> {
        (self.f)(slots, &mut cx)
    }
}

/// Builds a route handler from a closure, keeping its parameter names.
///
/// Every parameter needs a type annotation. The body may use `?` on anything
/// that converts into [`Error`](crate::Error), and its value goes through
/// [`IntoBody`](crate::IntoBody): return `()` after sending the response
/// yourself, or return data to have it sent as JSON.
///
/// ```rust
/// use routa::{Response, Router, handler};
/// use serde_json::json;
///
/// let app = Router::new()
///     .get("/api/users/{name}", handler!(|name: Option<&str>| {
///         json!({ "message": format!("Hello {}", name.unwrap_or_default()) })
///     }))
///     .post("/api/ping", handler!(|res: &mut Response| {
///         res.status(202)?.json(&json!({ "pong": true }))
///     }));
/// ```
#[macro_export]
macro_rules! handler {
    ($(move)? || $body:expr) => {
        $crate::FnHandler::new(
            ::std::vec::Vec::new(),
            move |_: &[$crate::Slot], _: &mut $crate::Context<'_>| {
                #[allow(unused_braces)]
                let __out = $body;
                $crate::IntoBody::into_body(__out)
            },
        )
    };
    ($(move)? |$($name:ident : $ty:ty),+ $(,)?| $body:expr) => {
        $crate::FnHandler::new(
            ::std::vec![$(
                $crate::Declared {
                    name: ::std::stringify!($name),
                    role: <$ty as $crate::Bind<'static>>::ROLE,
                }
            ),+],
            move |__slots: &[$crate::Slot], __cx: &mut $crate::Context<'_>| {
                let mut __slots = __slots.iter().copied();
                $(
                    let $name: $ty = $crate::Bind::bind(
                        __slots.next().unwrap_or($crate::Slot::Absent),
                        __cx,
                    )?;
                )+
                #[allow(unused_braces)]
                let __out = $body;
                $crate::IntoBody::into_body(__out)
            },
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared(params: &[(&'static str, Role)]) -> Vec<Declared> {
        params.iter().map(|&(name, role)| Declared { name, role }).collect()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn type_beats_name() {
        let d = declared(&[("name", Role::Request), ("req", Role::Response)]);
        let slots = resolve(&d, &names(&["name"])).unwrap();
        assert_eq!(slots, [Slot::Request, Slot::Response]);
    }

    #[test]
    fn alias_beats_placeholder() {
        let d = declared(&[("res", Role::Any), ("request", Role::Any)]);
        let slots = resolve(&d, &names(&["res", "request"])).unwrap();
        assert_eq!(slots, [Slot::Response, Slot::Request]);
    }

    #[test]
    fn placeholder_then_absent() {
        let d = declared(&[("id", Role::Value), ("page", Role::Value), ("name", Role::Any)]);
        let slots = resolve(&d, &names(&["name", "id"])).unwrap();
        assert_eq!(slots, [Slot::Param(1), Slot::Absent, Slot::Param(0)]);
    }

    #[test]
    fn value_parameter_named_like_an_alias_does_not_take_the_response() {
        let d = declared(&[("response", Role::Response), ("res", Role::Value)]);
        let slots = resolve(&d, &[]).unwrap();
        assert_eq!(slots, [Slot::Response, Slot::Response]);
    }

    #[test]
    fn response_cannot_be_lent_twice() {
        let d = declared(&[("res", Role::Any), ("out", Role::Response)]);
        assert!(resolve(&d, &[]).is_none());
    }

    #[test]
    fn macro_declares_names_and_roles_in_order() {
        let h = crate::handler!(|response: &mut Response, name: Option<&str>, r: &Request, x: Arg| {
            let _ = (response, name, r, x);
        });
        assert_eq!(
            h.params,
            declared(&[
                ("response", Role::Response),
                ("name", Role::Value),
                ("r", Role::Request),
                ("x", Role::Any),
            ]),
        );
    }

    #[test]
    fn macro_accepts_handlers_without_parameters() {
        let h = crate::handler!(|| "ok");
        assert!(h.params.is_empty());
    }
}
