//! # routa
//!
//! A minimal HTTP request router and dispatcher.
//!
//! Register handlers under `{placeholder}` path templates, and routa matches
//! each request to the first route that fits, binds the handler's arguments
//! by type or by name, runs it, and turns what it returns into a JSON
//! response. That is the whole framework: no middleware, no sessions, no
//! streaming.
//!
//! - Templates compile once, at startup. A bad one stops the app there.
//! - Matching is first-registered-wins, segment by segment, per method.
//! - Arguments are resolved to slots at registration; dispatch does no lookups.
//! - Unmatched requests get a fallback page (usually `index.html`) or a 404.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use routa::{Request, Response, Router, Server, Status, handler};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         // returned data is sent as JSON
//!         .get("/api/users/{name}", handler!(|name: Option<&str>| {
//!             json!({ "message": format!("Hello {}", name.unwrap_or_default()) })
//!         }))
//!         // or drive the response yourself
//!         .post("/api/users", handler!(|req: &Request, res: &mut Response| {
//!             let name = req.input("name").and_then(|v| v.as_str()).unwrap_or("anonymous");
//!             res.status(Status::Created)?
//!                 .header("Location", format!("/api/users/{name}"))?
//!                 .json(&json!({ "name": name }))
//!         }));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//! ```

mod config;
mod cookie;
mod dispatch;
mod error;
mod handler;
mod method;
mod path;
mod pattern;
mod request;
mod response;
mod router;
mod server;
mod status;

pub use config::Config;
pub use cookie::{Cookie, CookieOptions, Expires, SameSite};
pub use dispatch::{Dispatcher, Fallback, NOT_FOUND_BODY, RawRequest, StaticFile};
pub use error::{Error, Malformed};
pub use handler::{Arg, Bind, Context, Declared, Handler, Role, Slot};
pub use method::Method;
pub use path::NormalizedPath;
pub use request::{Input, Request};
pub use response::{ContentType, IntoBody, Json, Reply, Response};
pub use router::{Match, Router};
pub use server::Server;
pub use status::{IntoStatus, Status};

#[doc(hidden)]
pub use handler::FnHandler;
