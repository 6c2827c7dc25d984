//! HTTP server and graceful shutdown.
//!
//! The server is only transport: it reads a request off the wire, hands a
//! [`RawRequest`] to the [`Dispatcher`], and writes the [`Reply`] back.
//! Dispatch itself is synchronous; concurrency comes from running one tokio
//! task per connection.
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dispatch::{Dispatcher, Fallback, RawRequest, StaticFile};
use crate::error::Error;
use crate::response::{ContentType, Reply};
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: String,
    fallback: Option<Arc<dyn Fallback>>,
}

impl Server {
    /// Configures the server to bind to `addr` (a `host:port` string) when
    /// [`serve`](Server::serve) is called.
    ///
    /// ```rust,no_run
    /// use routa::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { addr: addr.into(), fallback: None }
    }

    /// Address and fallback file taken from a [`Config`].
    pub fn from_config(config: &Config) -> Self {
        let server = Self::bind(config.bind_address.clone());
        match &config.index_file {
            Some(path) => server.fallback(StaticFile::new(path)),
            None => server,
        }
    }

    /// Content served when no route matches. Without one, the server sends 404.
    pub fn fallback(mut self, fallback: impl Fallback) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops when `signal` resolves.
    pub async fn serve_with_shutdown<S>(self, router: Router, signal: S) -> Result<(), Error>
    where
        S: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.addr.as_str()).await?;
        self.serve_on(listener, router, signal).await
    }

    /// Serves on an already-bound listener until `signal` resolves.
    pub async fn serve_on<S>(self, listener: TcpListener, router: Router, signal: S) -> Result<(), Error>
    where
        S: Future<Output = ()>,
    {
        // One dispatcher, shared read-only by every connection task.
        let dispatcher = Arc::new(Dispatcher::new(router).with_fallback(self.fallback));

        info!(addr = %listener.local_addr()?, routes = dispatcher.router().len(), "routa listening");

        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // check shutdown first so a SIGTERM immediately stops
                // accepting, even if more connections are queued
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let dispatcher = Arc::clone(&dispatcher);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // called once per request on the connection
                        let svc = service_fn(move |req| {
                            let dispatcher = Arc::clone(&dispatcher);
                            async move { handle(dispatcher, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // reap finished tasks so the set does not grow without bound
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("routa stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Collects the body, dispatches, and converts the reply for hyper.
///
/// The error type is [`Infallible`]: every failure becomes a response.
async fn handle(
    dispatcher: Arc<Dispatcher>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "failed to read request body");
            return Ok(into_http(Reply::with_body(Status::BadRequest, ContentType::Text, "400 Bad Request")));
        }
    };

    Ok(into_http(dispatcher.dispatch(raw_request(&parts, body))))
}

/// Header values are decoded lossily so non-ASCII bytes never drop a header.
fn raw_request(parts: &http::request::Parts, body: Bytes) -> RawRequest {
    let headers = parts.headers.iter()
        .map(|(k, v)| (k.as_str().to_owned(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();
    let target = parts.uri.path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned());

    RawRequest { method: parts.method.as_str().to_owned(), target, headers, body }
}

fn into_http(reply: Reply) -> http::Response<Full<Bytes>> {
    let mut builder = http::Response::builder().status(reply.status);
    for (name, value) in &reply.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for cookie in &reply.cookies {
        builder = builder.header(http::header::SET_COOKIE, cookie.to_header_value());
    }

    builder.body(Full::new(reply.body)).unwrap_or_else(|e| {
        error!(error = %e, "reply could not be encoded");
        let mut res = http::Response::new(Full::new(Bytes::from_static(b"500 Internal Server Error")));
        *res.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
        res
    })
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). On Windows only Ctrl-C.
///
/// If a handler cannot be installed, that source is simply never triggered.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::{Cookie, CookieOptions};

    #[test]
    fn reply_headers_and_cookies_reach_hyper() {
        let mut reply = Reply::with_body(201_u16, ContentType::Json, "{}");
        reply.cookies.push(Cookie { name: "a".into(), value: "1".into(), options: CookieOptions::new() });
        reply.cookies.push(Cookie { name: "b".into(), value: "2".into(), options: CookieOptions::new() });

        let res = into_http(reply);
        assert_eq!(res.status(), http::StatusCode::CREATED);
        assert_eq!(res.headers()["content-type"], "application/json; charset=utf-8");
        let cookies: Vec<_> = res.headers().get_all(http::header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, ["a=1; Path=/", "b=2; Path=/"]);
    }

    #[test]
    fn non_ascii_header_values_are_kept() {
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("/api/users?x=1")
            .header("x-name", &b"caf\xc3\xa9"[..])
            .header("x-raw", &b"a\xffb"[..])
            .body(())
            .unwrap()
            .into_parts();

        let raw = raw_request(&parts, Bytes::from_static(b"{}"));
        assert_eq!(raw.method, "POST");
        assert_eq!(raw.target, "/api/users?x=1");
        assert!(raw.headers.contains(&("x-name".to_owned(), "café".to_owned())));
        assert!(raw.headers.contains(&("x-raw".to_owned(), "a\u{fffd}b".to_owned())));
    }

    #[test]
    fn unencodable_reply_becomes_500() {
        let mut reply = Reply::empty(200_u16);
        reply.headers.push(("bad header".into(), "x".into()));
        assert_eq!(into_http(reply).status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
