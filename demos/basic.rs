//! Minimal routa app: JSON greetings, form/JSON input, cookies, and an SPA fallback.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic            # defaults
//!   RUST_LOG=debug cargo run --example basic routa.toml  # bind address + index_file from TOML
//!
//! Try:
//!   curl http://localhost:3000/api/users/Ada
//!   curl http://localhost:3000/api/users/%E0%B8%AA%E0%B8%A1
//!   curl 'http://localhost:3000/api/search?q=rust&tag=a&tag=b'
//!   curl -X POST http://localhost:3000/api/users -d 'name=Grace'
//!   curl -X POST http://localhost:3000/api/users \
//!        -H 'content-type: application/json' -d '{"name":"Linus"}'
//!   curl -i -X PUT http://localhost:3000/api/prefs/theme/dark
//!   curl -i http://localhost:3000/anything/else

use routa::{Config, CookieOptions, Request, Response, Router, SameSite, Server, Status, handler};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), routa::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let app = Router::new()
        // GET /api/users/{name}: the response is bound by type, the name by
        // matching the placeholder
        .get("/api/users/{name}", handler!(|res: &mut Response, name: Option<&str>| {
            res.json(&json!({ "message": format!("Hello {}", name.unwrap_or_default()) }))
        }))
        // GET /api/search: returned data is sent as JSON
        .get("/api/search", handler!(|req: &Request| {
            json!({
                "q": req.query("q").unwrap_or(""),
                "tags": req.query_all("tag").collect::<Vec<_>>(),
            })
        }))
        // POST /api/users: form field or JSON member, form wins
        .post("/api/users", handler!(|req: &Request, res: &mut Response| {
            match req.input("name").and_then(|v| v.as_str()) {
                Some(name) => {
                    res.status(Status::Created)?.header("Location", format!("/api/users/{name}"))?;
                    Some(json!({ "name": name }))
                }
                None => {
                    res.status(Status::UnprocessableContent)?;
                    Some(json!({ "error": "name is required" }))
                }
            }
        }))
        // PUT /api/prefs/{key}/{value}: both placeholders always capture
        .put("/api/prefs/{key}/{value}", handler!(|res: &mut Response, key: Option<&str>, value: Option<&str>| {
            if let (Some(key), Some(value)) = (key, value) {
                let opts = CookieOptions::new().http_only(true).same_site(SameSite::Lax);
                res.cookie(key, value, opts)?.status(Status::NoContent)?.send("")?;
            }
        }));

    Server::from_config(&config).serve(app).await
}
