//! Round-trips over a real TCP socket.

use routa::{Response, Router, Server, handler};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn roundtrip(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn serves_routes_and_404_then_shuts_down() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let app = Router::new()
        .get("/api/users/{name}", handler!(|name: Option<&str>| {
            json!({ "message": format!("Hello {}", name.unwrap_or_default()) })
        }))
        .post("/api/echo", handler!(|res: &mut Response, req: &routa::Request| {
            res.cookie("seen", "yes", 0)?.status(201)?.send(req.body().to_vec())
        }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(Server::bind("unused").serve_on(listener, app, async {
        let _ = stopped.await;
    }));

    let ok = roundtrip(addr, "GET /api/users/Ada HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n").await;
    assert!(ok.starts_with("HTTP/1.1 200 OK\r\n"), "{ok}");
    assert!(ok.to_ascii_lowercase().contains("content-type: application/json; charset=utf-8"), "{ok}");
    assert!(ok.ends_with(r#"{"message":"Hello Ada"}"#), "{ok}");

    let echo = roundtrip(
        addr,
        "POST /api/echo HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    ).await;
    assert!(echo.starts_with("HTTP/1.1 201 Created\r\n"), "{echo}");
    assert!(echo.to_ascii_lowercase().contains("set-cookie: seen=yes; path=/"), "{echo}");
    assert!(echo.ends_with("hello"), "{echo}");

    let missing = roundtrip(addr, "DELETE /x HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n").await;
    assert!(missing.starts_with("HTTP/1.1 404 Not Found\r\n"), "{missing}");
    assert!(missing.ends_with("404 Not Found"), "{missing}");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
