//! End-to-end tests: the server runs in-process on an ephemeral port and
//! `reqwest` talks to it as an HTTP proxy, so requests arrive in absolute form
//! exactly as they would from a real client.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use mock_http_proxy::{Config, MockServer};
use reqwest::{Client, Proxy};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

async fn start_mock_server(definitions: PathBuf) -> SocketAddr {
    let config = Config {
        definitions,
        address: "127.0.0.1:0".to_string(),
        ..Config::default()
    };
    let server = MockServer::bind(&config).await.unwrap();
    let addr = server.local_addr();
    tokio::spawn(server.run());
    addr
}

/// Origin that echoes method, path, query, host and body.
async fn start_origin() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let service = service_fn(|req: Request<Incoming>| async move {
                    let method = req.method().clone();
                    let target = req
                        .uri()
                        .path_and_query()
                        .map(|pq| pq.to_string())
                        .unwrap_or_default();
                    let host = req
                        .headers()
                        .get("host")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    let body = req.into_body().collect().await?.to_bytes();
                    let text = format!(
                        "{method} {target} host={host} body={}",
                        String::from_utf8_lossy(&body)
                    );

                    let mut response = Response::new(Full::new(Bytes::from(text)));
                    *response.status_mut() = hyper::StatusCode::CREATED;
                    response
                        .headers_mut()
                        .insert("x-origin", "stub".parse().unwrap());
                    Ok::<_, hyper::Error>(response)
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    addr
}

fn proxied_client(mock_addr: SocketAddr) -> Client {
    Client::builder()
        .proxy(Proxy::http(format!("http://{mock_addr}")).unwrap())
        .build()
        .unwrap()
}

fn write_definition(dir: &Path, name: &str, definition: Value) {
    std::fs::write(dir.join(name), definition.to_string()).unwrap();
}

#[tokio::test]
async fn test_default_response_is_json() {
    let dir = TempDir::new().unwrap();
    write_definition(
        dir.path(),
        "a.json",
        json!({"url": "http://x/a", "method": "GET", "response": {"default": {"ok": true}}}),
    );
    let client = proxied_client(start_mock_server(dir.path().to_path_buf()).await);

    let response = client.get("http://x/a").send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(response.text().await.unwrap(), r#"{"ok":true}"#);
}

#[tokio::test]
async fn test_query_predicate_selects_response() {
    let dir = TempDir::new().unwrap();
    write_definition(
        dir.path(),
        "a.json",
        json!({
            "url": "http://x/a",
            "method": "GET",
            "response": {
                "{{if eq .Query.id \"5\"}}true{{end}}": {"found": true},
                "default": {"found": false}
            }
        }),
    );
    let client = proxied_client(start_mock_server(dir.path().to_path_buf()).await);

    let hit: Value = client
        .get("http://x/a?id=5")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hit, json!({"found": true}));

    let miss: Value = client
        .get("http://x/a?id=9")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(miss, json!({"found": false}));
}

#[tokio::test]
async fn test_unmatched_request_is_proxied_verbatim() {
    let dir = TempDir::new().unwrap();
    let origin = start_origin().await;
    let client = proxied_client(start_mock_server(dir.path().to_path_buf()).await);

    let response = client
        .post(format!("http://{origin}/path?q=1"))
        .body("raw \u{1} bytes")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(response.headers().get("x-origin").unwrap(), "stub");
    assert_eq!(
        response.text().await.unwrap(),
        format!("POST /path?q=1 host={origin} body=raw \u{1} bytes")
    );
}

#[tokio::test]
async fn test_unreadable_definitions_dir_falls_through() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist");
    let origin = start_origin().await;
    let mock_addr = start_mock_server(missing).await;

    let proxied = proxied_client(mock_addr)
        .get(format!("http://{origin}/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(proxied.status(), 201);

    // A direct request carries no target host.
    let direct = Client::builder()
        .no_proxy()
        .build()
        .unwrap()
        .get(format!("http://{mock_addr}/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(direct.status(), 200);
    assert_eq!(direct.text().await.unwrap(), "No mock definitions matching");
}

#[tokio::test]
async fn test_unreachable_origin_is_bad_gateway() {
    let dir = TempDir::new().unwrap();
    let closed = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = proxied_client(start_mock_server(dir.path().to_path_buf()).await);

    let response = client
        .get(format!("http://{closed}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
    assert_eq!(response.text().await.unwrap(), "Failed to proxy request");
}

#[tokio::test]
async fn test_unparseable_body_still_matches() {
    let dir = TempDir::new().unwrap();
    write_definition(
        dir.path(),
        "a.json",
        json!({
            "url": "http://x/orders",
            "method": "POST",
            "response": {
                "{{if eq .Body.status \"paid\"}}true{{end}}": "paid",
                "default": "pending"
            }
        }),
    );
    let client = proxied_client(start_mock_server(dir.path().to_path_buf()).await);

    let paid = client
        .post("http://x/orders")
        .body(r#"{"status": "paid"}"#)
        .send()
        .await
        .unwrap();
    assert!(paid.headers().get("content-type").is_none());
    assert_eq!(paid.text().await.unwrap(), "paid");

    let garbage = client
        .post("http://x/orders")
        .body("<xml>not json</xml>")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), 200);
    assert_eq!(garbage.text().await.unwrap(), "pending");
}

#[tokio::test]
async fn test_explicit_content_type_and_header_predicate() {
    let dir = TempDir::new().unwrap();
    write_definition(
        dir.path(),
        "a.json",
        json!({
            "url": "http://x/page",
            "method": "GET",
            "content_type": "text/html",
            "response": {
                "{{eq .Header.X-Variant \"b\"}}": "<p>b</p>",
                "default": "<p>a</p>"
            }
        }),
    );
    let client = proxied_client(start_mock_server(dir.path().to_path_buf()).await);

    let response = client
        .get("http://x/page")
        .header("x-variant", "b")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers().get("content-type").unwrap(), "text/html");
    assert_eq!(response.text().await.unwrap(), "<p>b</p>");
}

#[tokio::test]
async fn test_definition_edits_apply_to_next_request() {
    let dir = TempDir::new().unwrap();
    let client = proxied_client(start_mock_server(dir.path().to_path_buf()).await);
    let definition = |body: &str| {
        json!({"url": "http://x/live", "method": "GET", "response": {"default": body}})
    };

    write_definition(dir.path(), "live.json", definition("one"));
    let first = client.get("http://x/live").send().await.unwrap();
    assert_eq!(first.text().await.unwrap(), "one");

    write_definition(dir.path(), "live.json", definition("two"));
    let second = client.get("http://x/live").send().await.unwrap();
    assert_eq!(second.text().await.unwrap(), "two");
}

#[tokio::test]
async fn test_failed_predicates_fall_through_to_proxy() {
    let dir = TempDir::new().unwrap();
    let origin = start_origin().await;
    write_definition(
        dir.path(),
        "a.json",
        json!({
            "url": format!("http://{origin}/guarded"),
            "method": "GET",
            "response": {"{{eq .Query.token \"secret\"}}": "let in"}
        }),
    );
    let client = proxied_client(start_mock_server(dir.path().to_path_buf()).await);

    let mocked = client
        .get(format!("http://{origin}/guarded?token=secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(mocked.text().await.unwrap(), "let in");

    let proxied = client
        .get(format!("http://{origin}/guarded?token=wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(proxied.status(), 201);
}
