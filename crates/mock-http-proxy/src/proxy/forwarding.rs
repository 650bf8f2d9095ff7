//! Forwarding unmatched requests to their original destination.

use super::client::HttpClient;
use super::headers::{append_forwarded_for, strip_hop_by_hop};
use crate::matcher::target_host;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{HeaderValue, HOST};
use hyper::http::request::Parts;
use hyper::{Request, Response, Uri};
use std::convert::Infallible;
use std::net::IpAddr;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("request has no target host")]
    MissingHost,
    #[error("invalid proxy target {target}: {message}")]
    Target { target: String, message: String },
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

impl ProxyError {
    fn target(uri: &Uri, message: impl ToString) -> Self {
        ProxyError::Target {
            target: uri.to_string(),
            message: message.to_string(),
        }
    }
}

/// The URI to request from the origin: the inbound scheme and host with the
/// original path and query.
pub fn origin_uri(uri: &Uri) -> Result<Uri, ProxyError> {
    let host = target_host(uri);
    if host.is_empty() {
        return Err(ProxyError::MissingHost);
    }
    let scheme = uri
        .scheme()
        .cloned()
        .ok_or_else(|| ProxyError::target(uri, "missing scheme"))?;
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    Uri::builder()
        .scheme(scheme)
        .authority(host.as_str())
        .path_and_query(path_and_query)
        .build()
        .map_err(|err| ProxyError::target(uri, err))
}

/// Build the outbound request from the inbound parts and the original body bytes.
pub fn build_upstream_request(
    parts: &Parts,
    body: Bytes,
    client_ip: IpAddr,
) -> Result<Request<BoxBody<Bytes, hyper::Error>>, ProxyError> {
    let uri = origin_uri(&parts.uri)?;
    let host = HeaderValue::from_str(&target_host(&parts.uri))
        .map_err(|err| ProxyError::target(&parts.uri, err))?;

    let mut headers = parts.headers.clone();
    strip_hop_by_hop(&mut headers);
    append_forwarded_for(&mut headers, client_ip);
    headers.insert(HOST, host);

    let mut request = Request::new(
        Full::new(body)
            .map_err(|never: Infallible| match never {})
            .boxed(),
    );
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;
    Ok(request)
}

/// Send `request` upstream and stream the origin's response back.
pub async fn forward_request(
    http_client: &HttpClient,
    request: Request<BoxBody<Bytes, hyper::Error>>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, ProxyError> {
    debug!("Forwarding {} {}", request.method(), request.uri());

    let upstream_response = http_client.request(request).await?;
    let (mut parts, body) = upstream_response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Ok(Response::from_parts(parts, BoxBody::new(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Method;

    fn parts(method: Method, uri: &str) -> Parts {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("accept", "text/plain")
            .header("connection", "keep-alive")
            .header("host", "stale.example")
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[test]
    fn test_origin_uri() {
        let uri: Uri = "http://origin.example:8080/path?x=1".parse().unwrap();
        assert_eq!(
            origin_uri(&uri).unwrap().to_string(),
            "http://origin.example:8080/path?x=1"
        );

        let uri: Uri = "https://user@origin.example/".parse().unwrap();
        assert_eq!(origin_uri(&uri).unwrap().to_string(), "https://origin.example/");
    }

    #[test]
    fn test_origin_uri_requires_host() {
        let uri: Uri = "/path".parse().unwrap();
        assert!(matches!(origin_uri(&uri), Err(ProxyError::MissingHost)));
    }

    #[tokio::test]
    async fn test_build_upstream_request() {
        let parts = parts(Method::POST, "http://origin.example/submit?id=1");
        let request =
            build_upstream_request(&parts, Bytes::from("not json"), "127.0.0.1".parse().unwrap())
                .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri().to_string(), "http://origin.example/submit?id=1");
        assert_eq!(request.headers().get(HOST).unwrap(), "origin.example");
        assert_eq!(request.headers().get("accept").unwrap(), "text/plain");
        assert_eq!(request.headers().get("x-forwarded-for").unwrap(), "127.0.0.1");
        assert!(request.headers().get("connection").is_none());

        let body = request.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from("not json"));
    }
}
