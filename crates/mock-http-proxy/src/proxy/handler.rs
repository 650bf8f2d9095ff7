//! Request handling: mock lookup, response selection and proxy fallback.

use super::context::RequestHandlerContext;
use super::forwarding::{build_upstream_request, forward_request};
use super::response_ext::ResponseExt;
use crate::context::RequestContext;
use crate::definition::{DefinitionStore, MockDefinition, ResponseValue};
use crate::matcher::{find_match, target_host};
use crate::predicate::select_response;
use crate::response::{emit, plain_text};

use http_body_util::combinators::BoxBody;
use http_body_util::BodyExt;
use hyper::body::{Bytes, Incoming};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, StatusCode, Uri};
use std::convert::Infallible;
use tracing::{debug, error};

pub const NO_MOCK_BODY: &str = "No mock definitions matching";
pub const PROXY_FAILED_BODY: &str = "Failed to proxy request";
pub const ENCODE_FAILED_BODY: &str = "Failed to encode mock response";
pub const READ_FAILED_BODY: &str = "Failed to read request body";

/// Outcome of looking a request up in the definitions directory.
#[derive(Debug)]
pub enum Resolution {
    Mock(MockDefinition, ResponseValue),
    Fallthrough,
}

/// Handle one inbound request.
pub async fn handle_request(
    ctx: &RequestHandlerContext<'_>,
    req: Request<Incoming>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Infallible> {
    let (parts, body) = req.into_parts();
    debug!("Received request: {} {}", parts.method, parts.uri);

    let body_bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!("Failed to read request body from {}: {}", ctx.remote_addr, e);
            return Ok(plain_text(StatusCode::BAD_REQUEST, READ_FAILED_BODY));
        }
    };

    let request_context = RequestContext::from_parts(&parts.uri, &parts.headers, &body_bytes);

    let store = ctx.store.clone();
    let method = parts.method.clone();
    let uri = parts.uri.clone();
    let resolution = match tokio::task::spawn_blocking(move || {
        resolve(&store, &method, &uri, &request_context)
    })
    .await
    {
        Ok(resolution) => resolution,
        Err(e) => {
            error!("Definition lookup task failed: {}", e);
            Resolution::Fallthrough
        }
    };

    match resolution {
        Resolution::Mock(definition, value) => Ok(respond_with_mock(&definition, &value)),
        Resolution::Fallthrough => Ok(proxy_fallback(ctx, &parts, body_bytes).await),
    }
}

/// Find the first structurally matching definition and select its response.
///
/// When the matching definition has no satisfied predicate and no default,
/// the request falls through; later definitions are not consulted.
pub fn resolve(
    store: &DefinitionStore,
    method: &Method,
    uri: &Uri,
    request_context: &RequestContext,
) -> Resolution {
    let Some(definition) = find_match(store.definitions(), method, uri) else {
        debug!("No definition matches {} {}", method, uri);
        return Resolution::Fallthrough;
    };

    match select_response(&definition.response, request_context) {
        Ok(value) => {
            let value = value.clone();
            debug!("Mock {} {} matched", definition.method, definition.url);
            Resolution::Mock(definition, value)
        }
        Err(e) => {
            debug!("{} {}: {}", definition.method, definition.url, e);
            Resolution::Fallthrough
        }
    }
}

fn respond_with_mock(
    definition: &MockDefinition,
    value: &ResponseValue,
) -> Response<BoxBody<Bytes, hyper::Error>> {
    match emit(value, definition) {
        Ok(response) => response.into_boxed(),
        Err(e) => {
            error!(
                "Failed to emit mock response for {} {}: {}",
                definition.method, definition.url, e
            );
            plain_text(StatusCode::INTERNAL_SERVER_ERROR, ENCODE_FAILED_BODY)
        }
    }
}

async fn proxy_fallback(
    ctx: &RequestHandlerContext<'_>,
    parts: &Parts,
    body: Bytes,
) -> Response<BoxBody<Bytes, hyper::Error>> {
    if target_host(&parts.uri).is_empty() {
        return plain_text(StatusCode::OK, NO_MOCK_BODY);
    }

    let upstream_request = match build_upstream_request(parts, body, ctx.remote_addr.ip()) {
        Ok(request) => request,
        Err(e) => {
            debug!("Cannot proxy {} {}: {}", parts.method, parts.uri, e);
            return plain_text(StatusCode::OK, PROXY_FAILED_BODY);
        }
    };

    debug!("Proxying {} {}", parts.method, parts.uri);
    match forward_request(ctx.http_client, upstream_request).await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to proxy {} {}: {}", parts.method, parts.uri, e);
            plain_text(StatusCode::BAD_GATEWAY, PROXY_FAILED_BODY)
        }
    }
}
