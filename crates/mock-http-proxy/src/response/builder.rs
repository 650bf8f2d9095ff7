use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::http::HeaderValue;
use hyper::{HeaderMap, Response, StatusCode};
use std::convert::Infallible;

/// Content type used for diagnostic bodies.
pub static TEXT_PLAIN: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");

pub struct ResponseBuilder {
    status: StatusCode,
    body: Bytes,
    headers: HeaderMap,
}

impl ResponseBuilder {
    pub fn new(status_code: StatusCode) -> Self {
        ResponseBuilder {
            status: status_code,
            body: Bytes::new(),
            headers: Default::default(),
        }
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn content_type(mut self, value: HeaderValue) -> Self {
        self.headers.insert(CONTENT_TYPE, value);
        self
    }

    pub fn build_full(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        response.headers_mut().extend(self.headers);
        response
    }

    pub fn build_boxed(self) -> Response<BoxBody<Bytes, hyper::Error>> {
        self.build_full()
            .map(|body| body.map_err(|never: Infallible| match never {}).boxed())
    }
}

/// A `text/plain` response carrying a short diagnostic message.
pub fn plain_text(status: StatusCode, message: &str) -> Response<BoxBody<Bytes, hyper::Error>> {
    ResponseBuilder::new(status)
        .content_type(TEXT_PLAIN.clone())
        .body(message.to_string())
        .build_boxed()
}
