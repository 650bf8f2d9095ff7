//! HTTP server and fallback proxy.
//!
//! # Module Structure
//!
//! - `server` - MockServer struct and accept loop
//! - `handler` - mock lookup, response selection and fallback
//! - `forwarding` - forwarding unmatched requests to the origin
//! - `client` - outbound HTTP client creation
//! - `headers` - hop-by-hop stripping and `X-Forwarded-For`
//! - `network` - listener setup
//! - `tls` - certificate verifier for `tls_skip_verify`

mod client;
mod context;
mod forwarding;
mod handler;
mod headers;
mod network;
mod response_ext;
mod server;
mod tls;

pub use client::{create_http_client, HttpClient};
pub use forwarding::{origin_uri, ProxyError};
pub use handler::{resolve, Resolution, NO_MOCK_BODY, PROXY_FAILED_BODY};
pub use server::MockServer;
