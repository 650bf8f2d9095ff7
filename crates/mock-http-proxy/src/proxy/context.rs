use crate::definition::DefinitionStore;
use crate::proxy::client::HttpClient;
use std::net::SocketAddr;

/// Per-connection state handed to the request handler.
pub struct RequestHandlerContext<'a> {
    pub http_client: &'a HttpClient,
    pub store: &'a DefinitionStore,
    pub remote_addr: SocketAddr,
}
