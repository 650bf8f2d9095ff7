//! MockServer struct and main run loop.

use super::client::{create_http_client, HttpClient};
use super::context::RequestHandlerContext;
use super::handler::handle_request;
use super::network::create_listener;
use crate::config::Config;
use crate::definition::DefinitionStore;
use anyhow::Context;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// State shared by every connection.
struct ServerState {
    store: DefinitionStore,
    http_client: HttpClient,
}

/// The mock server: answers from the definitions directory or proxies.
pub struct MockServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: Arc<ServerState>,
}

impl MockServer {
    /// Bind the listening socket and build the outbound client.
    pub async fn bind(config: &Config) -> Result<Self, anyhow::Error> {
        config.validate()?;
        let addr = config.socket_addr()?;
        let listener =
            create_listener(addr).with_context(|| format!("Failed to bind to {addr}"))?;
        let local_addr = listener.local_addr()?;

        let http_client = create_http_client(&config.connection_pool, config.tls_skip_verify)?;

        Ok(Self {
            listener,
            local_addr,
            state: Arc::new(ServerState {
                store: DefinitionStore::new(&config.definitions),
                http_client,
            }),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until the task is dropped, serving each on its own task.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        info!("Listening on http://{}", self.local_addr);
        info!(
            "Serving mock definitions from {}",
            self.state.store.dir().display()
        );

        loop {
            let (stream, remote_addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    error!("Failed to accept connection: {}", err);
                    continue;
                }
            };
            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { state.handle(req, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}

impl ServerState {
    async fn handle(
        &self,
        req: Request<Incoming>,
        remote_addr: SocketAddr,
    ) -> Result<Response<BoxBody<Bytes, hyper::Error>>, Infallible> {
        let ctx = RequestHandlerContext {
            http_client: &self.http_client,
            store: &self.store,
            remote_addr,
        };
        handle_request(&ctx, req).await
    }
}
