use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Router, serve};
use simple_broker_core::IntegrationSet;
use tokio::net::TcpListener;

use crate::http::{health, simple};

pub struct HostServer {
    addr: SocketAddr,
    router: Router,
}

impl HostServer {
    pub fn new(addr: SocketAddr, integrations: IntegrationSet) -> Self {
        let state = ServerState {
            integrations: Arc::new(integrations),
        };
        Self {
            addr,
            router: router(state),
        }
    }

    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        tracing::info!(addr = %self.addr, "starting simple index server");
        serve(listener, self.router).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub integrations: Arc<IntegrationSet>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health::handler))
        .route("/simple", get(simple::index))
        .route("/simple/", get(simple::index))
        .route("/simple/{package_name}", get(simple::package))
        .route("/simple/{package_name}/", get(simple::package))
        .route(
            "/simple/{package_name}/{package_version}",
            get(simple::download),
        )
        .with_state(state)
}
