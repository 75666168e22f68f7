// rest/mod.rs — Public REST API server.
//
// Axum HTTP server bridging the resource-provider NUMA topology operations.
//
// Endpoints:
//   GET    /resource_providers/{uuid}/numa_topologies
//   PUT    /resource_providers/{uuid}/numa_topologies
//   DELETE /resource_providers/{uuid}/numa_topologies
//   GET    /health

pub mod routes;

use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/health", get(routes::health::health))
        // Resource-provider NUMA topologies
        .route(
            "/resource_providers/{uuid}/numa_topologies",
            get(routes::numa_topologies::show)
                .put(routes::numa_topologies::update)
                .delete(routes::numa_topologies::destroy),
        )
        .with_state(ctx)
}
