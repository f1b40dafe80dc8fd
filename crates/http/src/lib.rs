//! HTTP server facade for the course library: Axum server bootstrap,
//! middleware stack, problem-document errors, and OpenAPI support.

use anyhow::Context;
use axum::{routing::get, Router};

use courselib_kernel::ModuleRegistry;

pub mod error;
pub mod extract;
pub mod response;
pub mod router;

use router::RouterBuilder;

/// Start the HTTP server with the given module registry
pub async fn start_server(
    registry: &ModuleRegistry,
    settings: &courselib_kernel::settings::Settings,
) -> anyhow::Result<()> {
    tracing::info!(
        "starting HTTP server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    let app = build_router(registry, settings)
        .await
        .context("failed to build HTTP router")?;

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", settings.server.host, settings.server.port))
            .await
            .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Build the main HTTP router with all module routes mounted. Public so the
/// binary and integration tests share one composition path.
pub async fn build_router(
    registry: &ModuleRegistry,
    settings: &courselib_kernel::settings::Settings,
) -> anyhow::Result<Router> {
    let mut router_builder = RouterBuilder::new();

    // Add health check route
    router_builder = router_builder.route("/healthz", get(health_check));

    // Mount module routes
    for module in registry.modules() {
        router_builder = router_builder.mount_module(module.name(), module.routes());
    }

    // Add OpenAPI documentation
    router_builder = router_builder.with_openapi(registry);

    // Add global middlewares. Layers wrap the routes registered above, so
    // they go on last.
    router_builder = router_builder
        .with_tracing()
        .with_cors()
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms);

    Ok(router_builder.build())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
