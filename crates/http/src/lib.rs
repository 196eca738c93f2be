//! HTTP server facade for the bookstore service with Axum, error handling, and OpenAPI support.

use anyhow::Context;
use axum::{extract::State, routing::get, Router};

use bookstore_db::Database;
use bookstore_kernel::{InitCtx, ModuleRegistry};

pub mod error;
pub mod router;

use error::AppError;
use router::RouterBuilder;

/// Serve the module routes until a shutdown signal arrives
pub async fn start_server(registry: &ModuleRegistry, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
    let server = &ctx.settings.server;
    let app = build_router(registry, ctx)?;

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", server.host, server.port))
        .await
        .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        server.host,
        server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, ctx: &InitCtx<'_>) -> anyhow::Result<Router> {
    let mut router_builder = RouterBuilder::new().mount_module(
        Router::new()
            .route("/healthz", get(health_check))
            .with_state(ctx.db.clone()),
    );

    for module in registry.modules() {
        tracing::info!(module = module.name(), "mounting module routes");
        router_builder = router_builder.mount_module(module.routes(ctx));
    }

    Ok(router_builder
        .with_openapi(registry)?
        .with_tracing()
        .with_cors()
        .with_request_id()
        .with_timeout(ctx.settings.server.request_timeout_ms)
        .build())
}

async fn health_check(State(db): State<Database>) -> Result<&'static str, AppError> {
    db.ping().await?;
    Ok("ok")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use bookstore_db::DbConfig;
    use bookstore_kernel::settings::{Environment, Settings};
    use tower::ServiceExt;

    #[tokio::test]
    async fn healthz_reports_store_reachable() {
        let settings = Settings::for_environment(Environment::Test);
        let db = Database::connect(&DbConfig::in_memory()).await.unwrap();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };

        let response = build_router(&ModuleRegistry::new(), &ctx)
            .unwrap()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        db.close().await;
        let response = build_router(&ModuleRegistry::new(), &ctx)
            .unwrap()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
