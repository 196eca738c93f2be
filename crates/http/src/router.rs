//! Router builder for the bookstore HTTP server

use anyhow::Context;
use axum::{extract::Request, http::HeaderValue, routing::get, Router};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use uuid::{Timestamp, Uuid};

use bookstore_kernel::ModuleRegistry;

/// Builder for constructing the main HTTP router
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Merge a module's router; modules declare their full paths
    pub fn mount_module(mut self, module_router: Router) -> Self {
        self.router = self.router.merge(module_router);
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add CORS middleware
    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
        self
    }

    /// Add request ID middleware; the id is echoed back on the response
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));
        self
    }

    /// Add timeout middleware
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self
            .router
            .layer(TimeoutLayer::new(Duration::from_millis(timeout_ms)));
        self
    }

    /// Add OpenAPI documentation by collecting specs from all modules.
    /// Fails if the merged document is not a valid OpenAPI 3.1 document.
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> anyhow::Result<Self> {
        let mut openapi_spec = serde_json::json!({
            "openapi": "3.1.0",
            "info": {
                "title": "Bookstore API",
                "version": "1.0.0",
                "description": "Book catalog CRUD API"
            },
            "paths": {},
            "components": {
                "schemas": {}
            }
        });

        openapi_spec["components"]["schemas"]["ErrorResponse"] = serde_json::json!({
            "type": "object",
            "properties": {
                "error": {
                    "type": "object",
                    "properties": {
                        "code": { "type": "string" },
                        "message": { "type": "string" },
                        "status": { "type": "integer" },
                        "details": { "type": "array", "items": { "type": "object" } },
                        "trace_id": { "type": "string" },
                        "timestamp": { "type": "string" }
                    },
                    "required": ["code", "message", "status", "trace_id", "timestamp"]
                }
            },
            "required": ["error"]
        });

        openapi_spec["paths"]["/healthz"] = serde_json::json!({
            "get": {
                "summary": "Health check",
                "responses": {
                    "200": {
                        "description": "OK",
                        "content": {
                            "text/plain": { "schema": { "type": "string" } }
                        }
                    },
                    "500": { "description": "Store unreachable" }
                }
            }
        });

        for module in registry.modules() {
            let Some(module_spec) = module.openapi() else {
                continue;
            };

            if let Some(paths) = module_spec.get("paths").and_then(|p| p.as_object()) {
                for (path, path_item) in paths {
                    openapi_spec["paths"][path] = path_item.clone();
                }
            }

            if let Some(schemas) = module_spec
                .get("components")
                .and_then(|c| c.get("schemas"))
                .and_then(|s| s.as_object())
            {
                for (schema_name, schema_def) in schemas {
                    openapi_spec["components"]["schemas"][schema_name] = schema_def.clone();
                }
            }
        }

        // Swagger UI serves the typed document, so every module fragment must parse.
        let openapi_obj: utoipa::openapi::OpenApi = serde_json::from_value(openapi_spec.clone())
            .context("merged OpenAPI document is invalid")?;

        self.router = self.router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi_obj),
        );

        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || async move { axum::Json(openapi_spec.clone()) }),
        );

        Ok(self)
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Time-ordered request ids so log lines sort by arrival
#[derive(Clone)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let timestamp = Timestamp::now(uuid::NoContext);
        let request_id = Uuid::new_v7(timestamp)
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use bookstore_kernel::Module;
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_mounted_module_is_reachable() {
        let module_router = Router::new().route("/books", get(|| async { "module" }));

        let response = RouterBuilder::new()
            .mount_module(module_router)
            .build()
            .oneshot(Request::get("/books").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_chain_sets_request_id() {
        let response = RouterBuilder::new()
            .mount_module(Router::new().route("/health", get(|| async { "ok" })))
            .with_tracing()
            .with_cors()
            .with_request_id()
            .with_timeout(5000)
            .build()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let request_id = response.headers().get("x-request-id").unwrap();
        assert!(Uuid::parse_str(request_id.to_str().unwrap()).is_ok());
    }

    struct FragmentModule(serde_json::Value);

    impl Module for FragmentModule {
        fn name(&self) -> &'static str {
            "fragment"
        }

        fn openapi(&self) -> Option<serde_json::Value> {
            Some(self.0.clone())
        }
    }

    fn registry_with_fragment(fragment: serde_json::Value) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(FragmentModule(fragment)));
        registry
    }

    async fn get_json(router: Router, uri: &str) -> serde_json::Value {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_swagger_document_carries_module_paths() {
        let registry = registry_with_fragment(json!({
            "paths": {
                "/widgets": {
                    "get": {
                        "summary": "List widgets",
                        "responses": {
                            "200": { "description": "Widgets" },
                            "500": {
                                "description": "Error",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }));
        let router = RouterBuilder::new().with_openapi(&registry).unwrap().build();

        let typed = get_json(router.clone(), "/api-docs/openapi.json").await;
        assert_eq!(typed["openapi"], "3.1.0");
        assert!(typed["paths"]["/widgets"]["get"].is_object());
        assert!(typed["paths"]["/healthz"]["get"].is_object());
        assert!(typed["components"]["schemas"]["ErrorResponse"].is_object());

        let raw = get_json(router, "/docs/openapi.json").await;
        assert!(raw["paths"]["/widgets"].is_object());
    }

    #[test]
    fn test_malformed_fragment_is_rejected() {
        let registry = registry_with_fragment(json!({
            "paths": {
                "/widgets": { "get": { "responses": { "200": { "content": 5 } } } }
            }
        }));

        assert!(RouterBuilder::new().with_openapi(&registry).is_err());
    }
}
