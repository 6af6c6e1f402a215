//! Router builder for the bookshelf HTTP server

use std::any::Any;
use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use bookshelf_kernel::ModuleRegistry;

use crate::error::{fill_timeout_body, method_not_allowed, route_not_found, ErrorBody};
use crate::MakeRequestUuid;

/// Builder for constructing the main HTTP router.
///
/// Layers wrap only the routes that exist when they are added, so mount
/// routes first and add middleware last.
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

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Merge a module's router; modules own their full paths
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        tracing::info!(module = module_name, "mounting module routes");
        self.router = self.router.merge(module_router);
        self
    }

    /// Answer unmatched paths with the standard fail body
    pub fn with_not_found_fallback(mut self) -> Self {
        self.router = self.router.fallback(route_not_found);
        self
    }

    /// Answer known paths hit with the wrong method with the standard fail body
    pub fn with_method_not_allowed_fallback(mut self) -> Self {
        self.router = self.router.method_not_allowed_fallback(method_not_allowed);
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
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
        );
        self
    }

    /// Add request ID middleware; the id is echoed back on the response
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        self
    }

    /// Add timeout middleware; expired requests get a fail-shaped 408
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self
            .router
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_millis(timeout_ms),
            ))
            .layer(map_response(fill_timeout_body));
        self
    }

    /// Turn handler panics into a 500 instead of dropping the connection
    pub fn with_panic_recovery(mut self) -> Self {
        self.router = self.router.layer(CatchPanicLayer::custom(panic_response));
        self
    }

    /// Serve `/docs/openapi.json`, merged from every module's fragment
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let document = merged_openapi(registry);
        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || async move { Json(document.clone()) }),
        );
        self
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

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::fail("An internal server error occurred")),
    )
        .into_response()
}

/// Merge the base document with every module's `paths` and `schemas`
pub fn merged_openapi(registry: &ModuleRegistry) -> serde_json::Value {
    let mut openapi_spec = serde_json::json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Bookshelf API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "In-memory bookshelf service"
        },
        "paths": {},
        "components": {
            "schemas": {}
        }
    });

    openapi_spec["components"]["schemas"]["ErrorResponse"] = serde_json::json!({
        "type": "object",
        "properties": {
            "status": { "type": "string", "enum": ["fail"] },
            "message": { "type": "string" }
        },
        "required": ["status", "message"]
    });

    openapi_spec["paths"]["/healthz"] = serde_json::json!({
        "get": {
            "summary": "Health check",
            "responses": {
                "200": {
                    "description": "OK",
                    "content": {
                        "text/plain": {
                            "schema": { "type": "string" }
                        }
                    }
                }
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

    // Round-trip through utoipa's model so malformed fragments surface at startup.
    match serde_json::from_value::<utoipa::openapi::OpenApi>(openapi_spec.clone()) {
        Ok(document) => match serde_json::to_value(&document) {
            Ok(normalized) => normalized,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize OpenAPI document");
                openapi_spec
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "merged OpenAPI document does not parse; serving raw");
            openapi_spec
        }
    }
}
