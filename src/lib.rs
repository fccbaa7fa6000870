pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod proxy;
pub mod routes;
pub mod state;
pub mod store;
pub mod upstream;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::routing::get;
use axum::{Json, Router};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_redoc::{Redoc, Servable};

use crate::config::Config;
use crate::proxy::ProxyHandler;
use crate::state::{AppState, SharedState};
use crate::store::{InteractionStore, PgStore};
use crate::upstream::UpstreamClient;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Persistence Proxy API",
        description = "Forwards SQL submission analysis requests and records every interaction"
    ),
    tags(
        (name = "Analysis", description = "Proxied analysis calls"),
        (name = "Interactions", description = "Recorded request/response pairs"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// Routes plus the OpenAPI document describing them.
pub fn api_router() -> (Router<SharedState>, utoipa::openapi::OpenApi) {
    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(routes::api_routes())
        .split_for_parts()
}

pub fn build_app(pool: PgPool, config: Config) -> Result<Router, reqwest::Error> {
    let store: Arc<dyn InteractionStore> = Arc::new(PgStore::new(pool.clone()));
    let upstream = UpstreamClient::new(&config.upstream)?;
    let proxy = Arc::new(ProxyHandler::new(store, upstream));

    let state: SharedState = Arc::new(AppState { pool, proxy });

    let (router, api) = api_router();
    let doc = api.clone();

    let app = router
        .merge(Redoc::with_url("/redoc", api))
        .route(
            "/api-docs/openapi.json",
            get(move || {
                let doc = doc.clone();
                async move { Json(doc) }
            }),
        )
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(config.max_body_size)),
        )
        .with_state(state);

    Ok(app)
}

async fn health() -> &'static str {
    "ok"
}
