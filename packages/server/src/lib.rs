pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod repository;
pub mod routes;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pixboard API",
        version = "1.0.0",
        description = "Image sharing board with OAuth login, comments and image classification"
    ),
    paths(
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::gallery::index,
        handlers::gallery::image_detail,
        handlers::gallery::post_comment,
        handlers::gallery::delete_image,
        handlers::upload::upload_form,
        handlers::upload::upload_image,
        handlers::upload::serve_upload,
        handlers::classify::classify_image,
    ),
    tags(
        (name = "Auth", description = "OAuth login and sessions"),
        (name = "Gallery", description = "Browsing, commenting and deleting images"),
        (name = "Upload", description = "Uploading and serving image files"),
    ),
)]
struct ApiDoc;

fn cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    if cors.allow_origins.is_empty() {
        return None;
    }
    let origins: Vec<HeaderValue> = cors
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(cors.max_age)),
    )
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let mut router = routes::routes(&state.config)
        .with_state(state.clone())
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route(
            "/api-docs/openapi.json",
            axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    if let Some(cors) = cors_layer(&state.config.server.cors) {
        router = router.layer(cors);
    }

    router
}
