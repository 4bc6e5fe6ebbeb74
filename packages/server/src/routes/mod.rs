use axum::{
    Router,
    routing::{get, post},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(gallery_routes())
        .merge(upload_routes(config.storage.max_upload_size))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(handlers::auth::login))
        .route("/logout", get(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
}

fn gallery_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::gallery::index))
        .route(
            "/image/{id}",
            get(handlers::gallery::image_detail).post(handlers::gallery::post_comment),
        )
        .route(
            "/image/{id}/classify",
            get(handlers::classify::classify_image),
        )
        .route("/delete/{id}", post(handlers::gallery::delete_image))
}

fn upload_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            get(handlers::upload::upload_form)
                .post(handlers::upload::upload_image)
                .layer(handlers::upload::upload_body_limit(max_upload_size)),
        )
        .route("/uploads/{filename}", get(handlers::upload::serve_upload))
}
