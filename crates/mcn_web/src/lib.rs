use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/articles", get(handlers::list_articles).post(handlers::create_article))
        .route("/api/articles/:id", get(handlers::get_article))
        .route("/api/home", get(handlers::home))
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories/:name", get(handlers::category_articles))
        .route("/api/search", get(handlers::search))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/notification", get(handlers::notification))
        .route("/api/status", get(handlers::status))
        .route("/api/location", put(handlers::set_location))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, AppState};
    pub use mcn_core::{Article, Error, Result};
}
