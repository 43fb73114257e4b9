pub mod chat;
pub mod completion;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;

use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use crate::completion::CompletionClient;
use crate::config::RetryPolicy;
use sqlx::AnyPool;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared, explicitly constructed services handed to every request.
pub struct AppState {
    pub db_pool: AnyPool,
    pub completion: Arc<dyn CompletionClient>,
    pub retry: RetryPolicy,
}

pub fn router(state: Arc<AppState>, cors_origins: Vec<HeaderValue>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(cors_origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/chat/rooms", post(handlers::create_room).get(handlers::list_rooms))
        .route("/chat/rooms/:room_id", delete(handlers::delete_room))
        .route(
            "/chat/rooms/:room_id/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
