mod messages;
mod rooms;

pub use messages::{list_messages, send_message};
pub use rooms::{create_room, delete_room, list_rooms};

use axum::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Chat relay API", "status": "running" }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy", "timestamp": chrono::Utc::now() }))
}
