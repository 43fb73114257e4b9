use crate::db::room::RoomRepository;
use crate::error::AppError;
use crate::models::{Room, RoomResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// `POST /chat/rooms`
pub async fn create_room(State(state): State<Arc<AppState>>) -> Result<Json<RoomResponse>, AppError> {
    let room_repo = RoomRepository::new(state.db_pool.clone());

    let room = Room::new();
    room_repo
        .create(&room)
        .await
        .map_err(AppError::database("Failed to create chat room"))?;

    tracing::info!("Created chat room {}", room.id);
    Ok(Json(room.into()))
}

/// `GET /chat/rooms`, newest first
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let room_repo = RoomRepository::new(state.db_pool.clone());

    let rooms = room_repo
        .list_newest_first()
        .await
        .map_err(AppError::database("Failed to fetch chat rooms"))?;

    Ok(Json(rooms.into_iter().map(RoomResponse::from).collect()))
}

/// `DELETE /chat/rooms/:room_id`, removing its messages too
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let room_repo = RoomRepository::new(state.db_pool.clone());

    let deleted = room_repo
        .delete_with_messages(&room_id)
        .await
        .map_err(AppError::database("Failed to delete chat room"))?;

    if !deleted {
        return Err(AppError::room_not_found());
    }

    tracing::info!("Deleted chat room {}", room_id);
    Ok(Json(json!({ "message": "Chat room deleted successfully" })))
}
