use crate::chat::{self, conversation, PendingTurn, StreamEvent};
use crate::db::message::MessageRepository;
use crate::db::room::RoomRepository;
use crate::error::AppError;
use crate::models::MessageResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderName,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Frames buffered between the relay and a slow reader.
const EVENT_BUFFER: usize = 32;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// `GET /chat/rooms/:room_id/messages`, oldest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let room_repo = RoomRepository::new(state.db_pool.clone());
    let message_repo = MessageRepository::new(state.db_pool.clone());

    room_repo
        .get_by_id(&room_id)
        .await
        .map_err(AppError::database("Failed to fetch messages"))?
        .ok_or_else(AppError::room_not_found)?;

    let messages = message_repo
        .list_for_room(&room_id)
        .await
        .map_err(AppError::database("Failed to fetch messages"))?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// `POST /chat/rooms/:room_id/messages`
///
/// Stores the user's message right away, then answers with an event stream
/// relaying the assistant's reply. Problems after this point arrive as
/// `error` frames, since the status line has already been sent.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Response, AppError> {
    let message_repo = MessageRepository::new(state.db_pool.clone());
    let turn = message_repo
        .record_user_turn(&room_id, &request.content)
        .await
        .map_err(AppError::database("Failed to send message"))?
        .ok_or_else(AppError::room_not_found)?;

    tracing::info!(
        "Received message for room {} ({} earlier messages)",
        room_id,
        turn.history.len()
    );

    let pending = PendingTurn {
        room_id,
        conversation: conversation::assemble(&turn.history, &request.content),
    };

    let (tx, rx) = mpsc::channel::<StreamEvent>(EVENT_BUFFER);
    tokio::spawn(chat::run_turn(
        state.completion.clone(),
        message_repo,
        state.retry,
        pending,
        tx,
    ));

    let stream = ReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(to_sse_event(&event)));

    Ok((
        [(HeaderName::from_static("x-accel-buffering"), "no")],
        Sse::new(stream),
    )
        .into_response())
}

fn to_sse_event(event: &StreamEvent) -> Event {
    match Event::default().json_data(event) {
        Ok(sse_event) => sse_event,
        Err(e) => {
            tracing::error!("Failed to encode stream event: {}", e);
            Event::default().data(r#"{"type":"error","error":"internal encoding error"}"#)
        }
    }
}
