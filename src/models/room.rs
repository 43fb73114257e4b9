use super::{micros_to_datetime, now_micros};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Title given to a room until its first message arrives.
pub const DEFAULT_ROOM_TITLE: &str = "New chat";

/// Longest title prefix, in characters, taken from the first message.
pub const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, FromRow)]
pub struct Room {
    pub id: String,
    pub title: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Room {
    pub fn new() -> Self {
        let now = now_micros();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: DEFAULT_ROOM_TITLE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a room title from the first message sent to it: the first 50
/// characters, with `...` appended only when something was cut off.
pub fn title_from_first_message(content: &str) -> String {
    let mut chars = content.chars();
    let prefix: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{prefix}...")
    } else {
        prefix
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomResponse {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Room> for RoomResponse {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            title: room.title,
            created_at: micros_to_datetime(room.created_at),
            updated_at: micros_to_datetime(room.updated_at),
        }
    }
}
