use super::{micros_to_datetime, now_micros};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown message role: {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A single turn in a room. Never updated after insert.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub room_id: String,
    pub role: Role,
    pub content: String,
    /// Serialized routing metadata; only assistant messages carry it.
    pub query_routing: Option<String>,
    pub created_at: i64,
}

impl Message {
    pub fn user(room_id: String, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            room_id,
            role: Role::User,
            content,
            query_routing: None,
            created_at: now_micros(),
        }
    }

    pub fn assistant(
        id: String,
        room_id: String,
        content: String,
        query_routing: Option<String>,
    ) -> Self {
        Self {
            id,
            room_id,
            role: Role::Assistant,
            content,
            query_routing,
            created_at: now_micros(),
        }
    }
}

impl<'r> FromRow<'r, AnyRow> for Message {
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(Self {
            id: row.try_get("id")?,
            room_id: row.try_get("room_id")?,
            role: role.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            content: row.try_get("content")?,
            query_routing: row.try_get("query_routing")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub room_id: String,
    pub role: Role,
    pub content: String,
    pub query_routing: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            room_id: message.room_id,
            role: message.role,
            content: message.content,
            query_routing: message.query_routing,
            created_at: micros_to_datetime(message.created_at),
        }
    }
}
