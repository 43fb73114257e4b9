pub mod message;
pub mod room;

pub use message::{Message, MessageResponse, Role};
pub use room::{Room, RoomResponse};

use chrono::{DateTime, Utc};

/// Current time as microseconds since the Unix epoch, the unit stored in every
/// `created_at`/`updated_at` column.
pub fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

pub(crate) fn micros_to_datetime(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}
