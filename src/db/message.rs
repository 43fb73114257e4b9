use crate::models::room::title_from_first_message;
use crate::models::{now_micros, Message, Room};
use sqlx::{Any, AnyPool, Executor};

const SELECT_MESSAGES_FOR_ROOM: &str =
    "SELECT id, room_id, role, content, query_routing, created_at
     FROM messages WHERE room_id = $1 ORDER BY created_at ASC";

/// Result of persisting a user's turn: the room as it stands afterwards, the
/// stored message, and the history that preceded it.
#[derive(Debug)]
pub struct UserTurn {
    pub room: Room,
    pub message: Message,
    pub history: Vec<Message>,
}

pub struct MessageRepository {
    pool: AnyPool,
}

impl MessageRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_room(&self, room_id: &str) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(SELECT_MESSAGES_FOR_ROOM)
            .bind(room_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn create(&self, message: &Message) -> Result<(), sqlx::Error> {
        insert_message(&self.pool, message).await
    }

    /// Store a user's message and, if it is the first one in the room, derive
    /// the room title from it. Everything happens in one transaction.
    /// Returns `None` if the room does not exist.
    pub async fn record_user_turn(
        &self,
        room_id: &str,
        content: &str,
    ) -> Result<Option<UserTurn>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let room = sqlx::query_as::<_, Room>(
            "SELECT id, title, created_at, updated_at FROM chat_rooms WHERE id = $1"
        )
        .bind(room_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut room) = room else {
            return Ok(None);
        };

        let history = sqlx::query_as::<_, Message>(SELECT_MESSAGES_FOR_ROOM)
            .bind(room_id)
            .fetch_all(&mut *tx)
            .await?;

        let message = Message::user(room_id.to_string(), content.to_string());
        insert_message(&mut *tx, &message).await?;

        if history.is_empty() {
            room.title = title_from_first_message(content);
            room.updated_at = now_micros();
            sqlx::query("UPDATE chat_rooms SET title = $1, updated_at = $2 WHERE id = $3")
                .bind(&room.title)
                .bind(room.updated_at)
                .bind(room_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(UserTurn { room, message, history }))
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

async fn insert_message<'e, E>(executor: E, message: &Message) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Any>,
{
    sqlx::query(
        "INSERT INTO messages (id, room_id, role, content, query_routing, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)"
    )
    .bind(&message.id)
    .bind(&message.room_id)
    .bind(message.role.as_str())
    .bind(&message.content)
    .bind(&message.query_routing)
    .bind(message.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::room::RoomRepository;
    use crate::db::test_pool;
    use crate::models::Role;

    async fn setup() -> (RoomRepository, MessageRepository, Room) {
        let pool = test_pool().await;
        let rooms = RoomRepository::new(pool.clone());
        let room = Room::new();
        rooms.create(&room).await.unwrap();
        (rooms, MessageRepository::new(pool), room)
    }

    #[tokio::test]
    async fn test_first_turn_sets_title() {
        let (rooms, messages, room) = setup().await;

        let turn = messages.record_user_turn(&room.id, "Hello").await.unwrap().unwrap();
        assert!(turn.history.is_empty());
        assert_eq!(turn.room.title, "Hello");
        assert_eq!(turn.message.role, Role::User);

        let stored = rooms.get_by_id(&room.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Hello");
    }

    #[tokio::test]
    async fn test_later_turns_keep_title_and_return_history() {
        let (rooms, messages, room) = setup().await;

        messages.record_user_turn(&room.id, "Hello").await.unwrap().unwrap();
        let long = "A".repeat(80);
        let turn = messages.record_user_turn(&room.id, &long).await.unwrap().unwrap();

        assert_eq!(turn.history.len(), 1);
        assert_eq!(turn.history[0].content, "Hello");
        assert_eq!(rooms.get_by_id(&room.id).await.unwrap().unwrap().title, "Hello");
    }

    #[tokio::test]
    async fn test_missing_room_stores_nothing() {
        let (_rooms, messages, _room) = setup().await;

        let turn = messages.record_user_turn("missing", "Hello").await.unwrap();
        assert!(turn.is_none());
        assert_eq!(messages.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_orders_oldest_first_and_keeps_routing() {
        let (_rooms, messages, room) = setup().await;

        let mut first = Message::user(room.id.clone(), "question".into());
        first.created_at -= 10;
        let second = Message::assistant(
            "reply-1".into(),
            room.id.clone(),
            "answer".into(),
            Some(r#"{"selected_model":"m"}"#.into()),
        );
        messages.create(&second).await.unwrap();
        messages.create(&first).await.unwrap();

        let listed = messages.list_for_room(&room.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content, "question");
        assert_eq!(listed[1].id, "reply-1");
        assert_eq!(listed[1].role, Role::Assistant);
        assert_eq!(listed[1].query_routing.as_deref(), Some(r#"{"selected_model":"m"}"#));
    }
}
