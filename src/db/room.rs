use crate::models::Room;
use sqlx::AnyPool;

pub struct RoomRepository {
    pool: AnyPool,
}

impl RoomRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            "SELECT id, title, created_at, updated_at FROM chat_rooms WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create(&self, room: &Room) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO chat_rooms (id, title, created_at, updated_at)
             VALUES ($1, $2, $3, $4)"
        )
        .bind(&room.id)
        .bind(&room.title)
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_newest_first(&self) -> Result<Vec<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            "SELECT id, title, created_at, updated_at FROM chat_rooms ORDER BY created_at DESC"
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Delete a room together with every message in it. Returns `false` when
    /// no room with that id existed.
    pub async fn delete_with_messages(&self, id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM messages WHERE room_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM chat_rooms WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_rooms")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
