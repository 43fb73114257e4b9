//! Prepare the chat database: connect, run migrations, report what is stored.

use anyhow::{Context, Result};
use chat_relay::config::DEFAULT_DATABASE_URL;
use chat_relay::db::{self, message::MessageRepository, room::RoomRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "init_db=info,chat_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Only the database is needed here, so don't demand the full server config.
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let is_postgres = database_url.starts_with("postgres");

    tracing::info!("Initializing database ({})", if is_postgres { "PostgreSQL" } else { "SQLite" });

    let pool = match db::create_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            if is_postgres {
                tracing::error!(
                    "Could not connect to PostgreSQL. Is the server running? For example: \
                     docker run --name postgres-chatbot -e POSTGRES_PASSWORD=postgres \
                     -e POSTGRES_DB=chatbot -p 5432:5432 -d postgres:15-alpine"
                );
            }
            return Err(e).context("Failed to connect to database");
        }
    };

    db::run_migrations(&pool).await
        .context("Failed to run migrations")?;

    let rooms = RoomRepository::new(pool.clone()).count().await?;
    let messages = MessageRepository::new(pool.clone()).count().await?;
    tracing::info!("Database ready: {} rooms, {} messages", rooms, messages);

    pool.close().await;
    Ok(())
}
