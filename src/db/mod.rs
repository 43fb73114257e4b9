pub mod message;
pub mod room;

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::time::Duration;

/// Connect to the store behind `database_url`. PostgreSQL and SQLite URLs are
/// both accepted; an in-memory SQLite database lives on a single connection
/// that is never recycled, otherwise it would vanish between queries.
pub async fn create_pool(database_url: &str) -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();

    let options = if is_in_memory(database_url) {
        AnyPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        AnyPoolOptions::new().max_connections(5)
    };

    options
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &AnyPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
}

fn is_in_memory(database_url: &str) -> bool {
    (database_url.starts_with("sqlite") && database_url.contains(":memory:"))
        || database_url.contains("mode=memory")
}

#[cfg(test)]
pub(crate) async fn test_pool() -> AnyPool {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
