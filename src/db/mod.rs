use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub mod local_storage;
pub mod preferences;

const CREATE_TABLES: &str = r#"
    CREATE TABLE IF NOT EXISTS local_storage (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )
"#;

/// Open the SQLite store backing the cache and preferences, creating tables
pub async fn init_db(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create all database tables
async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(CREATE_TABLES).execute(pool).await?;
    Ok(())
}

/// Single-connection in-memory store; every connection to `:memory:` is a fresh database
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    create_tables(&pool).await.expect("create tables");
    pool
}
