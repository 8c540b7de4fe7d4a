//! Flat string key-value store, the per-user analogue of browser local storage

use sqlx::sqlite::SqlitePool;

/// Get the raw value stored under a key
pub async fn get_item(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT value FROM local_storage WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
}

/// Store a value, replacing whatever was under the key
pub async fn set_item(pool: &SqlitePool, key: &str, value: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO local_storage (key, value) VALUES (?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn remove_item(pool: &SqlitePool, key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM local_storage WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;

    Ok(())
}

/// All keys currently stored
pub async fn keys(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT key FROM local_storage ORDER BY key")
        .fetch_all(pool)
        .await
}
