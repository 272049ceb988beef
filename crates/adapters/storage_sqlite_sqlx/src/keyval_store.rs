//! `SQLite` implementation of [`KeyValStore`].

use std::future::Future;

use sqlx::SqlitePool;

use hearth_app::ports::KeyValStore;
use hearth_domain::error::HearthError;

use crate::error::StorageError;

const SELECT: &str = "SELECT value FROM keyval WHERE key = ?";

const UPSERT: &str = r"
    INSERT INTO keyval (key, value)
    VALUES (?, ?)
    ON CONFLICT (key) DO UPDATE SET value = excluded.value
";

/// Keyval store backed by a `SQLite` connection pool.
#[derive(Clone)]
pub struct SqliteKeyValStore {
    pool: SqlitePool,
}

impl SqliteKeyValStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl KeyValStore for SqliteKeyValStore {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, HearthError>> + Send {
        async move {
            let row: Option<(String,)> = sqlx::query_as(SELECT)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::from)?;
            Ok(row.map(|(value,)| value))
        }
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), HearthError>> + Send {
        async move {
            sqlx::query(UPSERT)
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;

    async fn store() -> SqliteKeyValStore {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .expect("in-memory database should initialise");
        SqliteKeyValStore::new(db.pool().clone())
    }

    #[tokio::test]
    async fn should_return_none_for_missing_key() {
        let store = store().await;
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_roundtrip_a_value() {
        let store = store().await;
        store.set("room.lights.ceiling", "1").await.unwrap();
        assert_eq!(
            store.get("room.lights.ceiling").await.unwrap().as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn should_upsert_on_repeated_set() {
        let store = store().await;
        store.set("k", "1").await.unwrap();
        store.set("k", "0").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("0"));
    }
}
