use anyhow::Result;
use async_trait::async_trait;

use super::schema::Database;

/// Persisted key-value preference store.
///
/// The theme store reads through this trait so it can run against any
/// backing store.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Value for `key`, or `None` if it was never set.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace the value for `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl Database {
    /// Get a single preference value by key.
    pub async fn get_preference(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM user_preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a preference value (UPSERT), refreshing its timestamp.
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_preference(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_preference(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::PreferenceStore;
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_preference_missing() {
        let db = test_db().await;
        let value = db.get_preference("nonexistent.key").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_and_get_preference() {
        let db = test_db().await;
        db.set_preference("theme", "dark").await.unwrap();

        let value = db.get_preference("theme").await.unwrap();
        assert_eq!(value, Some("dark".to_string()));
    }

    #[tokio::test]
    async fn test_set_preference_upsert() {
        let db = test_db().await;
        db.set_preference("theme", "dark").await.unwrap();
        db.set_preference("theme", "light").await.unwrap();

        let value = db.get_preference("theme").await.unwrap();
        assert_eq!(value, Some("light".to_string()));
    }

    #[tokio::test]
    async fn test_trait_object_round_trip() {
        let db = test_db().await;
        let store: &dyn PreferenceStore = &db;
        store.set("ui.last_page", "my").await.unwrap();
        assert_eq!(
            store.get("ui.last_page").await.unwrap().as_deref(),
            Some("my")
        );
    }

    #[tokio::test]
    async fn test_clear_preferences() {
        let db = test_db().await;
        db.set_preference("theme", "dark").await.unwrap();
        db.set_preference("ui.last_page", "my").await.unwrap();

        let removed = db.clear_preferences().await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(db.get_preference("theme").await.unwrap(), None);
    }
}
