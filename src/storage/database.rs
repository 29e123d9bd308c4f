use crate::models::ListingRecord;
use anyhow::{Context, Result};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CREATE_LISTINGS: &str = r#"
CREATE TABLE IF NOT EXISTS listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT,
    url TEXT,
    title TEXT,
    price TEXT,
    details TEXT,
    scraped_date TEXT
)
"#;

const INSERT_LISTING: &str = r#"
INSERT INTO listings (source, url, title, price, details, scraped_date)
VALUES (?, ?, ?, ?, ?, ?)
"#;

/// Append-only SQLite store for scraped listings.
///
/// Every operation opens its own connection and closes it when done.
#[derive(Debug, Clone)]
pub struct ListingStore {
    path: PathBuf,
}

impl ListingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);

        SqliteConnection::connect_with(&options)
            .await
            .with_context(|| format!("Failed to open database {}", self.path.display()))
    }

    /// Create the database file and the `listings` table if they are missing.
    pub async fn init_schema(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut conn = self.connect().await?;
        sqlx::query(CREATE_LISTINGS)
            .execute(&mut conn)
            .await
            .context("Failed to create listings table")?;
        conn.close().await.context("Failed to close database")?;

        debug!("Schema ready at {}", self.path.display());
        Ok(())
    }

    /// Insert `records` in a single transaction. Empty input touches nothing.
    pub async fn append_records(&self, records: &[ListingRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await.context("Failed to begin transaction")?;

        for record in records {
            sqlx::query(INSERT_LISTING)
                .bind(&record.source)
                .bind(&record.url)
                .bind(&record.title)
                .bind(&record.price)
                .bind(&record.details)
                .bind(record.scraped_date.format("%Y-%m-%d").to_string())
                .execute(&mut *tx)
                .await
                .context("Failed to insert listing")?;
        }

        tx.commit().await.context("Failed to commit listings")?;
        conn.close().await.context("Failed to close database")?;

        info!("💾 Saved {} listings to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Total number of stored listings
    pub async fn count_records(&self) -> Result<i64> {
        let mut conn = self.connect().await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM listings")
            .fetch_one(&mut conn)
            .await
            .context("Failed to count listings")?;
        conn.close().await.context("Failed to close database")?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn record(source: &str, title: &str) -> ListingRecord {
        ListingRecord {
            title: title.to_string(),
            url: format!("https://example.com/{}", title),
            ..ListingRecord::new(source, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        }
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = ListingStore::new(dir.path().join("nested").join("listings.db"));

        store.init_schema().await.unwrap();
        store.init_schema().await.unwrap();

        assert!(store.path().exists());
        assert_eq!(store.count_records().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_append_records_is_append_only() {
        let dir = tempdir().unwrap();
        let store = ListingStore::new(dir.path().join("listings.db"));
        store.init_schema().await.unwrap();

        store
            .append_records(&[record("a", "one"), record("a", "two")])
            .await
            .unwrap();
        store.append_records(&[record("b", "one")]).await.unwrap();
        assert_eq!(store.count_records().await.unwrap(), 3);

        let mut conn = store.connect().await.unwrap();
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT id, source, title, scraped_date FROM listings ORDER BY id",
        )
        .fetch_all(&mut conn)
        .await
        .unwrap();

        assert_eq!(rows[0], (1, "a".to_string(), "one".to_string(), "2024-03-09".to_string()));
        assert_eq!(rows[1].2, "two");
        assert_eq!(rows[2].1, "b");
    }

    #[tokio::test]
    async fn test_append_empty_batch_does_not_open_store() {
        let dir = tempdir().unwrap();
        let store = ListingStore::new(dir.path().join("never.db"));

        store.append_records(&[]).await.unwrap();
        assert!(!store.path().exists());
    }
}
