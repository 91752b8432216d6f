//! SQLite store of listings that have already been notified.

use apartment_core::Listing;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Membership test and insert over the set of notified listing ids.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// True when no record exists for `id`. Has no side effects.
    async fn is_new(&self, id: &str) -> Result<bool, DbError>;

    /// Record `listing` as notified. Recording an id twice is a no-op.
    async fn mark_seen(&self, listing: &Listing) -> Result<(), DbError>;
}

/// Snapshot captured when a listing was first notified.
#[derive(Debug, Clone, PartialEq)]
pub struct SeenRecord {
    pub id: String,
    pub street: String,
    pub unit: String,
    pub area_name: String,
    pub price: i64,
    /// Assigned by SQLite at insert time (UTC).
    pub first_seen_at: NaiveDateTime,
}

/// Database connection for the seen-listing set.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database file at `path`, creating it if missing.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        Self::connect_with(options).await
    }

    /// Private in-memory database, mostly for tests.
    pub async fn in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect_with(options).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self, DbError> {
        // One connection: the poller is the only writer and never issues
        // concurrent calls. It also keeps an in-memory database alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Create the table if this is a fresh database.
    async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_listings (
                id TEXT PRIMARY KEY,
                street TEXT NOT NULL,
                unit TEXT NOT NULL,
                area_name TEXT NOT NULL,
                price INTEGER NOT NULL,
                first_seen_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check whether a listing id has never been recorded.
    pub async fn is_new(&self, id: &str) -> Result<bool, DbError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM seen_listings WHERE id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count == 0)
    }

    /// Insert a record for the listing unless one already exists.
    pub async fn mark_seen(&self, listing: &Listing) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO seen_listings (id, street, unit, area_name, price)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&listing.id)
        .bind(&listing.street)
        .bind(&listing.unit)
        .bind(&listing.area_name)
        .bind(listing.price)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up the stored snapshot for an id.
    pub async fn seen_record(&self, id: &str) -> Result<Option<SeenRecord>, DbError> {
        let row = sqlx::query_as::<_, (String, String, String, String, i64, NaiveDateTime)>(
            "SELECT id, street, unit, area_name, price, first_seen_at FROM seen_listings WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(
            |(id, street, unit, area_name, price, first_seen_at)| SeenRecord {
                id,
                street,
                unit,
                area_name,
                price,
                first_seen_at,
            },
        ))
    }

    /// Number of recorded listings.
    pub async fn seen_count(&self) -> Result<i64, DbError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM seen_listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Close all connections. Pending writes are flushed first.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SeenStore for Database {
    async fn is_new(&self, id: &str) -> Result<bool, DbError> {
        Database::is_new(self, id).await
    }

    async fn mark_seen(&self, listing: &Listing) -> Result<(), DbError> {
        Database::mark_seen(self, listing).await
    }
}
