//! SQLite database layer (embedded, no external dependencies)

use crate::error::Result;
use crate::storage::KycStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kyc_types::{cache_key, Kyc, KycRecord, KycUpdate, NewKyc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path);

        // Create parent directory if needed
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!("SQLite connection established, running migrations...");
        Self::run_migrations(&pool).await?;
        tracing::info!("Database initialization complete");

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// A private in-memory database, kept on a single long-lived connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kycs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                pan_number TEXT NOT NULL UNIQUE,
                aadhar_number TEXT UNIQUE,
                merchant_id TEXT NOT NULL UNIQUE,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KycStore for Database {
    async fn insert(&self, kyc: &NewKyc) -> Result<Kyc> {
        let merchant_id = kyc.resolve_merchant_id();

        let row: KycRow = sqlx::query_as(
            r#"
            INSERT INTO kycs (name, pan_number, aadhar_number, merchant_id)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, name, pan_number, aadhar_number, merchant_id, created_at, updated_at
            "#,
        )
        .bind(&kyc.name)
        .bind(&kyc.pan_number)
        .bind(&kyc.aadhar_number)
        .bind(cache_key(&merchant_id))
        .fetch_one(&*self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_records(&self) -> Result<Vec<KycRecord>> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT name, pan_number, merchant_id FROM kycs
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_by_merchant(&self, merchant_id: Uuid, update: &KycUpdate) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE kycs
            SET pan_number = COALESCE(?1, pan_number),
                aadhar_number = COALESCE(?2, aadhar_number),
                updated_at = CURRENT_TIMESTAMP
            WHERE merchant_id = ?3
            "#,
        )
        .bind(&update.pan_number)
        .bind(&update.aadhar_number)
        .bind(cache_key(&merchant_id))
        .execute(&*self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_by_merchant(&self, merchant_id: Uuid) -> Result<Option<Kyc>> {
        let row: Option<KycRow> = sqlx::query_as(
            r#"
            SELECT id, name, pan_number, aadhar_number, merchant_id, created_at, updated_at
            FROM kycs WHERE merchant_id = ?1
            "#,
        )
        .bind(cache_key(&merchant_id))
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct KycRow {
    id: i64,
    name: String,
    pan_number: String,
    aadhar_number: Option<String>,
    merchant_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<KycRow> for Kyc {
    fn from(r: KycRow) -> Self {
        Kyc {
            id: r.id,
            name: r.name,
            pan_number: r.pan_number,
            aadhar_number: r.aadhar_number,
            merchant_id: parse_merchant_id(&r.merchant_id),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    name: String,
    pan_number: String,
    merchant_id: String,
}

impl From<RecordRow> for KycRecord {
    fn from(r: RecordRow) -> Self {
        KycRecord {
            name: r.name,
            pan_number: r.pan_number,
            merchant_id: parse_merchant_id(&r.merchant_id),
        }
    }
}

/// Unparseable ids read as nil so the record fails validation downstream.
fn parse_merchant_id(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_else(|_| {
        tracing::warn!("Stored merchant_id is not a UUID: {:?}", s);
        Uuid::nil()
    })
}
