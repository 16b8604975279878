use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use quote_core::{LocalStore, QuoteRecord, RemoteStore, RepositoryError};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::row::{format_timestamp, get_text, row_to_quote};

const SETTINGS_ROW_ID: i64 = 1;

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

/// SQLite-backed store.
///
/// One database file can serve as the device-local store (`local_state`
/// table) and as a shared mirror (`app_settings` and `estimates`) when it
/// lives somewhere several machines can reach.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens (creating if needed) the database at `database_url`. Accepts a
    /// bare path, a `sqlite:` URL or `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database location: {database_url}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {database_url}"))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl LocalStore for SqliteRepository {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM local_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(|(value,)| value))
    }

    async fn put(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO local_state (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        debug!(key, bytes = value.len(), "local state written");
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for SqliteRepository {
    async fn fetch_settings(&self) -> Result<Option<Value>, RepositoryError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT config FROM app_settings WHERE id = ?")
            .bind(SETTINGS_ROW_ID)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.map(|(config,)| serde_json::from_str(&config).map_err(RepositoryError::from))
            .transpose()
    }

    async fn upsert_settings(
        &self,
        config: &Value,
    ) -> Result<(), RepositoryError> {
        let text = serde_json::to_string(config)?;
        sqlx::query(
            "INSERT INTO app_settings (id, config, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET config = excluded.config, updated_at = excluded.updated_at",
        )
        .bind(SETTINGS_ROW_ID)
        .bind(text)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn upsert_quote(
        &self,
        quote: &QuoteRecord,
    ) -> Result<(), RepositoryError> {
        let data = serde_json::to_string(&quote.data)?;
        let updated_at = quote.updated_at.unwrap_or_else(Utc::now);
        sqlx::query(
            "INSERT INTO estimates (
                id, ref_code, project_name, client_name, quote_date, total_amount,
                revision, status, data, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                ref_code = excluded.ref_code,
                project_name = excluded.project_name,
                client_name = excluded.client_name,
                quote_date = excluded.quote_date,
                total_amount = excluded.total_amount,
                revision = excluded.revision,
                status = excluded.status,
                data = excluded.data,
                updated_at = excluded.updated_at",
        )
        .bind(&quote.id)
        .bind(&quote.ref_code)
        .bind(&quote.project_name)
        .bind(&quote.client_name)
        .bind(&quote.quote_date)
        .bind(&quote.total_amount)
        .bind(i64::from(quote.revision))
        .bind(quote.status.as_str())
        .bind(data)
        .bind(format_timestamp(quote.created_at))
        .bind(format_timestamp(updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        debug!(id = %quote.id, "estimate upserted");
        Ok(())
    }

    async fn list_quotes(
        &self,
        limit: usize,
    ) -> Result<Vec<QuoteRecord>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT id, ref_code, project_name, client_name, quote_date, total_amount,
                    revision, status, data, created_at, updated_at
             FROM estimates
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_quote).collect()
    }

    async fn get_quote(
        &self,
        id: &str,
    ) -> Result<QuoteRecord, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, ref_code, project_name, client_name, quote_date, total_amount,
                    revision, status, data, created_at, updated_at
             FROM estimates WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_quote(&row)
    }
}

impl SqliteRepository {
    /// Raw `key` lookup kept for diagnostics.
    pub async fn local_keys(&self) -> Result<Vec<String>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT key FROM local_state ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    /// `updated_at` of a local key, mainly for tests and diagnostics.
    pub async fn local_updated_at(
        &self,
        key: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT updated_at FROM local_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(|r| get_text(r, "updated_at")).transpose()
    }
}
