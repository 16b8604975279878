use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quote_core::session::revision_of;
use quote_core::{FormSnapshot, QuoteRecord, RemoteStore, RepositoryError};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const SETTINGS_TABLE: &str = "app_settings";
const ESTIMATES_TABLE: &str = "estimates";
const SETTINGS_ROW_ID: i64 = 1;
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates";

#[derive(Debug, Serialize, Deserialize)]
struct SettingsRow {
    id: i64,
    config: Value,
}

/// Row written to `estimates`.
///
/// The hosted table has exactly these columns plus a server-defaulted
/// `created_at`, which an upsert therefore never moves. The quote date,
/// status and revision travel inside `data`.
#[derive(Debug, Serialize)]
struct EstimateRow<'a> {
    id: &'a str,
    ref_code: &'a str,
    project_name: &'a str,
    client_name: &'a str,
    total_amount: &'a str,
    data: &'a FormSnapshot,
    updated_at: DateTime<Utc>,
}

impl<'a> From<&'a QuoteRecord> for EstimateRow<'a> {
    fn from(quote: &'a QuoteRecord) -> Self {
        Self {
            id: &quote.id,
            ref_code: &quote.ref_code,
            project_name: &quote.project_name,
            client_name: &quote.client_name,
            total_amount: &quote.total_amount,
            data: &quote.data,
            updated_at: quote.updated_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Remote store backed by a PostgREST endpoint such as a hosted Postgres
/// REST API.
pub struct PostgrestRepository {
    client: Client,
    base_url: String,
}

impl PostgrestRepository {
    /// `base_url` is the REST root, e.g. `https://project.example.co/rest/v1`.
    /// The key is sent both as `apikey` and as a bearer token.
    pub fn new(
        base_url: &str,
        api_key: &str,
    ) -> Result<Self, RepositoryError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| RepositoryError::Configuration(format!("invalid API key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| RepositoryError::Configuration(format!("invalid API key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| RepositoryError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(
        &self,
        table: &str,
    ) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn settings_request(&self) -> RequestBuilder {
        self.client.get(self.table_url(SETTINGS_TABLE)).query(&[
            ("select", "config".to_string()),
            ("id", format!("eq.{SETTINGS_ROW_ID}")),
        ])
    }

    fn list_request(
        &self,
        limit: usize,
    ) -> RequestBuilder {
        self.client.get(self.table_url(ESTIMATES_TABLE)).query(&[
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ])
    }

    fn quote_request(
        &self,
        id: &str,
    ) -> RequestBuilder {
        self.client
            .get(self.table_url(ESTIMATES_TABLE))
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))])
    }

    fn upsert_request<T: Serialize + ?Sized>(
        &self,
        table: &str,
        rows: &T,
    ) -> RequestBuilder {
        self.client
            .post(self.table_url(table))
            .header("Prefer", MERGE_DUPLICATES)
            .json(rows)
    }
}

async fn send(request: RequestBuilder) -> Result<Response, RepositoryError> {
    let response = request
        .send()
        .await
        .map_err(|e| RepositoryError::Connection(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RepositoryError::Database(if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }))
}

/// Fills the record fields that the hosted table keeps only in `data`.
fn complete_record(mut record: QuoteRecord) -> QuoteRecord {
    if record.quote_date.is_empty() {
        record.quote_date = record.data.quote_date.clone();
    }
    record.status = record.data.status;
    record.revision = revision_of(&record.ref_code);
    record
}

async fn read_rows<T: for<'de> Deserialize<'de>>(
    response: Response,
) -> Result<Vec<T>, RepositoryError> {
    response
        .json()
        .await
        .map_err(|e| RepositoryError::Serialization(e.to_string()))
}

#[async_trait]
impl RemoteStore for PostgrestRepository {
    async fn fetch_settings(&self) -> Result<Option<Value>, RepositoryError> {
        #[derive(Deserialize)]
        struct ConfigOnly {
            config: Value,
        }

        let response = send(self.settings_request()).await?;
        let rows: Vec<ConfigOnly> = read_rows(response).await?;
        Ok(rows.into_iter().next().map(|row| row.config))
    }

    async fn upsert_settings(
        &self,
        config: &Value,
    ) -> Result<(), RepositoryError> {
        let row = SettingsRow {
            id: SETTINGS_ROW_ID,
            config: config.clone(),
        };
        send(self.upsert_request(SETTINGS_TABLE, &[row])).await?;
        debug!("shared settings upserted");
        Ok(())
    }

    async fn upsert_quote(
        &self,
        quote: &QuoteRecord,
    ) -> Result<(), RepositoryError> {
        let row = EstimateRow::from(quote);
        send(self.upsert_request(ESTIMATES_TABLE, &[row])).await?;
        debug!(id = %quote.id, "estimate upserted");
        Ok(())
    }

    async fn list_quotes(
        &self,
        limit: usize,
    ) -> Result<Vec<QuoteRecord>, RepositoryError> {
        let response = send(self.list_request(limit)).await?;
        let rows: Vec<QuoteRecord> = read_rows(response).await?;
        Ok(rows.into_iter().map(complete_record).collect())
    }

    async fn get_quote(
        &self,
        id: &str,
    ) -> Result<QuoteRecord, RepositoryError> {
        let response = send(self.quote_request(id)).await?;
        let rows: Vec<QuoteRecord> = read_rows(response).await?;
        rows.into_iter()
            .next()
            .map(complete_record)
            .ok_or(RepositoryError::NotFound)
    }
}
