use chrono::{DateTime, SecondsFormat, Utc};
use quote_core::{QuoteRecord, QuoteStatus, RepositoryError};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

fn column_error(
    column: &str,
    e: impl std::fmt::Display,
) -> RepositoryError {
    RepositoryError::Database(format!("Failed to read column '{column}': {e}"))
}

pub fn get_text(
    row: &SqliteRow,
    column: &str,
) -> Result<String, RepositoryError> {
    row.try_get::<String, _>(column)
        .map_err(|e| column_error(column, e))
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
        })
        .map_err(|e| RepositoryError::Database(format!("Failed to parse timestamp '{s}': {e}")))
}

pub fn row_to_quote(row: &SqliteRow) -> Result<QuoteRecord, RepositoryError> {
    let status = get_text(row, "status")?;
    let data = get_text(row, "data")?;
    let updated_at: Option<String> = row
        .try_get("updated_at")
        .map_err(|e| column_error("updated_at", e))?;
    let revision: i64 = row
        .try_get("revision")
        .map_err(|e| column_error("revision", e))?;

    Ok(QuoteRecord {
        id: get_text(row, "id")?,
        ref_code: get_text(row, "ref_code")?,
        project_name: get_text(row, "project_name")?,
        client_name: get_text(row, "client_name")?,
        quote_date: get_text(row, "quote_date")?,
        total_amount: get_text(row, "total_amount")?,
        revision: u32::try_from(revision).unwrap_or_default(),
        status: QuoteStatus::parse(&status).unwrap_or_default(),
        created_at: parse_timestamp(&get_text(row, "created_at")?)?,
        updated_at: updated_at.as_deref().map(parse_timestamp).transpose()?,
        data: serde_json::from_str(&data)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn timestamps_round_trip_at_fixed_width() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let text = format_timestamp(ts);
        assert_eq!(text, "2024-05-01T09:30:00.000000Z");
        assert_eq!(parse_timestamp(&text).unwrap(), ts);
    }

    #[test]
    fn sqlite_default_timestamps_parse() {
        let ts = parse_timestamp("2024-05-01 09:30:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_err());
    }
}
