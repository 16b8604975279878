use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FormSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Declined,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// A saved quote.
///
/// `id` is stable for the lifetime of the record; a revision is a new
/// record with its own id. The aliases accept the shorter field names
/// used by library entries written before the remote mirror existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub id: String,
    #[serde(default, alias = "ref")]
    pub ref_code: String,
    #[serde(default, alias = "project")]
    pub project_name: String,
    #[serde(default, alias = "client")]
    pub client_name: String,
    #[serde(default)]
    pub quote_date: String,
    #[serde(default, alias = "total")]
    pub total_amount: String,
    #[serde(default)]
    pub revision: u32,
    #[serde(default)]
    pub status: QuoteStatus,
    #[serde(default, alias = "savedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: FormSnapshot,
}

impl QuoteRecord {
    /// Builds a record from a captured snapshot.
    pub fn from_snapshot(
        id: impl Into<String>,
        revision: u32,
        snapshot: FormSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            ref_code: snapshot.quote_ref.clone(),
            project_name: snapshot.proj_name.clone(),
            client_name: snapshot.client_name.clone(),
            quote_date: snapshot.quote_date.clone(),
            total_amount: snapshot.final_total.clone(),
            revision,
            status: snapshot.status,
            created_at: now,
            updated_at: Some(now),
            data: snapshot,
        }
    }
}

/// One row of the quote library, whichever store it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub id: String,
    pub ref_code: String,
    pub project: String,
    pub client: String,
    pub date: DateTime<Utc>,
    pub total: String,
    pub data: FormSnapshot,
}

impl From<QuoteRecord> for QuoteSummary {
    fn from(record: QuoteRecord) -> Self {
        Self {
            id: record.id,
            ref_code: record.ref_code,
            project: record.project_name,
            client: record.client_name,
            date: record.created_at,
            total: record.total_amount,
            data: record.data,
        }
    }
}

impl QuoteSummary {
    /// Label shown in the library list: project, else client.
    pub fn heading(&self) -> &str {
        if !self.project.is_empty() {
            &self.project
        } else if !self.client.is_empty() {
            &self.client
        } else {
            "No project"
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn legacy_library_entry_normalizes_field_names() {
        let json = r#"{
            "id": "abc",
            "ref": "Q7",
            "project": "Fit-out",
            "client": "Acme",
            "savedAt": "2024-11-02T10:00:00Z",
            "total": "£900.00",
            "data": {"quoteRef": "Q7"}
        }"#;

        let record: QuoteRecord = serde_json::from_str(json).expect("legacy entry should parse");
        let summary = QuoteSummary::from(record);

        assert_eq!(summary.ref_code, "Q7");
        assert_eq!(summary.project, "Fit-out");
        assert_eq!(summary.client, "Acme");
        assert_eq!(summary.total, "£900.00");
        assert_eq!(summary.date.to_rfc3339(), "2024-11-02T10:00:00+00:00");
        assert_eq!(summary.data.quote_ref, "Q7");
    }

    #[test]
    fn from_snapshot_copies_summary_fields() {
        let snapshot = FormSnapshot {
            quote_ref: "Q1".to_string(),
            proj_name: "Office".to_string(),
            client_name: "Acme".to_string(),
            quote_date: "2025-01-10".to_string(),
            final_total: "£10.00".to_string(),
            ..Default::default()
        };
        let now = Utc::now();

        let record = QuoteRecord::from_snapshot("id-1", 2, snapshot.clone(), now);

        assert_eq!(record.ref_code, "Q1");
        assert_eq!(record.project_name, "Office");
        assert_eq!(record.total_amount, "£10.00");
        assert_eq!(record.revision, 2);
        assert_eq!(record.created_at, now);
        assert_eq!(record.data, snapshot);
    }

    #[test]
    fn heading_prefers_project_then_client() {
        let mut summary = QuoteSummary::from(QuoteRecord::from_snapshot(
            "x",
            0,
            FormSnapshot::default(),
            Utc::now(),
        ));
        assert_eq!(summary.heading(), "No project");

        summary.client = "Acme".to_string();
        assert_eq!(summary.heading(), "Acme");

        summary.project = "Fit-out".to_string();
        assert_eq!(summary.heading(), "Fit-out");
    }
}
