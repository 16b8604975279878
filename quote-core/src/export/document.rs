use chrono::{Days, NaiveDate};

use super::{ExportArtifact, ExportError};
use crate::calculations::PricingResult;
use crate::form::DATE_FORMAT;
use crate::models::{DEFAULT_TERMS, FormSnapshot, RatesConfig};

/// How long an estimate stays valid after its date.
pub const VALIDITY_DAYS: u64 = 90;

const UK_DATE_FORMAT: &str = "%d/%m/%Y";

/// `2024-03-15` as `15/03/2024`; empty when the input is not a date.
pub fn format_date_uk(date: &str) -> String {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map(|d| d.format(UK_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Validity end date for a quote dated `quote_date`, counting from `today`
/// when the quote has no usable date.
pub fn valid_until(
    quote_date: &str,
    today: NaiveDate,
) -> String {
    let base = NaiveDate::parse_from_str(quote_date.trim(), DATE_FORMAT).unwrap_or(today);
    base.checked_add_days(Days::new(VALIDITY_DAYS))
        .map(|d| d.format(UK_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub description: String,
    pub qty: String,
    pub rate: String,
    pub total: String,
}

/// Display values for the printable estimate. Nothing here is computed
/// beyond formatting; totals come from a [`PricingResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteDocument {
    pub reference: String,
    pub date: String,
    pub valid_until: String,
    pub client: String,
    pub project: String,
    pub site: String,
    pub scope: String,
    pub total_hours: String,
    pub labour_days: String,
    pub total: String,
    pub issued_by: String,
    pub terms: String,
    pub rows: Vec<DocumentRow>,
}

fn or_fallback(
    value: &str,
    fallback: &str,
) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

impl QuoteDocument {
    pub fn build(
        snapshot: &FormSnapshot,
        totals: &PricingResult,
        config: &RatesConfig,
        today: NaiveDate,
    ) -> Self {
        let rows = snapshot
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.desc.is_empty())
            .map(|(index, item)| DocumentRow {
                description: item.desc.clone(),
                qty: item.qty.clone(),
                rate: item.rate.clone(),
                total: totals.line_total_display(index),
            })
            .collect();

        let terms = if config.terms.is_empty() {
            DEFAULT_TERMS
        } else {
            config.terms.as_str()
        };

        Self {
            reference: or_fallback(&snapshot.quote_ref, "Draft"),
            date: format_date_uk(&snapshot.quote_date),
            valid_until: valid_until(&snapshot.quote_date, today),
            client: or_fallback(&snapshot.client_name, "Client"),
            project: or_fallback(&snapshot.proj_name, "Project"),
            site: or_fallback(&snapshot.site_addr, "TBC"),
            scope: or_fallback(&snapshot.scope_notes, &config.default_scope),
            total_hours: totals.hours_display(),
            labour_days: totals.labour_days_display(),
            total: totals.total_display(),
            issued_by: snapshot.issued_by.clone(),
            terms: terms.to_string(),
            rows,
        }
    }

    pub fn file_name(&self) -> String {
        format!("Estimate_{}.pdf", self.reference)
    }
}

/// Turns a [`QuoteDocument`] into printable bytes.
pub trait DocumentRenderer {
    fn render(
        &self,
        document: &QuoteDocument,
    ) -> Result<Vec<u8>, ExportError>;
}

pub fn export_pdf(
    document: &QuoteDocument,
    renderer: &dyn DocumentRenderer,
) -> Result<ExportArtifact, ExportError> {
    Ok(ExportArtifact {
        file_name: document.file_name(),
        bytes: renderer.render(document)?,
    })
}
