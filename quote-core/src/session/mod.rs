//! The editing session and the save / revise / list / load workflow.

pub mod autosave;
mod workflow;

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::calculations::PricingResult;
use crate::db::{RemoteSync, RepositoryError};
use crate::form::FormState;
use crate::models::{FormSnapshot, QuoteRecord, QuoteSummary, RatesConfig};

pub use autosave::{Autosaver, DEFAULT_AUTOSAVE_DELAY};
pub use workflow::{LIST_LIMIT, QuoteWorkflow};

static REVISION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-REV(\d+)$").expect("revision suffix regex is valid"));

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    State(String),

    #[error("no quote with id '{0}'")]
    NotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub record: QuoteRecord,
    pub remote: RemoteSync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub source: ListSource,
    pub quotes: Vec<QuoteSummary>,
}

/// Strips a trailing `-REV<n>` from a reference code.
pub fn base_ref(quote_ref: &str) -> &str {
    match REVISION_SUFFIX.find(quote_ref) {
        Some(m) => &quote_ref[..m.start()],
        None => quote_ref,
    }
}

/// Revision number encoded in a reference code, 0 when there is none.
pub fn revision_of(quote_ref: &str) -> u32 {
    REVISION_SUFFIX
        .captures(quote_ref)
        .and_then(|caps| caps.get(1))
        .and_then(|n| n.as_str().parse().ok())
        .unwrap_or(0)
}

/// Everything that describes the quote being edited right now.
#[derive(Debug, Clone)]
pub struct EditSession {
    pub config: RatesConfig,
    pub form: FormState,
    current_quote_id: Option<String>,
    current_revision: u32,
}

impl EditSession {
    pub fn new(
        config: RatesConfig,
        today: NaiveDate,
    ) -> Self {
        let form = FormState::blank(&config, today);
        Self {
            config,
            form,
            current_quote_id: None,
            current_revision: 0,
        }
    }

    pub fn current_quote_id(&self) -> Option<&str> {
        self.current_quote_id.as_deref()
    }

    pub fn current_revision(&self) -> u32 {
        self.current_revision
    }

    /// A revision can only be cut from a quote that has been saved.
    pub fn can_revise(&self) -> bool {
        self.current_quote_id.is_some()
    }

    pub fn snapshot(&self) -> FormSnapshot {
        self.form.capture(&self.config)
    }

    pub fn totals(&self) -> PricingResult {
        self.form.totals(&self.config)
    }

    /// Blank form, no active quote. The issuer carries over.
    pub fn reset(
        &mut self,
        today: NaiveDate,
    ) {
        let issued_by = std::mem::take(&mut self.form.issued_by);
        self.form = FormState::blank(&self.config, today);
        if !issued_by.is_empty() {
            self.form.issued_by = issued_by;
        }
        self.current_quote_id = None;
        self.current_revision = 0;
    }

    /// Makes `snapshot` the form contents, bound to quote `id`.
    pub fn open(
        &mut self,
        id: impl Into<String>,
        snapshot: &FormSnapshot,
    ) {
        self.form = FormState::restore(snapshot, &self.config);
        self.current_quote_id = Some(id.into());
        self.current_revision = revision_of(&snapshot.quote_ref);
    }
}
