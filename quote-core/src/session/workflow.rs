use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::autosave::Autosaver;
use super::{EditSession, ListSource, Listing, QuoteError, SaveOutcome, base_ref};
use crate::db::{LocalState, RemoteStore, RemoteSync, RepositoryError};
use crate::form::FormState;
use crate::models::{FormSnapshot, QuoteRecord, QuoteSummary, RatesConfig};

/// Most rows fetched from the remote library.
pub const LIST_LIMIT: usize = 50;

/// Drives one editing session against the local store and, when
/// configured, the shared remote mirror.
///
/// Every save lands in the local library first. The remote copy is
/// best effort: a failure downgrades the outcome to
/// [`RemoteSync::LocalOnly`] and never undoes the local write.
pub struct QuoteWorkflow {
    session: EditSession,
    local: LocalState,
    remote: Option<Arc<dyn RemoteStore>>,
    last_listing: Vec<QuoteSummary>,
    autosaver: Option<Autosaver>,
}

impl QuoteWorkflow {
    pub fn new(
        config: RatesConfig,
        local: LocalState,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Self {
        Self {
            session: EditSession::new(config, Local::now().date_naive()),
            local,
            remote,
            last_listing: Vec::new(),
            autosaver: None,
        }
    }

    /// Enables debounced autosave of every edit made through
    /// [`edit`](Self::edit).
    pub fn with_autosave(
        mut self,
        delay: Duration,
    ) -> Self {
        self.autosaver = Some(Autosaver::new(self.local.clone(), delay));
        self
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn config(&self) -> &RatesConfig {
        &self.session.config
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Swaps in an edited config. Form inputs are kept.
    pub fn set_config(
        &mut self,
        config: RatesConfig,
    ) {
        self.session.config = config;
    }

    /// Applies an edit to the form and schedules an autosave.
    pub fn edit<R>(
        &mut self,
        f: impl FnOnce(&mut FormState, &RatesConfig) -> R,
    ) -> R {
        let result = f(&mut self.session.form, &self.session.config);
        if let Some(autosaver) = self.autosaver.as_mut() {
            autosaver.trigger(self.session.snapshot());
        }
        result
    }

    /// Saves the form as the active quote, minting an id if there is none.
    pub async fn save(&mut self) -> Result<SaveOutcome, QuoteError> {
        let snapshot = self.session.snapshot();
        if snapshot.quote_ref.trim().is_empty() {
            return Err(QuoteError::Validation(
                "please enter an estimate reference first".to_string(),
            ));
        }

        let id = self
            .session
            .current_quote_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let record =
            QuoteRecord::from_snapshot(id.clone(), self.session.current_revision, snapshot, Utc::now());

        let record = self.local.upsert_library(record).await?;
        self.session.current_quote_id = Some(id);
        info!(id = %record.id, quote_ref = %record.ref_code, "quote saved locally");

        let remote = self.mirror(&record).await;
        Ok(SaveOutcome { record, remote })
    }

    async fn mirror(
        &self,
        record: &QuoteRecord,
    ) -> RemoteSync {
        let Some(remote) = &self.remote else {
            return RemoteSync::Disabled;
        };
        match remote.upsert_quote(record).await {
            Ok(()) => {
                debug!(id = %record.id, "quote mirrored to remote");
                RemoteSync::Synced
            }
            Err(e) => {
                warn!(id = %record.id, error = %e, "remote save failed; kept local copy");
                RemoteSync::LocalOnly(e.to_string())
            }
        }
    }

    /// Saves the form as the next revision of the active quote.
    ///
    /// The new record gets a fresh id and a `-REV<n>` reference; the quote
    /// it came from is left untouched. On failure the session is restored.
    pub async fn revise(&mut self) -> Result<SaveOutcome, QuoteError> {
        if !self.session.can_revise() {
            return Err(QuoteError::State("save the original quote first".to_string()));
        }
        let base = base_ref(self.session.form.quote_ref.trim()).to_string();
        if base.is_empty() {
            return Err(QuoteError::Validation(
                "please enter an estimate reference first".to_string(),
            ));
        }

        let previous_ref = self.session.form.quote_ref.clone();
        let previous_id = self.session.current_quote_id.take();
        let previous_revision = self.session.current_revision;

        self.session.current_revision += 1;
        self.session.form.quote_ref = format!("{base}-REV{}", self.session.current_revision);

        match self.save().await {
            Ok(outcome) => {
                info!(revision = self.session.current_revision, "revision created");
                Ok(outcome)
            }
            Err(e) => {
                self.session.form.quote_ref = previous_ref;
                self.session.current_quote_id = previous_id;
                self.session.current_revision = previous_revision;
                Err(e)
            }
        }
    }

    /// The quote library: remote when reachable, otherwise local.
    pub async fn list(&mut self) -> Result<Listing, QuoteError> {
        if let Some(remote) = &self.remote {
            match remote.list_quotes(LIST_LIMIT).await {
                Ok(records) => {
                    let quotes: Vec<QuoteSummary> =
                        records.into_iter().map(QuoteSummary::from).collect();
                    self.last_listing = quotes.clone();
                    return Ok(Listing {
                        source: ListSource::Remote,
                        quotes,
                    });
                }
                Err(e) => warn!(error = %e, "remote library unavailable; listing local quotes"),
            }
        }

        let quotes: Vec<QuoteSummary> = self
            .local
            .library()
            .await?
            .into_iter()
            .map(QuoteSummary::from)
            .collect();
        self.last_listing = quotes.clone();
        Ok(Listing {
            source: ListSource::Local,
            quotes,
        })
    }

    /// Opens a stored quote for editing.
    ///
    /// Looks in the last listing, then the local library, then the remote
    /// store. The revision counter is taken from the reference's suffix.
    pub async fn load(
        &mut self,
        id: &str,
    ) -> Result<FormSnapshot, QuoteError> {
        let data = match self.last_listing.iter().find(|q| q.id == id) {
            Some(summary) => summary.data.clone(),
            None => self.fetch_stored(id).await?,
        };

        if let Some(autosaver) = self.autosaver.as_mut() {
            autosaver.cancel();
        }
        self.session.open(id, &data);
        info!(id, quote_ref = %data.quote_ref, "quote loaded");
        Ok(self.session.snapshot())
    }

    async fn fetch_stored(
        &self,
        id: &str,
    ) -> Result<FormSnapshot, QuoteError> {
        if let Some(record) = self
            .local
            .library()
            .await?
            .into_iter()
            .find(|q| q.id == id)
        {
            return Ok(record.data);
        }

        let Some(remote) = &self.remote else {
            return Err(QuoteError::NotFound(id.to_string()));
        };
        match remote.get_quote(id).await {
            Ok(record) => Ok(record.data),
            Err(RepositoryError::NotFound) => Err(QuoteError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Clears the form for a new quote.
    pub fn new_quote(&mut self) {
        if let Some(autosaver) = self.autosaver.as_mut() {
            autosaver.cancel();
        }
        self.session.reset(Local::now().date_naive());
        info!("new quote started");
    }

    /// Loads a previously exported JSON snapshot as a new, unsaved quote.
    pub fn import_snapshot(
        &mut self,
        json: &str,
    ) -> Result<FormSnapshot, QuoteError> {
        let snapshot: FormSnapshot = serde_json::from_str(json)?;
        self.session.reset(Local::now().date_naive());
        self.session.form = FormState::restore(&snapshot, &self.session.config);
        self.session.current_revision = super::revision_of(&snapshot.quote_ref);
        Ok(self.session.snapshot())
    }

    /// Repopulates the form from the autosave slot. Returns whether
    /// anything was restored.
    pub async fn restore_autosave(&mut self) -> Result<bool, QuoteError> {
        let Some(snapshot) = self.local.autosave().await? else {
            return Ok(false);
        };
        self.session.form = FormState::restore(&snapshot, &self.session.config);
        info!(quote_ref = %snapshot.quote_ref, "restored autosaved session");
        Ok(true)
    }

    /// Writes any pending autosave now.
    pub async fn flush_autosave(&mut self) {
        if let Some(autosaver) = self.autosaver.as_mut() {
            autosaver.flush().await;
        }
    }
}
