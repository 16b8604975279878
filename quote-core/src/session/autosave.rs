//! Debounced background save of the form to the local autosave slot.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::db::LocalState;
use crate::models::FormSnapshot;

/// Quiet period after the last edit before the form is written.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(1);

/// Writes the latest form snapshot once edits have paused.
///
/// Every [`trigger`](Self::trigger) cancels the pending timer and starts a
/// new one. When a timer fires it writes whatever snapshot was pushed last,
/// so a burst of edits produces a single write of the final state.
///
/// Must be used from within a tokio runtime.
pub struct Autosaver {
    local: LocalState,
    delay: Duration,
    latest: watch::Sender<Option<FormSnapshot>>,
    pending: Option<JoinHandle<()>>,
}

impl Autosaver {
    pub fn new(
        local: LocalState,
        delay: Duration,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            local,
            delay,
            latest,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records `snapshot` as the current form and restarts the quiet period.
    pub fn trigger(
        &mut self,
        snapshot: FormSnapshot,
    ) {
        self.latest.send_replace(Some(snapshot));
        self.cancel();

        let local = self.local.clone();
        let delay = self.delay;
        let latest = self.latest.subscribe();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let snapshot = latest.borrow().clone();
            if let Some(snapshot) = snapshot {
                match local.save_autosave(&snapshot).await {
                    Ok(()) => debug!(quote_ref = %snapshot.quote_ref, "autosaved"),
                    Err(e) => warn!(error = %e, "autosave failed"),
                }
            }
        }));
    }

    /// True while a timer is counting down.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Drops the pending timer without writing.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Writes the latest snapshot immediately if a timer is pending.
    pub async fn flush(&mut self) {
        if !self.is_pending() {
            return;
        }
        self.cancel();
        let snapshot = self.latest.borrow().clone();
        if let Some(snapshot) = snapshot {
            if let Err(e) = self.local.save_autosave(&snapshot).await {
                warn!(error = %e, "autosave flush failed");
            }
        }
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        self.cancel();
    }
}
