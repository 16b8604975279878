//! Rate configuration: loading, legacy upgrade, admin edits and saving.
//!
//! Load order is built-in defaults, then the local blob, then the shared
//! remote blob. A usable remote blob wins and is written back locally so the
//! next offline start sees it.

pub mod migration;

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{LocalState, RemoteStore, RemoteSync, RepositoryError};
use crate::models::RatesConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config has no labour table")]
    MissingLabour,

    #[error("unknown rate id '{0}'")]
    UnknownRate(String),

    #[error("unknown global setting '{0}'")]
    UnknownGlobal(String),

    #[error("{name} must not be negative (got {value})")]
    Negative { name: String, value: Decimal },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Parses a stored blob, upgrading the legacy layout when detected.
///
/// A blob is only usable when it carries a `labour` list.
pub fn parse_config(value: Value) -> Result<RatesConfig, ConfigError> {
    if !value.get("labour").is_some_and(Value::is_array) {
        return Err(ConfigError::MissingLabour);
    }
    if migration::is_legacy(&value) {
        debug!("upgrading legacy config layout");
        return migration::migrate_legacy(value);
    }
    serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Names accepted by [`RatesConfig::set_global`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalSetting {
    DayHours,
    Ooh,
    Saturday,
    Sunday,
    Vat,
    MarginTarget,
}

impl FromStr for GlobalSetting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dayhours" | "day_hours" | "day-hours" => Ok(Self::DayHours),
            "ooh" | "oohmultiplier" | "ooh_multiplier" => Ok(Self::Ooh),
            "sat" | "saturday" | "satmultiplier" | "sat_multiplier" => Ok(Self::Saturday),
            "sun" | "sunday" | "sunmultiplier" | "sun_multiplier" => Ok(Self::Sunday),
            "vat" | "vatrate" | "vat_rate" => Ok(Self::Vat),
            "margin" | "margintarget" | "margin_target" => Ok(Self::MarginTarget),
            _ => Err(ConfigError::UnknownGlobal(s.to_string())),
        }
    }
}

fn non_negative(
    name: &str,
    value: Decimal,
) -> Result<Decimal, ConfigError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ConfigError::Negative {
            name: name.to_string(),
            value,
        });
    }
    Ok(value)
}

impl RatesConfig {
    pub fn set_rate(
        &mut self,
        id: &str,
        rate: Decimal,
    ) -> Result<(), ConfigError> {
        let rate = non_negative(id, rate)?;
        let item = self
            .find_mut(id)
            .ok_or_else(|| ConfigError::UnknownRate(id.to_string()))?;
        item.rate = rate;
        Ok(())
    }

    pub fn set_label(
        &mut self,
        id: &str,
        label: &str,
    ) -> Result<(), ConfigError> {
        let item = self
            .find_mut(id)
            .ok_or_else(|| ConfigError::UnknownRate(id.to_string()))?;
        item.label = label.trim().to_string();
        Ok(())
    }

    pub fn set_terms(
        &mut self,
        terms: &str,
    ) {
        self.terms = terms.to_string();
    }

    pub fn set_global(
        &mut self,
        setting: GlobalSetting,
        value: Decimal,
    ) -> Result<(), ConfigError> {
        let globals = &mut self.globals;
        let slot = match setting {
            GlobalSetting::DayHours => &mut globals.day_hours,
            GlobalSetting::Ooh => &mut globals.ooh_multiplier,
            GlobalSetting::Saturday => &mut globals.sat_multiplier,
            GlobalSetting::Sunday => &mut globals.sun_multiplier,
            GlobalSetting::Vat => &mut globals.vat_rate,
            GlobalSetting::MarginTarget => &mut globals.margin_target,
        };
        *slot = non_negative(&format!("{setting:?}"), value)?;
        Ok(())
    }
}

/// Reads and writes the rate configuration across the local and shared
/// stores.
#[derive(Clone)]
pub struct ConfigStore {
    local: LocalState,
    remote: Option<Arc<dyn RemoteStore>>,
}

impl ConfigStore {
    pub fn new(
        local: LocalState,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Self {
        Self { local, remote }
    }

    /// Resolves the active configuration. Never fails: every unusable
    /// source is logged and skipped.
    pub async fn load(&self) -> RatesConfig {
        let mut config = RatesConfig::default();

        match self.local.config_blob().await {
            Ok(Some(blob)) => match parse_config(blob) {
                Ok(local) => config = local,
                Err(e) => warn!(error = %e, "ignoring local config"),
            },
            Ok(None) => debug!("no local config; using built-in defaults"),
            Err(e) => warn!(error = %e, "local config unavailable"),
        }

        let Some(remote) = &self.remote else {
            return config;
        };

        match remote.fetch_settings().await {
            Ok(Some(blob)) => match parse_config(blob) {
                Ok(shared) => {
                    config = shared;
                    if let Err(e) = self.local.save_config(&config).await {
                        warn!(error = %e, "could not cache shared config locally");
                    }
                    info!("loaded shared config");
                }
                Err(e) => warn!(error = %e, "ignoring shared config"),
            },
            Ok(None) => debug!("no shared config stored yet"),
            Err(e) => warn!(error = %e, "shared config unavailable; keeping local"),
        }

        config
    }

    /// Saves an edited configuration. The local write must succeed; the
    /// shared copy is best effort.
    pub async fn save_admin(
        &self,
        config: &RatesConfig,
    ) -> Result<RemoteSync, ConfigError> {
        self.local.save_config(config).await?;

        let Some(remote) = &self.remote else {
            info!("config saved locally");
            return Ok(RemoteSync::Disabled);
        };

        let blob = serde_json::to_value(config).map_err(RepositoryError::from)?;
        match remote.upsert_settings(&blob).await {
            Ok(()) => {
                info!("config saved to shared store");
                Ok(RemoteSync::Synced)
            }
            Err(e) => {
                warn!(error = %e, "shared config write failed; saved locally only");
                Ok(RemoteSync::LocalOnly(e.to_string()))
            }
        }
    }
}
