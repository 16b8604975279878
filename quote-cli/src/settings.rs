//! Runtime settings: an optional TOML file, then environment, then flags.
//!
//! ```toml
//! [database]
//! path = "quotes.db"
//!
//! [remote]
//! backend = "postgrest"
//! url = "https://project.example.co/rest/v1"
//!
//! [logging]
//! level = "info"
//! file = "quotes.log"
//!
//! [autosave]
//! enabled = true
//! delay_ms = 1000
//!
//! [export]
//! dir = "out"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use quote_core::db::RemoteConfig;
use serde::Deserialize;

/// Environment variable holding the remote API key.
pub const REMOTE_KEY_ENV: &str = "QUOTE_REMOTE_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub remote: RemoteSettings,
    pub logging: LoggingSettings,
    pub autosave: AutosaveSettings,
    pub export: ExportSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSettings {
    /// Local SQLite file, `sqlite:` URL or `:memory:`.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "quotes.db".to_string(),
        }
    }
}

/// The shared store. Disabled unless `url` is set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteSettings {
    pub backend: String,
    pub url: Option<String>,
    pub api_key: Option<String>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            backend: "postgrest".to_string(),
            url: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutosaveSettings {
    pub enabled: bool,
    pub delay_ms: u64,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: 1000,
        }
    }
}

impl AutosaveSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSettings {
    pub dir: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

/// Command-line values that take precedence over the settings file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub db: Option<String>,
    pub remote_backend: Option<String>,
    pub remote_url: Option<String>,
    pub remote_key: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid settings file")
    }

    /// Reads `path` when given; otherwise starts from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Fills the API key from the environment when the file has none.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) {
        if self.remote.api_key.is_none() {
            self.remote.api_key = lookup(REMOTE_KEY_ENV).filter(|key| !key.is_empty());
        }
    }

    pub fn apply_overrides(
        &mut self,
        overrides: Overrides,
    ) {
        if let Some(db) = overrides.db {
            self.database.path = db;
        }
        if let Some(backend) = overrides.remote_backend {
            self.remote.backend = backend;
        }
        if let Some(url) = overrides.remote_url {
            self.remote.url = Some(url);
        }
        if let Some(key) = overrides.remote_key {
            self.remote.api_key = Some(key);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = Some(level);
        }
        if let Some(file) = overrides.log_file {
            self.logging.file = Some(file);
        }
    }

    /// Connection details for the shared store, or `None` when it is not
    /// configured.
    pub fn remote_config(&self) -> Option<RemoteConfig> {
        let url = self.remote.url.as_deref().filter(|url| !url.trim().is_empty())?;
        Some(RemoteConfig {
            backend: self.remote.backend.clone(),
            connection_string: url.to_string(),
            api_key: self.remote.api_key.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.database.path, "quotes.db");
        assert_eq!(settings.autosave.delay(), Duration::from_secs(1));
        assert!(settings.remote_config().is_none());
    }

    #[test]
    fn parses_every_section() {
        let settings = Settings::from_toml(
            r#"
            [database]
            path = "/tmp/q.db"

            [remote]
            backend = "sqlite"
            url = "shared.db"

            [logging]
            level = "debug"
            file = "q.log"

            [autosave]
            enabled = false
            delay_ms = 250

            [export]
            dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(settings.database.path, "/tmp/q.db");
        assert_eq!(settings.logging.level.as_deref(), Some("debug"));
        assert_eq!(settings.logging.file, Some(PathBuf::from("q.log")));
        assert!(!settings.autosave.enabled);
        assert_eq!(settings.autosave.delay(), Duration::from_millis(250));
        assert_eq!(settings.export.dir, PathBuf::from("out"));
        assert_eq!(
            settings.remote_config(),
            Some(RemoteConfig {
                backend: "sqlite".to_string(),
                connection_string: "shared.db".to_string(),
                api_key: None,
            })
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_toml("[database]\nfile = \"x\"").is_err());
    }

    #[test]
    fn env_key_fills_only_a_missing_key() {
        let mut settings = Settings::default();
        settings.apply_env(|name| (name == REMOTE_KEY_ENV).then(|| "from-env".to_string()));
        assert_eq!(settings.remote.api_key.as_deref(), Some("from-env"));

        settings.remote.api_key = Some("from-file".to_string());
        settings.apply_env(|_| Some("from-env".to_string()));
        assert_eq!(settings.remote.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn flags_override_the_file() {
        let mut settings = Settings::from_toml("[remote]\nurl = \"a\"\napi_key = \"k1\"").unwrap();
        settings.apply_overrides(Overrides {
            db: Some(":memory:".to_string()),
            remote_url: Some("https://b.example/rest/v1".to_string()),
            remote_key: Some("k2".to_string()),
            ..Default::default()
        });

        assert_eq!(settings.database.path, ":memory:");
        let remote = settings.remote_config().unwrap();
        assert_eq!(remote.backend, "postgrest");
        assert_eq!(remote.connection_string, "https://b.example/rest/v1");
        assert_eq!(remote.api_key.as_deref(), Some("k2"));
    }

    #[test]
    fn blank_url_disables_remote() {
        let settings = Settings::from_toml("[remote]\nurl = \"  \"").unwrap();
        assert!(settings.remote_config().is_none());
    }
}
