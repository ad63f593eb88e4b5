//! Board runtime configuration.
//!
//! # Responsibility
//! - Provide defaults for storage key, export name, companion delay and origin.
//! - Apply `TABLON_*` environment overrides.
//!
//! # Invariants
//! - Invalid overrides are ignored (with a warning) and never fail startup.
//! - The mirror window never writes under the primary's storage key.

use crate::model::filter::FilterMode;
use crate::persistence::gateway::STORAGE_KEY;
use crate::persistence::transfer::EXPORT_FILE_NAME;
use crate::sync::companion::{CompanionRole, DEFAULT_SNAPSHOT_DELAY};
use log::warn;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "TABLON_DB_PATH";
pub const ENV_ORIGIN: &str = "TABLON_ORIGIN";
pub const ENV_COMPANION_DELAY_MS: &str = "TABLON_COMPANION_DELAY_MS";
pub const ENV_LOG_LEVEL: &str = "TABLON_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TABLON_LOG_DIR";
pub const ENV_FILTER: &str = "TABLON_FILTER";

const DB_FILE_NAME: &str = "tablon.sqlite3";
const DEFAULT_ORIGIN: &str = "app://tablon";
const SECONDARY_KEY_SUFFIX: &str = "_panel";

/// Effective configuration for one board process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub storage_key: String,
    pub export_file_name: String,
    pub companion_delay: Duration,
    /// Origin this window posts from and accepts companion messages from.
    pub origin: String,
    pub db_path: PathBuf,
    /// Filter used when persisted state carries none (URL fragment).
    pub initial_filter: FilterMode,
    /// `None` keeps the build-mode default.
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            export_file_name: EXPORT_FILE_NAME.to_string(),
            companion_delay: DEFAULT_SNAPSHOT_DELAY,
            origin: DEFAULT_ORIGIN.to_string(),
            db_path: std::env::temp_dir().join(DB_FILE_NAME),
            initial_filter: FilterMode::All,
            log_level: None,
            log_dir: None,
        }
    }
}

impl BoardConfig {
    /// Defaults plus process environment overrides.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults plus overrides read through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let value = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(origin) = value(ENV_ORIGIN) {
            config.origin = origin;
        }
        if let Some(raw) = value(ENV_COMPANION_DELAY_MS) {
            match raw.parse::<u64>() {
                Ok(ms) => config.companion_delay = Duration::from_millis(ms),
                Err(_) => warn!(
                    "event=config_load module=config status=skip key={} reason=not_a_number",
                    ENV_COMPANION_DELAY_MS
                ),
            }
        }
        if let Some(fragment) = value(ENV_FILTER) {
            config.initial_filter = FilterMode::parse_lenient(&fragment);
        }
        config.log_level = value(ENV_LOG_LEVEL);
        config.log_dir = value(ENV_LOG_DIR).map(PathBuf::from);
        config
    }

    /// Configuration for the window playing `role`.
    ///
    /// The secondary keeps its mirrored copy under `<storage_key>_panel`, so
    /// adopting a (filtered) snapshot leaves the primary's state untouched.
    pub fn for_role(&self, role: CompanionRole) -> Self {
        let mut config = self.clone();
        if role == CompanionRole::Secondary {
            config.storage_key = format!("{}{SECONDARY_KEY_SUFFIX}", self.storage_key);
        }
        config
    }
}
