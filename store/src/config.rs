use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Top-level store configuration, loaded from concord-store.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    pub replay: ReplaySection,
    /// File the config was read from; `None` when defaults were used.
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReplaySection {
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Pretty-print the final state.
    pub pretty: bool,
    /// JSON file holding the state to start from. Empty state if unset.
    pub initial_state: Option<PathBuf>,
}

impl Default for ReplaySection {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            pretty: false,
            initial_state: None,
        }
    }
}

impl StoreConfig {
    /// Load config from a TOML file. Falls back to defaults if the file doesn't exist.
    /// Environment variables override TOML values.
    ///
    /// Nothing is logged here since this runs before the subscriber exists;
    /// callers report `loaded_from` once logging is up.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let mut config = Self::parse(&contents)
                .with_context(|| format!("failed to parse config file {}", path.display()))?;
            config.loaded_from = Some(path.to_path_buf());
            config
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CONCORD_STORE_LOG") {
            self.replay.log_filter = v;
        }
        if let Ok(v) = std::env::var("CONCORD_STORE_PRETTY")
            && let Ok(pretty) = v.parse()
        {
            self.replay.pretty = pretty;
        }
        if let Ok(v) = std::env::var("CONCORD_STORE_INITIAL_STATE") {
            self.replay.initial_state = Some(PathBuf::from(v));
        }
    }
}
