//! Global context for CLI commands

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use wikivars_core::config::EngineConfig;
use wikivars_core::gateway::JsonStore;

const DEFAULT_CONFIG_FILE: &str = "wikivars.toml";

/// Resolved configuration and the store it points at
pub struct Context {
    pub config: EngineConfig,
    pub store: JsonStore,
    pub verbose: bool,
}

impl Context {
    /// Load the configuration and open the store
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An explicitly given config file is missing
    /// - The config file cannot be parsed or holds invalid values
    pub fn new(config: Option<&Path>, store: Option<&Path>, verbose: bool) -> Result<Self> {
        let mut config = match config {
            Some(path) => EngineConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    EngineConfig::from_file(&default)
                        .with_context(|| format!("Failed to load config {}", default.display()))?
                } else {
                    EngineConfig::default()
                }
            }
        };

        if let Some(store) = store {
            config.store.path = store.to_path_buf();
        }
        log::debug!("using store at {}", config.store.path.display());

        let store = JsonStore::from_config(&config.store);
        Ok(Self {
            config,
            store,
            verbose,
        })
    }
}
