use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// wikivars.toml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Verb families that can be switched off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// `#define`, `#local`, `#preview`
    #[serde(default = "default_enabled")]
    pub define: bool,
    /// `#save`, `#load` and persistence at the end of a render
    #[serde(default = "default_enabled")]
    pub data: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            define: true,
            data: true,
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory of the file-backed store
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// How long writers wait for the store lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// How long readers wait for the store lock
    #[serde(default = "default_read_lock_timeout_ms")]
    pub read_lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            lock_timeout_ms: default_lock_timeout_ms(),
            read_lock_timeout_ms: default_read_lock_timeout_ms(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".wikivars/store")
}

fn default_lock_timeout_ms() -> u64 {
    30_000
}

fn default_read_lock_timeout_ms() -> u64 {
    5_000
}

impl StoreConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn read_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.read_lock_timeout_ms)
    }
}

impl EngineConfig {
    /// wikivars.toml を読み込む
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| crate::error::VarsError::ConfigParseError(e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::VarsError::ConfigParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// wikivars.toml に書き込む
    pub fn to_file(&self, path: impl AsRef<std::path::Path>) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::VarsError::ConfigParseError(e.to_string()))?;

        std::fs::write(path.as_ref(), content).map_err(crate::error::VarsError::IoError)?;

        Ok(())
    }

    /// Reject values the store cannot work with
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.store.lock_timeout_ms == 0 {
            return Err(crate::error::VarsError::ConfigInvalidValue {
                field: "store.lock_timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.store.read_lock_timeout_ms == 0 {
            return Err(crate::error::VarsError::ConfigInvalidValue {
                field: "store.read_lock_timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(crate::error::VarsError::ConfigInvalidValue {
                field: "store.path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert!(config.features.define);
        assert!(config.features.data);
        assert_eq!(config.store.path, PathBuf::from(".wikivars/store"));
        assert_eq!(config.store.lock_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[features]
define = true
data = false

[store]
path = "/var/lib/wikivars"
lock_timeout_ms = 1000
read_lock_timeout_ms = 250
"#;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert!(!config.features.data);
        assert_eq!(config.store.path, PathBuf::from("/var/lib/wikivars"));
        assert_eq!(config.store.read_lock_timeout(), Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config: EngineConfig = toml::from_str("[store]\nlock_timeout_ms = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("CONFIG_INVALID_VALUE"));
    }

    #[test]
    fn test_file_roundtrip() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("wikivars.toml");

        let mut config = EngineConfig::default();
        config.features.define = false;
        config.to_file(&path).unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert!(!loaded.features.define);
        assert!(loaded.features.data);
    }
}
