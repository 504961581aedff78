use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::engine::DEFAULT_COMPACT_THRESHOLD;
use crate::json_store::JsonPersistence;
use crate::persistence::{PersistError, Persistence, WalPersistence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageKind {
    /// Append-only binary event log
    Wal,
    /// Single JSON document with the four collections
    Json,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wal" => Ok(StorageKind::Wal),
            "json" => Ok(StorageKind::Json),
            other => Err(format!("unknown storage kind {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub storage: StorageKind,
    pub compact_threshold: u64,
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            storage: StorageKind::Wal,
            compact_threshold: DEFAULT_COMPACT_THRESHOLD,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Read `ROOMBOOK_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or unparsable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let storage = match lookup("ROOMBOOK_STORAGE") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("ROOMBOOK_STORAGE: {e}, using wal");
                defaults.storage
            }),
            None => defaults.storage,
        };
        Self {
            data_dir: lookup("ROOMBOOK_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            storage,
            compact_threshold: lookup("ROOMBOOK_COMPACT_THRESHOLD")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.compact_threshold),
            metrics_port: lookup("ROOMBOOK_METRICS_PORT").and_then(|s| s.parse().ok()),
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        match self.storage {
            StorageKind::Wal => self.data_dir.join("roombook.wal"),
            StorageKind::Json => self.data_dir.join("roombook.json"),
        }
    }

    /// Create the data directory if needed and open the configured backend.
    pub fn open_persistence(&self) -> Result<Box<dyn Persistence>, PersistError> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.storage_path();
        let persistence: Box<dyn Persistence> = match self.storage {
            StorageKind::Wal => Box::new(WalPersistence::open(&path)?),
            StorageKind::Json => Box::new(JsonPersistence::open(&path)),
        };
        Ok(persistence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            ("ROOMBOOK_DATA_DIR", "/var/lib/roombook"),
            ("ROOMBOOK_STORAGE", "JSON"),
            ("ROOMBOOK_COMPACT_THRESHOLD", "50"),
            ("ROOMBOOK_METRICS_PORT", "9100"),
        ]);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/roombook"));
        assert_eq!(config.storage, StorageKind::Json);
        assert_eq!(config.compact_threshold, 50);
        assert_eq!(config.metrics_port, Some(9100));
        assert_eq!(config.storage_path(), PathBuf::from("/var/lib/roombook/roombook.json"));
    }

    #[test]
    fn bad_values_fall_back() {
        let config = config_from(&[
            ("ROOMBOOK_STORAGE", "sqlite"),
            ("ROOMBOOK_COMPACT_THRESHOLD", "lots"),
            ("ROOMBOOK_METRICS_PORT", "99999"),
        ]);
        assert_eq!(config.storage, StorageKind::Wal);
        assert_eq!(config.compact_threshold, DEFAULT_COMPACT_THRESHOLD);
        assert_eq!(config.metrics_port, None);
    }
}
