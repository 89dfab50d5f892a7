// src/config.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::PathBuf};

use crate::error::IngestError;

pub const CONFIG_FILE_VAR: &str = "TICKETLOAD_CONFIG";
pub const SOURCE_DIR_VAR: &str = "TICKETLOAD_SOURCE_DIR";
pub const STORE_URI_VAR: &str = "TICKETLOAD_STORE_URI";
pub const DATABASE_VAR: &str = "TICKETLOAD_DATABASE";
pub const COLLECTION_VAR: &str = "TICKETLOAD_COLLECTION";

/// Where to read the corpus from and where to put the tickets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the snapshot CSV files.
    pub source_dir: PathBuf,
    /// Root directory of the Parquet store.
    pub store_uri: PathBuf,
    pub database: String,
    pub collection: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("ticketCorpus"),
            store_uri: PathBuf::from("store"),
            database: "ticketing_analytics".to_string(),
            collection: "tickets".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then the YAML file named by `TICKETLOAD_CONFIG` (if set),
    /// then the individual `TICKETLOAD_*` variables.
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var(CONFIG_FILE_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(&path)?,
            _ => Self::default(),
        };
        cfg.apply_overrides(|key| env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config file {}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config file {}", path))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // an empty document deserializes to unit, not a map
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Overlay values produced by `lookup`; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(SOURCE_DIR_VAR) {
            self.source_dir = PathBuf::from(v);
        }
        if let Some(v) = get(STORE_URI_VAR) {
            self.store_uri = PathBuf::from(v);
        }
        if let Some(v) = get(DATABASE_VAR) {
            self.database = v;
        }
        if let Some(v) = get(COLLECTION_VAR) {
            self.collection = v;
        }
    }

    /// Database and collection become directory names, so they must be single path segments.
    pub fn validate(&self) -> Result<(), IngestError> {
        for (what, name) in [("database", &self.database), ("collection", &self.collection)] {
            if name.trim().is_empty() {
                return Err(IngestError::Config(format!("{} name is empty", what)));
            }
            if name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(IngestError::Config(format!(
                    "{} name {:?} is not a single path segment",
                    what, name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_migration_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.source_dir, PathBuf::from("ticketCorpus"));
        assert_eq!(cfg.database, "ticketing_analytics");
        assert_eq!(cfg.collection, "tickets");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn yaml_fills_only_given_fields() {
        let cfg = Config::from_yaml_str("source_dir: /data/corpus\ncollection: snapshots\n").unwrap();
        assert_eq!(cfg.source_dir, PathBuf::from("/data/corpus"));
        assert_eq!(cfg.collection, "snapshots");
        assert_eq!(cfg.database, "ticketing_analytics");

        assert_eq!(Config::from_yaml_str("  \n").unwrap(), Config::default());
    }

    #[test]
    fn env_overrides_win_and_blanks_are_ignored() {
        let vars: HashMap<&str, &str> = [
            (STORE_URI_VAR, "/var/lib/tickets"),
            (DATABASE_VAR, "  "),
            (COLLECTION_VAR, "tickets_v2"),
        ]
        .into_iter()
        .collect();

        let mut cfg = Config::default();
        cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.store_uri, PathBuf::from("/var/lib/tickets"));
        assert_eq!(cfg.database, "ticketing_analytics");
        assert_eq!(cfg.collection, "tickets_v2");
    }

    #[test]
    fn rejects_names_that_escape_the_store() {
        let mut cfg = Config::default();
        cfg.collection = "../etc".into();
        assert!(matches!(cfg.validate(), Err(IngestError::Config(_))));

        cfg.collection = "tickets".into();
        cfg.database = String::new();
        assert!(matches!(cfg.validate(), Err(IngestError::Config(_))));
    }
}
