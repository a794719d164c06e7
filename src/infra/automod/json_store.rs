// JSON-backed implementation of AutoModStore.
//
// Everything lives in one flat document with per-category maps keyed by
// guild id, mirroring the data file layout the bot has always used:
//
//   { "auto_mod": {guild: config}, "bad_words": {guild: [..]},
//     "mod_logs": {guild: [..]} }
//
// Writes are whole-document: serialize to a temp file, then rename over
// the real one so a crash mid-write never leaves a torn document.
// Concurrent writers race at document granularity (last write wins),
// which is acceptable for this data.

use crate::core::automod::{AutoModConfig, AutoModError, AutoModStore, ModLogEntry};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

#[derive(Debug, Serialize, Deserialize, Default)]
struct AutoModDocument {
    #[serde(default)]
    auto_mod: HashMap<u64, AutoModConfig>,
    #[serde(default)]
    bad_words: HashMap<u64, Vec<String>>,
    #[serde(default)]
    mod_logs: HashMap<u64, Vec<ModLogEntry>>,
}

pub struct JsonAutoModStore {
    path: PathBuf,
    cache: RwLock<AutoModDocument>,
}

impl JsonAutoModStore {
    /// Open (or create) the store at `path`.
    ///
    /// A malformed existing document is replaced with a default empty one
    /// and rewritten immediately; startup never fails over bad data.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = if path.exists() {
            let file = File::open(&path).expect("Failed to open automod data file");
            let reader = BufReader::new(file);
            match serde_json::from_reader(reader) {
                Ok(doc) => doc,
                Err(err) => {
                    tracing::warn!("Malformed automod data file, starting fresh: {}", err);
                    let doc = AutoModDocument::default();
                    if let Err(err) = Self::write_document(&path, &doc) {
                        tracing::warn!("Failed to rewrite automod data file: {}", err);
                    }
                    doc
                }
            }
        } else {
            AutoModDocument::default()
        };

        Self {
            path,
            cache: RwLock::new(cache),
        }
    }

    fn write_document(path: &PathBuf, doc: &AutoModDocument) -> std::io::Result<()> {
        let tmp = path.with_extension("tmp");
        let file = File::create(&tmp)?;
        serde_json::to_writer_pretty(file, doc)?;
        std::fs::rename(&tmp, path)
    }

    async fn persist(&self) -> Result<(), AutoModError> {
        let cache = self.cache.read().await;
        Self::write_document(&self.path, &cache)
            .map_err(|e| AutoModError::Storage(e.to_string()))
    }
}

#[async_trait]
impl AutoModStore for JsonAutoModStore {
    async fn get_config(&self, guild_id: u64) -> Result<AutoModConfig, AutoModError> {
        let cache = self.cache.read().await;
        Ok(cache.auto_mod.get(&guild_id).cloned().unwrap_or_default())
    }

    async fn save_config(&self, guild_id: u64, config: AutoModConfig) -> Result<(), AutoModError> {
        let mut cache = self.cache.write().await;
        cache.auto_mod.insert(guild_id, config);
        drop(cache); // Release lock before persisting
        self.persist().await
    }

    async fn get_bad_words(&self, guild_id: u64) -> Result<Vec<String>, AutoModError> {
        let cache = self.cache.read().await;
        Ok(cache.bad_words.get(&guild_id).cloned().unwrap_or_default())
    }

    async fn save_bad_words(&self, guild_id: u64, words: Vec<String>) -> Result<(), AutoModError> {
        let mut cache = self.cache.write().await;
        cache.bad_words.insert(guild_id, words);
        drop(cache);
        self.persist().await
    }

    async fn get_mod_log(&self, guild_id: u64) -> Result<Vec<ModLogEntry>, AutoModError> {
        let cache = self.cache.read().await;
        Ok(cache.mod_logs.get(&guild_id).cloned().unwrap_or_default())
    }

    async fn save_mod_log(
        &self,
        guild_id: u64,
        entries: Vec<ModLogEntry>,
    ) -> Result<(), AutoModError> {
        let mut cache = self.cache.write().await;
        cache.mod_logs.insert(guild_id, entries);
        drop(cache);
        self.persist().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::automod::ViolationKind;
    use chrono::Utc;
    use tempfile::NamedTempFile;

    fn temp_path() -> PathBuf {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);
        path
    }

    #[tokio::test]
    async fn config_round_trips_through_the_file() {
        let path = temp_path();

        let store = JsonAutoModStore::new(path.clone());
        let mut config = AutoModConfig::default();
        config.spam_limit = 7;
        config.anti_links = true;
        config.allowed_domains.push("example.com".to_string());
        store.save_config(42, config).await.unwrap();

        // Reload from file
        let store2 = JsonAutoModStore::new(path);
        let loaded = store2.get_config(42).await.unwrap();
        assert_eq!(loaded.spam_limit, 7);
        assert!(loaded.anti_links);
        assert_eq!(loaded.allowed_domains, vec!["example.com".to_string()]);

        // Unknown guild falls back to defaults
        let missing = store2.get_config(99).await.unwrap();
        assert_eq!(missing.spam_limit, 5);
    }

    #[tokio::test]
    async fn bad_words_and_logs_round_trip() {
        let path = temp_path();

        let store = JsonAutoModStore::new(path.clone());
        store
            .save_bad_words(42, vec!["test".to_string()])
            .await
            .unwrap();
        store
            .save_mod_log(
                42,
                vec![ModLogEntry {
                    user_id: 1,
                    user_name: "offender".to_string(),
                    timestamp: Utc::now(),
                    violations: vec![ViolationKind::BadWord],
                    message_excerpt: "a test message".to_string(),
                    warning_count: 1,
                }],
            )
            .await
            .unwrap();

        let store2 = JsonAutoModStore::new(path);
        assert_eq!(
            store2.get_bad_words(42).await.unwrap(),
            vec!["test".to_string()]
        );
        let log = store2.get_mod_log(42).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].violations, vec![ViolationKind::BadWord]);
    }

    #[tokio::test]
    async fn malformed_document_is_replaced_with_defaults() {
        let path = temp_path();
        std::fs::write(&path, "{ not valid json !!").unwrap();

        let store = JsonAutoModStore::new(path.clone());
        let config = store.get_config(42).await.unwrap();
        assert!(config.enabled);

        // The broken file was rewritten as a valid empty document.
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed.get("auto_mod").is_some());
    }
}
