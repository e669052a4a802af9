//! Persistence of named configuration values.

use std::collections::BTreeMap;
use std::fs;
use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use crate::setting::MessageSetting;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path:?} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Keyed storage for configuration values.
pub trait SettingsStore {
    /// Reads the value stored under `name`, if any.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    fn load(&self, name: &str) -> Result<Option<MessageSetting>, StoreError>;

    /// Writes the value under `name`, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn save(&mut self, name: &str, setting: &MessageSetting) -> Result<(), StoreError>;
}

/// Store that keeps values in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// 保存済みの値
    entries: BTreeMap<String, MessageSetting>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self, name: &str) -> Result<Option<MessageSetting>, StoreError> {
        Ok(self.entries.get(name).cloned())
    }

    fn save(&mut self, name: &str, setting: &MessageSetting) -> Result<(), StoreError> {
        self.entries.insert(name.to_string(), setting.clone());
        Ok(())
    }
}

/// Store backed by a single JSON document mapping names to values.
///
/// ```json
/// { "plugin_redmine_message_customize": { "enabled": "true", "custom_messages": {} } }
/// ```
///
/// Entries written by other tools are preserved on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// 設定ファイルのパス
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// I/O エラーをこのファイルのエラーに変換する
    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }

    /// JSON エラーをこのファイルのエラーに変換する
    fn json_error(&self, source: serde_json::Error) -> StoreError {
        StoreError::Json { path: self.path.clone(), source }
    }

    /// Reads the whole document. A missing file reads as empty.
    fn read_document(&self) -> Result<serde_json::Map<String, serde_json::Value>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(serde_json::Map::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        serde_json::from_str(&content).map_err(|e| self.json_error(e))
    }

    /// Replaces the file through a sibling temporary file.
    fn write_document(
        &self,
        document: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let content = serde_json::to_string_pretty(document).map_err(|e| self.json_error(e))?;
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, content).map_err(|e| self.io_error(e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self, name: &str) -> Result<Option<MessageSetting>, StoreError> {
        let mut document = self.read_document()?;
        document
            .remove(name)
            .map(|value| serde_json::from_value(value).map_err(|e| self.json_error(e)))
            .transpose()
    }

    fn save(&mut self, name: &str, setting: &MessageSetting) -> Result<(), StoreError> {
        let mut document = self.read_document()?;
        let value = serde_json::to_value(setting).map_err(|e| self.json_error(e))?;
        document.insert(name.to_string(), value);
        self.write_document(&document)?;
        tracing::debug!(path = %self.path.display(), name, "Saved setting");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::setting::CustomMessages;
    use crate::test_utils::{
        map,
        node,
        text,
    };

    const NAME: &str = "plugin_redmine_message_customize";

    fn sample_setting() -> MessageSetting {
        MessageSetting {
            enabled: false,
            custom_messages: CustomMessages::Tree(map([("en", node([("label", text("L"))]))])),
        }
    }

    #[googletest::test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();

        expect_that!(store.load(NAME), ok(none()));
        store.save(NAME, &sample_setting()).unwrap();

        expect_that!(store.load(NAME), ok(some(eq(&sample_setting()))));
    }

    #[googletest::test]
    fn file_store_missing_file_reads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("settings.json"));

        expect_that!(store.load(NAME), ok(none()));
    }

    #[googletest::test]
    fn file_store_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/settings.json");
        let mut store = JsonFileStore::new(&path);

        store.save(NAME, &sample_setting()).unwrap();

        expect_that!(path.exists(), eq(true));
        expect_that!(JsonFileStore::new(&path).load(NAME), ok(some(eq(&sample_setting()))));
    }

    #[googletest::test]
    fn file_store_keeps_other_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{"other_plugin": {"anything": 1}}"#).unwrap();
        let mut store = JsonFileStore::new(&path);

        store.save(NAME, &sample_setting()).unwrap();

        let document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        expect_that!(document["other_plugin"], eq(&json!({ "anything": 1 })));
        expect_that!(document[NAME]["enabled"], eq(&json!("false")));
    }

    #[googletest::test]
    fn file_store_reports_broken_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let result = JsonFileStore::new(&path).load(NAME);

        expect_that!(result, err(displays_as(contains_substring("is not valid JSON"))));
    }

    #[googletest::test]
    fn file_store_leaves_no_temporary_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        JsonFileStore::new(&path).save(NAME, &MessageSetting::default()).unwrap();

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        expect_that!(names, elements_are![eq("settings.json")]);
    }
}
