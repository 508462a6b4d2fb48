//! Best-effort local key/value storage.
//!
//! Values are serialized as JSON, one file per key, inside a storage
//! directory. Every public operation swallows its failure: the error is
//! logged and the call degrades to `false` / `None`. Callers that need the
//! underlying error use the `try_*` variants.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::error::{FinloanError, Result};

const EXTENSION: &str = "json";

/// JSON-file backed key/value store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the stored values.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `value` under `key`. Returns whether the value was written.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match self.try_save(key, value) {
            Ok(()) => true,
            Err(e) => {
                error!(key, error = %e, "Error saving to local storage");
                false
            }
        }
    }

    /// Load the value stored under `key`. Missing keys and unreadable values
    /// both yield `None`; only the latter is logged as an error.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_load(key) {
            Ok(value) => value,
            Err(e) => {
                error!(key, error = %e, "Error reading from local storage");
                None
            }
        }
    }

    /// Remove the value stored under `key`. Returns whether a value was removed.
    pub fn remove(&self, key: &str) -> bool {
        let path = match self.path_for(key) {
            Ok(path) => path,
            Err(e) => {
                error!(key, error = %e, "Error removing from local storage");
                return false;
            }
        };
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                error!(key, path = %path.display(), error = %e, "Error removing from local storage");
                false
            }
        }
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.dir.display(), error = %e, "storage directory not readable");
                return Vec::new();
            }
        };

        let mut keys: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .filter(|key| validate_key(key).is_ok())
            .collect();
        keys.sort();
        keys
    }

    /// Save `value` under `key`, returning the failure instead of logging it.
    pub fn try_save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.path_for(key)?;
        let json = serde_json::to_string_pretty(value).map_err(|e| FinloanError::json(key, e))?;

        fs::create_dir_all(&self.dir).map_err(|e| FinloanError::DirectoryCreation {
            path: self.dir.clone(),
            source: e,
        })?;

        // Write-then-rename so a crash never leaves a truncated value behind.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| FinloanError::io("writing", &tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| FinloanError::io("renaming", &path, e))?;

        debug!(key, path = %path.display(), "saved to local storage");
        Ok(())
    }

    /// Load the value under `key`. `Ok(None)` when nothing is stored.
    pub fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path_for(key)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FinloanError::io("reading", &path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| FinloanError::json(key, e))
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(FinloanError::InvalidKey {
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Draft {
        name: String,
        amount: u32,
    }

    fn draft() -> Draft {
        Draft {
            name: "Asha".into(),
            amount: 150,
        }
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path().join("store"));

        assert!(storage.save("draft", &draft()));
        assert_eq!(storage.load::<Draft>("draft"), Some(draft()));
    }

    #[test]
    fn test_load_missing_key_is_none() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());

        assert_eq!(storage.load::<Draft>("nothing-here"), None);
        assert!(storage.try_load::<Draft>("nothing-here").unwrap().is_none());
    }

    #[test]
    fn test_invalid_keys_are_rejected() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());

        assert!(!storage.save("../escape", &draft()));
        assert!(!storage.save("", &draft()));
        assert!(!storage.save(".hidden", &draft()));
        assert!(matches!(
            storage.try_save("a/b", &draft()),
            Err(FinloanError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_corrupt_value_degrades_to_none() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());
        fs::write(temp.path().join("broken.json"), "{not json").unwrap();

        assert_eq!(storage.load::<Draft>("broken"), None);
        assert!(matches!(
            storage.try_load::<Draft>("broken"),
            Err(FinloanError::Json { .. })
        ));
    }

    #[test]
    fn test_wrong_shape_degrades_to_none() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());
        assert!(storage.save("draft", &vec![1, 2, 3]));

        assert_eq!(storage.load::<Draft>("draft"), None);
    }

    #[test]
    fn test_save_overwrites() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());

        assert!(storage.save("draft", &draft()));
        let updated = Draft {
            name: "Asha".into(),
            amount: 300,
        };
        assert!(storage.save("draft", &updated));
        assert_eq!(storage.load::<Draft>("draft"), Some(updated));
    }

    #[test]
    fn test_keys_and_remove() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());
        assert!(storage.keys().is_empty());

        assert!(storage.save("b-draft", &draft()));
        assert!(storage.save("a-draft", &draft()));
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(storage.keys(), vec!["a-draft", "b-draft"]);

        assert!(storage.remove("a-draft"));
        assert!(!storage.remove("a-draft"));
        assert_eq!(storage.keys(), vec!["b-draft"]);
    }

    #[test]
    fn test_unwritable_directory_returns_false() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let storage = LocalStorage::new(blocker.join("store"));

        assert!(!storage.save("draft", &draft()));
    }
}
