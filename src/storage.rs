use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub(crate) const TOKEN_KEY: &str = "@SistemaOS:token";
pub(crate) const USER_KEY: &str = "@SistemaOS:user";

const SESSION_FILE: &str = "session.json";

/// Persistent key/value storage for the login session
pub(crate) trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    /// Drops every key, including any that can no longer be read
    fn reset(&self) -> Result<(), StorageError>;
}

impl<T: Storage + ?Sized> Storage for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn reset(&self) -> Result<(), StorageError> {
        (**self).reset()
    }
}

/// Storage kept in a JSON object in `session.json` inside a state directory.
///
/// The file is read on every access and rewritten on every change, so several
/// processes sharing the directory see each other's logins and logouts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub(crate) fn new(dir: &Path) -> FileStorage {
        FileStorage {
            path: dir.join(SESSION_FILE),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let src = match fs::read_to_string(&self.path) {
            Ok(src) => src,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&src).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let src = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, src).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }

    fn reset(&self) -> Result<(), StorageError> {
        self.save(&BTreeMap::new())
    }
}

/// In-process storage that forgets everything on exit
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct MemoryStorage(RefCell<BTreeMap<String, String>>);

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.0.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.borrow_mut().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.0.borrow_mut().remove(key);
        Ok(())
    }

    fn reset(&self) -> Result<(), StorageError> {
        self.0.borrow_mut().clear();
        Ok(())
    }
}

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("failed to read session file {}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write session file {}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("session file {} is not valid JSON", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(&dir.path().join("nested"));
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        storage.set(TOKEN_KEY, "abc.def.ghi").unwrap();
        storage.set(USER_KEY, r#"{"id":1}"#).unwrap();
        let reopened = FileStorage::new(&dir.path().join("nested"));
        assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("abc.def.ghi"));
        reopened.remove(TOKEN_KEY).unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap().as_deref(), Some(r#"{"id":1}"#));
    }

    #[test]
    fn test_remove_missing_key_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.remove(TOKEN_KEY).unwrap();
        assert!(!dir.path().join(SESSION_FILE).exists());
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SESSION_FILE), "not json").unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.get(TOKEN_KEY),
            Err(StorageError::Corrupt { .. })
        ));
        storage.reset().unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        storage.set(TOKEN_KEY, "fresh").unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::default();
        storage.set(USER_KEY, "{}").unwrap();
        assert_eq!(storage.get(USER_KEY).unwrap().as_deref(), Some("{}"));
        storage.remove(USER_KEY).unwrap();
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }
}
