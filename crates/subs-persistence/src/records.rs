//! Single-file JSON record backend.
//!
//! Stands in for a keyed-record database: the whole record set lives in one
//! JSON document that is rewritten atomically after every mutation.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{PersistenceError, Result};
use crate::io::write_atomic;

/// A JSON document of type `T` stored at an optional path.
///
/// With no path the backend is memory-only: loads yield `T::default()` and
/// saves are no-ops.
#[derive(Debug, Clone)]
pub struct RecordFile<T> {
    path: Option<PathBuf>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RecordFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            _marker: PhantomData,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the document; a missing file yields the default value.
    pub fn load(&self) -> Result<T> {
        let Some(path) = &self.path else {
            return Ok(T::default());
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => {
                return Err(PersistenceError::Io {
                    operation: "read",
                    path: path.clone(),
                    source: e,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| PersistenceError::Records {
            path: path.clone(),
            source,
        })
    }

    pub fn save(&self, value: &T) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes =
            serde_json::to_vec_pretty(value).map_err(|e| PersistenceError::Serialization {
                source: Box::new(e),
            })?;
        write_atomic(path, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempdir().unwrap();
        let file: RecordFile<Vec<u32>> = RecordFile::at(dir.path().join("absent.json"));
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let file: RecordFile<Vec<u32>> = RecordFile::at(dir.path().join("n.json"));
        file.save(&vec![3, 1, 2]).unwrap();
        assert_eq!(file.load().unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_in_memory_is_inert() {
        let file: RecordFile<Vec<u32>> = RecordFile::in_memory();
        file.save(&vec![1]).unwrap();
        assert!(file.load().unwrap().is_empty());
        assert!(file.path().is_none());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"{").unwrap();
        let file: RecordFile<Vec<u32>> = RecordFile::at(&path);
        assert!(matches!(file.load(), Err(PersistenceError::Records { .. })));
    }
}
