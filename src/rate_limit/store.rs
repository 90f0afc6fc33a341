use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rate limit file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("rate limit file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Persistence for call timestamps (epoch milliseconds).
///
/// Stores report failures honestly; the limiter decides how to degrade.
pub trait CallStore {
    /// Missing storage is an empty history, not an error.
    fn load(&self) -> Result<Vec<i64>, StoreError>;
    fn save(&mut self, calls: &[i64]) -> Result<(), StoreError>;
}

// On-disk shape: { "calls": [<epoch-ms>, ...] }
#[derive(Debug, Default, Serialize, Deserialize)]
struct CallRecord {
    #[serde(default)]
    calls: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CallStore for FileStore {
    fn load(&self) -> Result<Vec<i64>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no rate limit file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_err(e)),
        };
        let record: CallRecord =
            serde_json::from_str(&text).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(record.calls)
    }

    fn save(&mut self, calls: &[i64]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
        }
        let record = CallRecord {
            calls: calls.to_vec(),
        };
        let payload = serde_json::to_vec(&record).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        // Write next to the target and rename so readers never see a torn file.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, payload).map_err(|e| self.io_err(e))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_err(e));
        }
        Ok(())
    }
}

/// Process-local store, used in tests and when no cache location exists.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    calls: Vec<i64>,
}

impl MemoryStore {
    pub fn with_calls(calls: Vec<i64>) -> Self {
        Self { calls }
    }

    pub fn calls(&self) -> &[i64] {
        &self.calls
    }
}

impl CallStore for MemoryStore {
    fn load(&self) -> Result<Vec<i64>, StoreError> {
        Ok(self.calls.clone())
    }

    fn save(&mut self, calls: &[i64]) -> Result<(), StoreError> {
        self.calls = calls.to_vec();
        Ok(())
    }
}
