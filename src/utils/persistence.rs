//! JSON files in the client data directory (~/.pixmon/).

use crate::game::constants::DATA_DIR_NAME;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A directory of small JSON documents.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Opens ~/.pixmon/, creating it if needed.
    pub fn open_default() -> io::Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine home directory",
            )
        })?;
        Self::at(home_dir.join(DATA_DIR_NAME))
    }

    pub fn at(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// A unique directory under the system temp dir.
    #[cfg(test)]
    pub(crate) fn new_for_test() -> io::Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

        let test_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "pixmon-test-{}-{}",
            std::process::id(),
            test_id
        ));
        Self::at(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// `Ok(None)` when the file does not exist; invalid JSON is an error.
    pub fn load_json<T: DeserializeOwned>(&self, filename: &str) -> io::Result<Option<T>> {
        let json = match fs::read_to_string(self.path(filename)) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Returns `T::default()` if the file is missing or invalid.
    pub fn load_json_or_default<T: Default + DeserializeOwned>(&self, filename: &str) -> T {
        self.load_json(filename).ok().flatten().unwrap_or_default()
    }

    pub fn save_json<T: Serialize>(&self, filename: &str, data: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.path(filename), json)
    }

    /// Removing a file that does not exist is not an error.
    pub fn remove(&self, filename: &str) -> io::Result<()> {
        match fs::remove_file(self.path(filename)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
