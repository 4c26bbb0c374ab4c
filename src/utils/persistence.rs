//! Files under ~/.sonic-flap/: high score, config, log.
//!
//! Nothing in here is allowed to take the game down. Read failures fall back to
//! defaults and write failures are logged and skipped.

use crate::core::constants::DATA_DIR_NAME;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Get the ~/.sonic-flap/ directory path, creating it if needed.
pub fn data_dir() -> io::Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "Could not determine home directory",
        )
    })?;
    let dir = home_dir.join(DATA_DIR_NAME);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Load a JSON file, returning `T::default()` if missing or invalid.
pub fn load_json_or_default<T: Default + serde::de::DeserializeOwned>(path: &Path) -> T {
    match fs::read_to_string(path) {
        Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring invalid JSON file");
            T::default()
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => T::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read file");
            T::default()
        }
    }
}

/// Persisted best score.
pub trait ScoreStore {
    /// The stored high score, or 0 if there is none or it can't be read.
    fn load(&mut self) -> u32;

    /// Overwrite the stored high score. Failures are logged, not returned.
    fn save(&mut self, score: u32);
}

/// High score kept as a single base-10 integer in a text file.
#[derive(Debug, Clone)]
pub struct HighScoreFile {
    path: PathBuf,
}

impl HighScoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as 0.
    pub fn read(&self) -> io::Result<u32> {
        match fs::read_to_string(&self.path) {
            Ok(text) => text
                .trim()
                .parse::<u32>()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e),
        }
    }

    pub fn write(&self, score: u32) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, score.to_string())
    }
}

impl ScoreStore for HighScoreFile {
    fn load(&mut self) -> u32 {
        self.read().unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "treating high score as 0");
            0
        })
    }

    fn save(&mut self, score: u32) {
        match self.write(score) {
            Ok(()) => tracing::info!(score, path = %self.path.display(), "saved new high score"),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not save high score")
            }
        }
    }
}

/// In-memory store, for runs that shouldn't touch the disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    pub best: u32,
    /// Number of times `save` was called.
    pub saves: u32,
}

impl ScoreStore for MemoryScoreStore {
    fn load(&mut self) -> u32 {
        self.best
    }

    fn save(&mut self, score: u32) {
        self.best = score;
        self.saves += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn test_missing_high_score_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HighScoreFile::new(dir.path().join("high_score.txt"));
        assert_eq!(store.read().unwrap(), 0);
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_write_overwrites_instead_of_appending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("high_score.txt");
        let store = HighScoreFile::new(&path);
        store.write(12).unwrap();
        store.write(7).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "7");
        assert_eq!(store.read().unwrap(), 7);
    }

    #[test]
    fn test_reads_value_with_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("high_score.txt");
        fs::write(&path, "31\n").unwrap();
        assert_eq!(HighScoreFile::new(&path).read().unwrap(), 31);
    }

    #[test]
    fn test_corrupt_file_degrades_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("high_score.txt");
        fs::write(&path, "not a number").unwrap();
        let mut store = HighScoreFile::new(&path);
        assert!(store.read().is_err());
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be
        let path = dir.path().join("high_score.txt");
        fs::create_dir(&path).unwrap();
        let mut store = HighScoreFile::new(&path);
        store.save(5);
        assert_eq!(store.load(), 0);
    }

    #[test]
    fn test_write_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("high_score.txt");
        HighScoreFile::new(&path).write(3).unwrap();
        assert_eq!(HighScoreFile::new(&path).read().unwrap(), 3);
    }

    #[test]
    fn test_load_json_or_default_handles_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let missing: Sample = load_json_or_default(&dir.path().join("missing.json"));
        assert_eq!(missing, Sample::default());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ nope").unwrap();
        let invalid: Sample = load_json_or_default(&bad);
        assert_eq!(invalid, Sample::default());

        let good = dir.path().join("good.json");
        fs::write(&good, r#"{ "value": 9 }"#).unwrap();
        let loaded: Sample = load_json_or_default(&good);
        assert_eq!(loaded.value, 9);
    }
}
