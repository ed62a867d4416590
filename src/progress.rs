//! Persisted record of tracks that have been fully downloaded and tagged.
//!
//! Stored as a JSON array of track URIs. The whole list is rewritten after
//! every completed track, so an interrupted run loses at most the track that
//! was in flight.

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    completed: Vec<String>,
}

impl ProgressStore {
    /// Loads the store at `path`, creating an empty one if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            debug!("Creating empty progress file at {}", path.display());
            fs::write(&path, "[]")?;
        }

        let content = fs::read_to_string(&path)?;
        let loaded: Vec<String> = serde_json::from_str(&content)?;

        let mut completed = Vec::with_capacity(loaded.len());
        for uri in loaded {
            if !completed.contains(&uri) {
                completed.push(uri);
            }
        }

        Ok(Self { path, completed })
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.completed.iter().any(|done| done == uri)
    }

    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    /// Marks `uri` as done and rewrites the file with the full list.
    pub fn record_completion(&mut self, uri: &str) -> Result<()> {
        if !self.contains(uri) {
            self.completed.push(uri.to_string());
        }
        fs::write(&self.path, serde_json::to_string(&self.completed)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracks.json");

        let store = ProgressStore::load(&path).unwrap();

        assert!(store.completed().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn completion_rewrites_full_list_including_earlier_runs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracks.json");
        fs::write(&path, r#"["spotify:track:1"]"#).unwrap();

        let mut store = ProgressStore::load(&path).unwrap();
        store.record_completion("spotify:track:2").unwrap();
        store.record_completion("spotify:track:2").unwrap();

        let persisted: Vec<String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(persisted, vec!["spotify:track:1", "spotify:track:2"]);
    }

    #[test]
    fn duplicate_entries_on_disk_collapse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracks.json");
        fs::write(&path, r#"["A", "A"]"#).unwrap();

        let store = ProgressStore::load(&path).unwrap();

        assert_eq!(store.completed(), ["A".to_string()]);
        assert!(store.contains("A"));
        assert!(!store.contains("B"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracks.json");
        fs::write(&path, "{not json").unwrap();

        assert!(ProgressStore::load(&path).is_err());
    }
}
