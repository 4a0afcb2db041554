mod types;

pub use types::*;

use crate::config;
use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Load state from the default path
pub fn load_state() -> Result<ReadState> {
    load_state_from(&config::state_path()?)
}

/// Load state from a file. A missing file is the expected steady state on
/// first run and yields an empty store; a corrupt file is warned about and
/// treated as empty.
pub fn load_state_from(path: &Path) -> Result<ReadState> {
    if !path.exists() {
        return Ok(ReadState::default());
    }

    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content) {
        Ok(state) => Ok(state),
        Err(e) => {
            warn!("State file {} is corrupt, starting empty: {}", path.display(), e);
            Ok(ReadState::default())
        }
    }
}

/// Save state to the default path
pub fn save_state(state: &ReadState) -> Result<()> {
    save_state_to(state, &config::state_path()?)
}

/// Save state atomically: write a temp sibling, then rename over the target
pub fn save_state_to(state: &ReadState, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_roundtrip_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        save_state_to(&ReadState::default(), &path).unwrap();
        let loaded = load_state_from(&path).unwrap();

        assert_eq!(loaded.version, STATE_VERSION);
        assert!(loaded.topics.is_empty());
    }

    #[test]
    fn test_roundtrip_populated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let state = ReadState::default()
            .updated("home", "alerts", 1700000000)
            .updated("work", "builds", 1700000100);
        save_state_to(&state, &path).unwrap();

        let loaded = load_state_from(&path).unwrap();
        assert_eq!(loaded.last_read("home", "alerts"), 1700000000);
        assert_eq!(loaded.last_read("work", "builds"), 1700000100);
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let loaded = load_state_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.topics.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let loaded = load_state_from(&path).unwrap();
        assert!(loaded.topics.is_empty());
    }

    #[test]
    fn test_save_overwrites_atomically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        save_state_to(&ReadState::default().updated("home", "alerts", 1), &path).unwrap();
        save_state_to(&ReadState::default().updated("home", "alerts", 2), &path).unwrap();

        let loaded = load_state_from(&path).unwrap();
        assert_eq!(loaded.last_read("home", "alerts"), 2);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
