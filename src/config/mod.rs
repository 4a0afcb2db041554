mod types;

pub use types::*;

use crate::error::{PlingError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Get the XDG-compliant config directory
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "pling")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| PlingError::Config("Could not determine config directory".to_string()))
}

/// Get the XDG-compliant data directory
pub fn data_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "pling")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| PlingError::Config("Could not determine data directory".to_string()))
}

/// Get the config file path, honoring an override from the command line
pub fn config_path(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(p) => Ok(p.to_path_buf()),
        None => Ok(config_dir()?.join("config.toml")),
    }
}

/// Get the state file path
pub fn state_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("state.json"))
}

/// Load config from file
pub fn load_config(override_path: Option<&Path>) -> Result<Config> {
    let path = config_path(override_path)?;
    if !path.exists() {
        return Err(PlingError::ConfigNotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Save config to file
pub fn save_config(config: &Config, override_path: Option<&Path>) -> Result<()> {
    let path = config_path(override_path)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(&path, content)?;
    Ok(())
}

/// Execute a secret command and return its trimmed stdout
pub fn run_secret_command(command: &str) -> Result<String> {
    let output = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", command]).output()
    } else {
        Command::new("sh").args(["-c", command]).output()
    };

    match output {
        Ok(output) => {
            if output.status.success() {
                let secret = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if secret.is_empty() {
                    Err(PlingError::SecretCommand(
                        "Secret command returned empty output".to_string(),
                    ))
                } else {
                    Ok(secret)
                }
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(PlingError::SecretCommand(format!(
                    "Secret command failed: {}",
                    stderr.trim()
                )))
            }
        }
        Err(e) => Err(PlingError::SecretCommand(format!(
            "Failed to execute secret command: {}",
            e
        ))),
    }
}

/// Redact sensitive information from config for display
pub fn redact_config(config: &Config) -> Config {
    let mut redacted = config.clone();
    for profile in &mut redacted.profiles {
        if profile.password_command.is_some() {
            profile.password_command = Some("[REDACTED]".to_string());
        }
        if profile.token_command.is_some() {
            profile.token_command = Some("[REDACTED]".to_string());
        }
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        let mut profile = ServerProfile::new("home", "https://push.example.com");
        profile.topics = vec!["alerts".to_string(), "builds".to_string()];
        profile
            .groups
            .insert("ci".to_string(), vec!["builds".to_string()]);
        config.profiles.push(profile);
        config.default_profile = Some("home".to_string());

        save_config(&config, Some(&path)).unwrap();
        let loaded = load_config(Some(&path)).unwrap();

        assert_eq!(loaded.default_profile.as_deref(), Some("home"));
        assert_eq!(loaded.profiles.len(), 1);
        assert_eq!(loaded.profiles[0].topics, vec!["alerts", "builds"]);
        assert_eq!(loaded.profiles[0].groups["ci"], vec!["builds"]);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(
            load_config(Some(&path)),
            Err(PlingError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn test_redaction() {
        let mut config = Config::default();
        let mut profile = ServerProfile::new("home", "https://push.example.com");
        profile.username = Some("me".to_string());
        profile.password_command = Some("pass show push".to_string());
        config.profiles.push(profile);

        let redacted = redact_config(&config);
        assert_eq!(
            redacted.profiles[0].password_command.as_deref(),
            Some("[REDACTED]")
        );
        // Original untouched
        assert_eq!(
            config.profiles[0].password_command.as_deref(),
            Some("pass show push")
        );
    }
}
