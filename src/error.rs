use std::process::ExitCode;
use thiserror::Error;

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Success = 0,
    GeneralError = 1,
    PartialFailure = 2,
    AllTopicsFailed = 3,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

#[derive(Error, Debug)]
pub enum PlingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found at {0}")]
    ConfigNotFound(String),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("State error: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Profile already exists: {0}")]
    ProfileExists(String),

    #[error("No profiles configured; run 'pling profiles add' first")]
    NoProfiles,

    #[error("Topic not watched: {0}")]
    TopicNotFound(String),

    #[error("Topic already watched: {0}")]
    TopicExists(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("No topics to watch for profile '{0}'")]
    NoTopics(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid since value '{0}' (expected 'all', a Unix timestamp, or a duration like 30s, 10m, 2h, 1d)")]
    InvalidSince(String),

    #[error("Secret command failed: {0}")]
    SecretCommand(String),
}

impl PlingError {
    /// Convert error to appropriate exit status
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            PlingError::Config(_)
            | PlingError::ConfigNotFound(_)
            | PlingError::ConfigInvalid(_)
            | PlingError::State(_)
            | PlingError::Io(_)
            | PlingError::TomlParse(_)
            | PlingError::TomlSerialize(_)
            | PlingError::Json(_)
            | PlingError::Http(_)
            | PlingError::Api { .. }
            | PlingError::ProfileNotFound(_)
            | PlingError::ProfileExists(_)
            | PlingError::NoProfiles
            | PlingError::TopicNotFound(_)
            | PlingError::TopicExists(_)
            | PlingError::GroupNotFound(_)
            | PlingError::NoTopics(_)
            | PlingError::InvalidUrl(_)
            | PlingError::InvalidSince(_)
            | PlingError::SecretCommand(_) => ExitStatus::GeneralError,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlingError>;
