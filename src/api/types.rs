use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority assumed when a message carries none
pub const DEFAULT_PRIORITY: u8 = 3;

/// Event kind of notification records; only these reach callers
pub const EVENT_MESSAGE: &str = "message";

/// One notification event as returned by the server. Immutable once
/// fetched; callers filter and order, never mutate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned opaque identifier
    pub id: String,
    /// Unix timestamp in seconds
    pub time: i64,
    pub event: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click: Option<String>,
}

impl Message {
    pub fn effective_priority(&self) -> u8 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }
}

/// An outbound notification
#[derive(Debug, Clone, Default)]
pub struct Outgoing {
    pub body: String,
    pub title: Option<String>,
    pub priority: Option<u8>,
    pub tags: Vec<String>,
    pub click: Option<String>,
}

/// Lower bound for a message fetch, sent to the server as a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Since {
    /// Everything the server retains
    All,
    /// Absolute Unix timestamp in seconds
    Unix(i64),
    /// Relative duration such as "30s", "10m", "2h", "1d"
    Relative(String),
}

impl Since {
    pub fn parse(s: &str) -> Option<Since> {
        if s == "all" {
            return Some(Since::All);
        }
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            return s.parse().ok().map(Since::Unix);
        }
        let (digits, unit) = s.split_at(s.len().saturating_sub(1));
        if matches!(unit, "s" | "m" | "h" | "d")
            && !digits.is_empty()
            && digits.chars().all(|c| c.is_ascii_digit())
        {
            return Some(Since::Relative(s.to_string()));
        }
        None
    }
}

impl fmt::Display for Since {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Since::All => write!(f, "all"),
            Since::Unix(ts) => write!(f, "{}", ts),
            Since::Relative(d) => write!(f, "{}", d),
        }
    }
}
