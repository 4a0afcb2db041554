use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The current state file version
pub const STATE_VERSION: u32 = 1;

/// Durable read-state: how far the operator has "caught up" per
/// (profile, topic) pair, independent of any single watch session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadState {
    pub version: u32,
    #[serde(default)]
    pub topics: HashMap<String, TopicReadState>,
}

impl Default for ReadState {
    fn default() -> Self {
        ReadState {
            version: STATE_VERSION,
            topics: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicReadState {
    /// Unix timestamp of the newest message considered read
    pub last_read: i64,
    pub updated_at: DateTime<Utc>,
}

impl ReadState {
    /// Compound key for a (profile, topic) pair. Topic names cannot contain
    /// '/' (rejected at config validation), so the key is unambiguous.
    pub fn key(profile: &str, topic: &str) -> String {
        format!("{}/{}", profile, topic)
    }

    /// Last-read timestamp, 0 meaning "never read"
    pub fn last_read(&self, profile: &str, topic: &str) -> i64 {
        self.topics
            .get(&Self::key(profile, topic))
            .map(|t| t.last_read)
            .unwrap_or(0)
    }

    /// Return a new store with the given entry updated; other entries are
    /// untouched. The caller is responsible for persisting the result.
    pub fn updated(mut self, profile: &str, topic: &str, last_read: i64) -> Self {
        self.topics.insert(
            Self::key(profile, topic),
            TopicReadState {
                last_read,
                updated_at: Utc::now(),
            },
        );
        self
    }

    /// Remove the entry for a (profile, topic) pair, if any
    pub fn forget(&mut self, profile: &str, topic: &str) -> bool {
        self.topics.remove(&Self::key(profile, topic)).is_some()
    }

    /// Remove entries whose key is not in the valid set, returning the
    /// removed keys
    pub fn prune_orphans(&mut self, valid_keys: &[String]) -> Vec<String> {
        let orphans: Vec<String> = self
            .topics
            .keys()
            .filter(|k| !valid_keys.contains(k))
            .cloned()
            .collect();

        for key in &orphans {
            self.topics.remove(key);
        }

        orphans
    }
}
