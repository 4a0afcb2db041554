use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub watch: WatchSettings,
    #[serde(default)]
    pub profiles: Vec<ServerProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_profile: None,
            watch: WatchSettings::default(),
            profiles: Vec::new(),
        }
    }
}

/// Defaults for the watch command, overridable per invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSettings {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Minimum priority a new-message batch must reach to trigger the alert sound
    #[serde(default = "default_min_priority")]
    pub min_priority: u8,
    #[serde(default)]
    pub sound: Option<String>,
}

impl Default for WatchSettings {
    fn default() -> Self {
        WatchSettings {
            interval_seconds: default_interval(),
            min_priority: default_min_priority(),
            sound: None,
        }
    }
}

fn default_interval() -> u64 {
    60
}

fn default_min_priority() -> u8 {
    1
}

/// A named server identity: where to fetch from and which topics matter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerProfile {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    /// Command to execute to retrieve the password (basic auth)
    #[serde(default)]
    pub password_command: Option<String>,
    /// Command to execute to retrieve an access token (bearer auth)
    #[serde(default)]
    pub token_command: Option<String>,
    #[serde(default)]
    pub default_topic: Option<String>,
    /// Ordered watch list; duplicates rejected at validation
    #[serde(default)]
    pub topics: Vec<String>,
    /// Named topic groups; every member must already be a watched topic
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

impl ServerProfile {
    pub fn new(name: &str, url: &str) -> Self {
        ServerProfile {
            name: name.to_string(),
            url: url.to_string(),
            username: None,
            password_command: None,
            token_command: None,
            default_topic: None,
            topics: Vec::new(),
            groups: BTreeMap::new(),
        }
    }

    /// Resolve the topic set a watch session should cover: an explicit
    /// topic wins, then a named group's members, then the full watch list,
    /// then the default topic.
    pub fn watch_targets(
        &self,
        topic: Option<&str>,
        group: Option<&str>,
    ) -> Result<Vec<String>, String> {
        if let Some(t) = topic {
            return Ok(vec![t.to_string()]);
        }
        if let Some(g) = group {
            return match self.groups.get(g) {
                Some(members) if !members.is_empty() => Ok(members.clone()),
                Some(_) => Err(format!("Group '{}' has no members", g)),
                None => Err(format!("Group '{}' not found", g)),
            };
        }
        if !self.topics.is_empty() {
            return Ok(self.topics.clone());
        }
        if let Some(d) = &self.default_topic {
            return Ok(vec![d.clone()]);
        }
        Err(format!("Profile '{}' has no topics to watch", self.name))
    }

    pub fn watches(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }

    /// Validate profile invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Profile name must not be empty".to_string());
        }

        match Url::parse(&self.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => return Err(format!("URL scheme '{}' is not http(s)", url.scheme())),
            Err(e) => return Err(format!("Invalid URL '{}': {}", self.url, e)),
        }

        if self.username.is_some() != self.password_command.is_some() {
            return Err("username and password_command must be set together".to_string());
        }
        if self.token_command.is_some() && self.username.is_some() {
            return Err("token_command and username/password_command are mutually exclusive".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for topic in &self.topics {
            if let Err(e) = validate_topic_name(topic) {
                return Err(e);
            }
            if !seen.insert(topic.as_str()) {
                return Err(format!("Duplicate watched topic: {}", topic));
            }
        }

        if let Some(d) = &self.default_topic {
            validate_topic_name(d)?;
        }

        for (group, members) in &self.groups {
            if members.is_empty() {
                return Err(format!("Group '{}' has no members", group));
            }
            for member in members {
                if !self.watches(member) {
                    return Err(format!(
                        "Group '{}' member '{}' is not a watched topic",
                        group, member
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Topic names become path segments and halves of the "profile/topic" state
/// key, so slashes and whitespace are rejected up front.
pub fn validate_topic_name(topic: &str) -> Result<(), String> {
    if topic.is_empty() {
        return Err("Topic name must not be empty".to_string());
    }
    if topic.contains('/') {
        return Err(format!("Topic name '{}' must not contain '/'", topic));
    }
    if topic.chars().any(|c| c.is_whitespace()) {
        return Err(format!("Topic name '{}' must not contain whitespace", topic));
    }
    Ok(())
}

impl Config {
    /// Find a profile by name
    pub fn find_profile(&self, name: &str) -> Option<&ServerProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Find a profile mutably by name
    pub fn find_profile_mut(&mut self, name: &str) -> Option<&mut ServerProfile> {
        self.profiles.iter_mut().find(|p| p.name == name)
    }

    /// Resolve the profile to operate on: explicit name, then the
    /// configured default, then a sole configured profile.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<&ServerProfile, crate::error::PlingError> {
        use crate::error::PlingError;

        if let Some(n) = name {
            return self
                .find_profile(n)
                .ok_or_else(|| PlingError::ProfileNotFound(n.to_string()));
        }
        if let Some(d) = &self.default_profile {
            return self
                .find_profile(d)
                .ok_or_else(|| PlingError::ProfileNotFound(d.clone()));
        }
        match self.profiles.as_slice() {
            [] => Err(PlingError::NoProfiles),
            [only] => Ok(only),
            _ => Err(PlingError::Config(
                "Multiple profiles configured; pass --profile or set default_profile".to_string(),
            )),
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<Vec<String>, Vec<String>> {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let mut seen_names = std::collections::HashSet::new();
        for profile in &self.profiles {
            if !seen_names.insert(profile.name.as_str()) {
                errors.push(format!("Duplicate profile name: {}", profile.name));
            }
            if let Err(e) = profile.validate() {
                errors.push(format!("Profile '{}': {}", profile.name, e));
            }
        }

        if let Some(d) = &self.default_profile {
            if self.find_profile(d).is_none() {
                errors.push(format!("default_profile '{}' does not exist", d));
            }
        }

        if self.watch.interval_seconds == 0 {
            errors.push("watch.interval_seconds must be positive".to_string());
        }
        if !(1..=5).contains(&self.watch.min_priority) {
            errors.push("watch.min_priority must be between 1 and 5".to_string());
        }

        if self.profiles.is_empty() {
            warnings.push("No profiles configured".to_string());
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(errors)
        }
    }
}
