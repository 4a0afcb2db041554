use crate::api::types::{Message, Outgoing, Since, EVENT_MESSAGE};
use crate::config::{self, ServerProfile};
use crate::error::{PlingError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
enum Auth {
    None,
    Basic { username: String, password: String },
    Bearer(String),
}

/// HTTP client bound to one server profile. Credentials are resolved once
/// at construction so polling loops do not re-run secret commands.
pub struct ApiClient {
    http: Client,
    base: Url,
    auth: Auth,
}

impl ApiClient {
    pub fn new(profile: &ServerProfile) -> Result<Self> {
        let base = Url::parse(&profile.url)
            .map_err(|e| PlingError::InvalidUrl(format!("{}: {}", profile.url, e)))?;

        let auth = match (&profile.username, &profile.password_command, &profile.token_command) {
            (Some(username), Some(command), _) => Auth::Basic {
                username: username.clone(),
                password: config::run_secret_command(command)?,
            },
            (_, _, Some(command)) => Auth::Bearer(config::run_secret_command(command)?),
            _ => Auth::None,
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(ApiClient { http, base, auth })
    }

    fn topic_url(&self, topic: &str, suffix: &str) -> Result<Url> {
        self.base
            .join(&format!("{}{}", topic, suffix))
            .map_err(|e| PlingError::InvalidUrl(format!("{}: {}", topic, e)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::None => request,
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
            Auth::Bearer(token) => request.bearer_auth(token),
        }
    }

    /// Fetch all message-kind events for a topic at or after `since`.
    /// No ordering is guaranteed; callers sort and deduplicate.
    pub async fn poll(&self, topic: &str, since: &Since) -> Result<Vec<Message>> {
        let url = self.topic_url(topic, "/json")?;
        let since = since.to_string();
        let response = self
            .authorize(
                self.http
                    .get(url)
                    .query(&[("poll", "1"), ("since", since.as_str())]),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PlingError::Api { status, body });
        }

        let body = response.text().await?;
        Ok(parse_poll_body(&body))
    }

    /// Publish a notification to a topic, returning the created record
    pub async fn publish(&self, topic: &str, outgoing: &Outgoing) -> Result<Message> {
        let url = self.topic_url(topic, "")?;
        let mut request = self.http.post(url).body(outgoing.body.clone());

        if let Some(title) = &outgoing.title {
            request = request.header("X-Title", title);
        }
        if let Some(priority) = outgoing.priority {
            request = request.header("X-Priority", priority.to_string());
        }
        if !outgoing.tags.is_empty() {
            request = request.header("X-Tags", outgoing.tags.join(","));
        }
        if let Some(click) = &outgoing.click {
            request = request.header("X-Click", click);
        }

        let response = self.authorize(request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PlingError::Api { status, body });
        }

        Ok(response.json().await?)
    }

    /// Check the server's health endpoint
    pub async fn health(&self) -> Result<bool> {
        let url = self
            .base
            .join("v1/health")
            .map_err(|e| PlingError::InvalidUrl(e.to_string()))?;

        let response = self.authorize(self.http.get(url)).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PlingError::Api { status, body });
        }

        #[derive(Deserialize)]
        struct Health {
            healthy: bool,
        }

        let health: Health = response.json().await?;
        Ok(health.healthy)
    }
}

/// Parse a newline-delimited JSON poll response. Malformed lines are warned
/// about and skipped; non-message event kinds (open, keepalive) are
/// filtered out here so callers only ever see messages.
fn parse_poll_body(body: &str) -> Vec<Message> {
    let mut messages = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Message>(line) {
            Ok(msg) if msg.event == EVENT_MESSAGE => messages.push(msg),
            Ok(_) => {}
            Err(e) => warn!("Skipping malformed event line: {}", e),
        }
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_poll_body_filters_event_kinds() {
        let body = concat!(
            r#"{"id":"o1","time":90,"event":"open","topic":"alerts"}"#,
            "\n",
            r#"{"id":"m1","time":100,"event":"message","topic":"alerts","message":"hi"}"#,
            "\n",
            r#"{"id":"k1","time":110,"event":"keepalive","topic":"alerts"}"#,
            "\n",
            r#"{"id":"m2","time":120,"event":"message","topic":"alerts","message":"again"}"#,
            "\n",
        );

        let messages = parse_poll_body(body);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, "m1");
        assert_eq!(messages[1].id, "m2");
    }

    #[test]
    fn test_parse_poll_body_skips_garbage() {
        let body = concat!(
            "not json at all\n",
            "\n",
            r#"{"id":"m1","time":100,"event":"message","topic":"alerts"}"#,
            "\n",
        );

        let messages = parse_poll_body(body);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "m1");
    }

    #[test]
    fn test_parse_poll_body_empty() {
        assert!(parse_poll_body("").is_empty());
        assert!(parse_poll_body("\n\n").is_empty());
    }
}
