use crate::api::{Message, DEFAULT_PRIORITY};
use crate::error::PlingError;
use crate::watch::WatchReport;
use chrono::{Local, TimeZone};
use console::style;
use std::io::Write;
use std::time::Duration;

/// Renders watch-session output to a writer. Color is an explicit setting
/// carried by the value, so two sessions (or a test and a session) can
/// render with different settings in the same process.
pub struct MessageRender<W: Write> {
    out: W,
    color: bool,
}

impl MessageRender<std::io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        MessageRender::new(std::io::stdout(), color)
    }
}

impl<W: Write> MessageRender<W> {
    pub fn new(out: W, color: bool) -> Self {
        MessageRender { out, color }
    }

    pub fn banner(&mut self, topics: &[String], interval: Duration, sound_on: bool) {
        let sound = if sound_on { "sound on" } else { "sound off" };
        let _ = writeln!(
            self.out,
            "Watching {}: {} (every {}s, {})",
            if topics.len() == 1 { "topic" } else { "topics" },
            topics.join(", "),
            interval.as_secs(),
            sound
        );
        let _ = writeln!(self.out, "Press Ctrl-C to stop.");
    }

    /// One block per message: time label, topic, priority badge for
    /// non-default priorities, tags, then indented title and body.
    pub fn message(&mut self, msg: &Message) {
        let mut header = format!("{} {}", time_label(msg.time), self.topic_label(&msg.topic));
        if let Some(badge) = self.badge(msg.effective_priority()) {
            header.push(' ');
            header.push_str(&badge);
        }
        if !msg.tags.is_empty() {
            header.push_str(&format!(" [{}]", msg.tags.join(", ")));
        }
        let _ = writeln!(self.out, "{}", header);

        if let Some(title) = &msg.title {
            let title = if self.color {
                style(title.as_str()).bold().to_string()
            } else {
                title.clone()
            };
            let _ = writeln!(self.out, "  {}", title);
        }
        if let Some(body) = &msg.message {
            let _ = writeln!(self.out, "  {}", body);
        }
    }

    pub fn fetch_error(&mut self, topic: &str, error: &PlingError) {
        let mark = if self.color {
            style("!").yellow().to_string()
        } else {
            "!".to_string()
        };
        let _ = writeln!(self.out, "{} {}: {}", mark, topic, error);
    }

    pub fn summary(&mut self, report: &WatchReport) {
        let minutes = report.elapsed.as_secs() / 60;
        let seconds = report.elapsed.as_secs() % 60;

        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "Watch session ended.");
        let _ = writeln!(self.out, "  Topics: {}", report.topics.join(", "));
        let _ = writeln!(self.out, "  Duration: {}m {:02}s", minutes, seconds);
        let _ = writeln!(
            self.out,
            "  Messages: {} {}",
            report.total,
            if report.total == 1 { "message" } else { "messages" }
        );
        for (topic, count) in &report.counts {
            if *count > 0 {
                let _ = writeln!(self.out, "    {}: {}", topic, count);
            }
        }
    }

    fn topic_label(&self, topic: &str) -> String {
        if self.color {
            style(topic).cyan().to_string()
        } else {
            topic.to_string()
        }
    }

    /// Badge for non-default priorities only; the implicit default renders
    /// without one.
    fn badge(&self, priority: u8) -> Option<String> {
        if priority == DEFAULT_PRIORITY {
            return None;
        }
        let badge = format!("!{}", priority);
        Some(if self.color && priority > DEFAULT_PRIORITY {
            style(badge).red().bold().to_string()
        } else if self.color {
            style(badge).dim().to_string()
        } else {
            badge
        })
    }
}

fn time_label(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0) {
        chrono::LocalResult::Single(t) => t.format("%H:%M:%S").to_string(),
        _ => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(time: i64, priority: Option<u8>) -> Message {
        Message {
            id: format!("id-{}", time),
            time,
            event: "message".to_string(),
            topic: "alerts".to_string(),
            title: Some("A title".to_string()),
            message: Some(format!("body-{}", time)),
            priority,
            tags: vec!["tag1".to_string()],
            click: None,
        }
    }

    fn rendered(msg: &Message) -> String {
        let mut buf = Vec::new();
        MessageRender::new(&mut buf, false).message(msg);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_default_priority_has_no_badge() {
        let out = rendered(&msg(100, None));
        assert!(!out.contains("!3"));
        assert!(out.contains("alerts"));
        assert!(out.contains("[tag1]"));
        assert!(out.contains("A title"));
        assert!(out.contains("body-100"));
    }

    #[test]
    fn test_non_default_priority_badge() {
        assert!(rendered(&msg(100, Some(5))).contains("!5"));
        assert!(rendered(&msg(100, Some(1))).contains("!1"));
    }

    #[test]
    fn test_summary_lists_only_active_topics() {
        let report = WatchReport {
            topics: vec!["alerts".to_string(), "builds".to_string()],
            elapsed: Duration::from_secs(125),
            total: 3,
            counts: vec![("alerts".to_string(), 3), ("builds".to_string(), 0)],
        };

        let mut buf = Vec::new();
        MessageRender::new(&mut buf, false).summary(&report);
        let out = String::from_utf8(buf).unwrap();

        assert!(out.contains("2m 05s"));
        assert!(out.contains("Topics: alerts, builds"));
        assert!(out.contains("Messages: 3"));
        assert!(out.contains("alerts: 3"));
        assert!(!out.contains("builds: 0"));
    }
}
