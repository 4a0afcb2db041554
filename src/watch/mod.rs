mod render;
mod sound;

pub use render::MessageRender;
pub use sound::{default_sound, SystemSound};

use crate::api::{ApiClient, Message, Since, DEFAULT_PRIORITY};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Where the engine fetches messages from. The engine assumes nothing
/// about ordering and applies its own strictly-newer filter, so sources
/// may return overlapping or out-of-order results.
#[async_trait]
pub trait MessageSource {
    async fn poll(&self, topic: &str, since: i64) -> Result<Vec<Message>>;
}

/// Alert playback. Infallible by contract: implementations swallow every
/// failure. Awaited only so playback attempts do not overlap.
#[async_trait]
pub trait AlertSound {
    async fn play(&self, sound: &Path, device: Option<&str>);
}

/// Injected wall clock, so tests can seed deterministic session starts
pub trait Clock {
    fn now_unix(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Sink for durable read-state updates, fed after each rendered batch so a
/// later unread check does not re-surface messages already seen live
pub trait ReadMarker {
    fn mark_read(&mut self, topic: &str, timestamp: i64) -> Result<()>;
}

/// Session configuration, fixed for the engine's lifetime
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Non-empty ordered topic set; resolution happens before the engine
    pub topics: Vec<String>,
    pub interval: Duration,
    pub no_sound: bool,
    pub sound: PathBuf,
    pub device: Option<String>,
    /// A batch triggers audio only if its loudest message reaches this
    pub min_priority: u8,
}

/// Session bookkeeping returned when the loop ends
#[derive(Debug, Clone)]
pub struct WatchReport {
    pub topics: Vec<String>,
    pub elapsed: Duration,
    pub total: u64,
    /// Per-topic rendered counts, in topic order
    pub counts: Vec<(String, u64)>,
}

/// The watch engine: polls each topic in a fixed order on a fixed
/// interval, renders the strictly-newer delta exactly once, and alerts
/// under the priority gate. Cursors and counters are owned exclusively by
/// the engine for the session's lifetime.
pub struct WatchEngine<S, A, M, W>
where
    S: MessageSource,
    A: AlertSound,
    M: ReadMarker,
    W: Write,
{
    source: S,
    alert: A,
    marker: M,
    render: MessageRender<W>,
    options: WatchOptions,
    cancel: CancellationToken,
    cursors: HashMap<String, i64>,
    counts: HashMap<String, u64>,
}

impl<S, A, M, W> WatchEngine<S, A, M, W>
where
    S: MessageSource,
    A: AlertSound,
    M: ReadMarker,
    W: Write,
{
    /// Build an engine with cursors seeded at the clock's current time, so
    /// the session surfaces only messages that arrive while it runs.
    pub fn new(
        source: S,
        alert: A,
        clock: &dyn Clock,
        marker: M,
        render: MessageRender<W>,
        options: WatchOptions,
        cancel: CancellationToken,
    ) -> Self {
        let now = clock.now_unix();
        let cursors = options
            .topics
            .iter()
            .map(|t| (t.clone(), now))
            .collect();

        WatchEngine {
            source,
            alert,
            marker,
            render,
            options,
            cancel,
            cursors,
            counts: HashMap::new(),
        }
    }

    /// Run the polling loop until cancelled, then print the summary once
    /// and return the session report. Cancellation is normal termination.
    pub async fn run(mut self) -> WatchReport {
        let started = Instant::now();
        let topics = self.options.topics.clone();

        self.render.banner(
            &topics,
            self.options.interval,
            !self.options.no_sound,
        );

        'session: loop {
            if self.cancel.is_cancelled() {
                break;
            }

            for topic in &topics {
                // Cooperative check: never start a new fetch after the
                // signal, though an in-flight one is not aborted
                if self.cancel.is_cancelled() {
                    break 'session;
                }
                self.poll_topic(topic).await;
            }

            if self.cancel.is_cancelled() {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.options.interval) => {}
            }
        }

        let counts: Vec<(String, u64)> = topics
            .iter()
            .map(|t| (t.clone(), self.counts.get(t).copied().unwrap_or(0)))
            .collect();
        let report = WatchReport {
            topics,
            elapsed: started.elapsed(),
            total: counts.iter().map(|(_, c)| c).sum(),
            counts,
        };

        self.render.summary(&report);
        report
    }

    /// One topic's share of a poll cycle. Failures are logged and isolated
    /// here: nothing can abort another topic's work or the next cycle.
    async fn poll_topic(&mut self, topic: &str) {
        let since = self.cursors.get(topic).copied().unwrap_or(0);

        let events = match self.source.poll(topic, since).await {
            Ok(events) => events,
            Err(e) => {
                warn!(topic = %topic, "Poll failed: {}", e);
                self.render.fetch_error(topic, &e);
                return;
            }
        };

        // The source may return events at or before the cursor; the
        // strictly-greater filter is the only deduplication guarantee
        let mut fresh: Vec<Message> = events.into_iter().filter(|m| m.time > since).collect();
        if fresh.is_empty() {
            return;
        }
        fresh.sort_by_key(|m| m.time);

        for msg in &fresh {
            self.render.message(msg);
        }

        let newest = fresh.iter().map(|m| m.time).fold(since, i64::max);
        self.cursors.insert(topic.to_string(), newest);
        *self.counts.entry(topic.to_string()).or_insert(0) += fresh.len() as u64;

        if let Err(e) = self.marker.mark_read(topic, newest) {
            warn!(topic = %topic, "Failed to persist read state: {}", e);
        }

        let loudest = fresh
            .iter()
            .map(|m| m.effective_priority())
            .max()
            .unwrap_or(DEFAULT_PRIORITY);
        if !self.options.no_sound && loudest >= self.options.min_priority {
            debug!(topic = %topic, loudest, "Batch reached alert threshold");
            // Once per batch, not once per message
            self.alert
                .play(&self.options.sound, self.options.device.as_deref())
                .await;
        }
    }
}

/// Production source backed by the HTTP API client
pub struct HttpSource {
    client: ApiClient,
}

impl HttpSource {
    pub fn new(client: ApiClient) -> Self {
        HttpSource { client }
    }
}

#[async_trait]
impl MessageSource for HttpSource {
    async fn poll(&self, topic: &str, since: i64) -> Result<Vec<Message>> {
        self.client.poll(topic, &Since::Unix(since)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlingError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn msg(topic: &str, time: i64, priority: Option<u8>) -> Message {
        Message {
            id: format!("{}-{}", topic, time),
            time,
            event: "message".to_string(),
            topic: topic.to_string(),
            title: None,
            message: Some(format!("body-{}", time)),
            priority,
            tags: Vec::new(),
            click: None,
        }
    }

    /// Per-topic scripted poll responses. Cancels the session token once
    /// every queue has been drained, so tests terminate deterministically.
    struct ScriptedSource {
        queues: Mutex<HashMap<String, VecDeque<Result<Vec<Message>>>>>,
        cancel: CancellationToken,
    }

    impl ScriptedSource {
        fn new(cancel: CancellationToken) -> Self {
            ScriptedSource {
                queues: Mutex::new(HashMap::new()),
                cancel,
            }
        }

        fn script(self, topic: &str, responses: Vec<Result<Vec<Message>>>) -> Self {
            self.queues
                .lock()
                .unwrap()
                .insert(topic.to_string(), responses.into());
            self
        }
    }

    #[async_trait]
    impl MessageSource for ScriptedSource {
        async fn poll(&self, topic: &str, _since: i64) -> Result<Vec<Message>> {
            let mut queues = self.queues.lock().unwrap();
            let response = queues
                .get_mut(topic)
                .and_then(|q| q.pop_front())
                .unwrap_or_else(|| Ok(Vec::new()));
            if queues.values().all(|q| q.is_empty()) {
                self.cancel.cancel();
            }
            response
        }
    }

    struct CountingSound {
        plays: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AlertSound for CountingSound {
        async fn play(&self, _sound: &Path, _device: Option<&str>) {
            self.plays.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_unix(&self) -> i64 {
            self.0
        }
    }

    #[derive(Clone)]
    struct RecordingMarker {
        marks: Arc<Mutex<Vec<(String, i64)>>>,
    }

    impl RecordingMarker {
        fn new() -> Self {
            RecordingMarker {
                marks: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl ReadMarker for RecordingMarker {
        fn mark_read(&mut self, topic: &str, timestamp: i64) -> Result<()> {
            self.marks.lock().unwrap().push((topic.to_string(), timestamp));
            Ok(())
        }
    }

    struct Session {
        report: WatchReport,
        output: String,
        plays: usize,
        marks: Vec<(String, i64)>,
    }

    async fn run_session(
        topics: &[&str],
        seed: i64,
        min_priority: u8,
        no_sound: bool,
        source: ScriptedSource,
        cancel: CancellationToken,
    ) -> Session {
        let plays = Arc::new(AtomicUsize::new(0));
        let marker = RecordingMarker::new();
        let marks = marker.marks.clone();
        let mut buf = Vec::new();

        let options = WatchOptions {
            topics: topics.iter().map(|t| t.to_string()).collect(),
            interval: Duration::from_secs(60),
            no_sound,
            sound: PathBuf::from("beep.wav"),
            device: None,
            min_priority,
        };

        let report = WatchEngine::new(
            source,
            CountingSound { plays: plays.clone() },
            &FixedClock(seed),
            marker,
            MessageRender::new(&mut buf, false),
            options,
            cancel,
        )
        .run()
        .await;

        let marks = marks.lock().unwrap().clone();
        Session {
            report,
            output: String::from_utf8(buf).unwrap(),
            plays: plays.load(Ordering::SeqCst),
            marks,
        }
    }

    fn count_of(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_polls_render_each_message_once() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(cancel.clone()).script(
            "alerts",
            vec![
                Ok(vec![msg("alerts", 100, None), msg("alerts", 200, None)]),
                Ok(vec![msg("alerts", 200, None), msg("alerts", 300, None)]),
            ],
        );

        let session = run_session(&["alerts"], 50, 1, true, source, cancel).await;

        assert_eq!(session.report.total, 3);
        assert_eq!(count_of(&session.output, "body-100"), 1);
        assert_eq!(count_of(&session.output, "body-200"), 1);
        assert_eq!(count_of(&session.output, "body-300"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_advances_monotonically() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(cancel.clone()).script(
            "alerts",
            vec![
                Ok(vec![msg("alerts", 100, None), msg("alerts", 200, None)]),
                Ok(vec![msg("alerts", 300, None)]),
            ],
        );

        let session = run_session(&["alerts"], 50, 1, true, source, cancel).await;

        // Cursor is fed into the read marker after each batch
        assert_eq!(
            session.marks,
            vec![("alerts".to_string(), 200), ("alerts".to_string(), 300)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_fetch_renders_chronologically() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(cancel.clone()).script(
            "alerts",
            vec![Ok(vec![
                msg("alerts", 300, None),
                msg("alerts", 100, None),
                msg("alerts", 200, None),
            ])],
        );

        let session = run_session(&["alerts"], 50, 1, true, source, cancel).await;

        let p100 = session.output.find("body-100").unwrap();
        let p200 = session.output.find("body-200").unwrap();
        let p300 = session.output.find("body-300").unwrap();
        assert!(p100 < p200 && p200 < p300);
        assert_eq!(session.marks, vec![("alerts".to_string(), 300)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_gate_silences_quiet_batches() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(cancel.clone()).script(
            "alerts",
            vec![Ok(vec![
                msg("alerts", 100, Some(2)),
                msg("alerts", 200, Some(3)),
            ])],
        );

        let session = run_session(&["alerts"], 50, 4, false, source, cancel).await;

        assert_eq!(session.report.total, 2);
        assert_eq!(session.plays, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_gate_plays_once_per_batch() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(cancel.clone()).script(
            "alerts",
            vec![Ok(vec![
                msg("alerts", 100, Some(2)),
                msg("alerts", 200, Some(5)),
            ])],
        );

        let session = run_session(&["alerts"], 50, 4, false, source, cancel).await;

        assert_eq!(session.plays, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sound_overrides_priority() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(cancel.clone())
            .script("alerts", vec![Ok(vec![msg("alerts", 100, Some(5))])]);

        let session = run_session(&["alerts"], 50, 1, true, source, cancel).await;

        assert_eq!(session.report.total, 1);
        assert_eq!(session.plays, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_priority_meets_default_threshold() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(cancel.clone())
            .script("alerts", vec![Ok(vec![msg("alerts", 100, None)])]);

        // Absent priority counts as 3 for the gate; threshold 3 triggers
        let session = run_session(&["alerts"], 50, 3, false, source, cancel).await;

        assert_eq!(session.plays, 1);
        assert!(!session.output.contains("!3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_is_isolated_per_topic() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(cancel.clone())
            .script(
                "broken",
                vec![Err(PlingError::Api {
                    status: 500,
                    body: "boom".to_string(),
                })],
            )
            .script(
                "healthy",
                vec![Ok(vec![
                    msg("healthy", 100, None),
                    msg("healthy", 200, None),
                ])],
            );

        let session = run_session(&["broken", "healthy"], 50, 1, true, source, cancel).await;

        assert_eq!(session.report.total, 2);
        assert_eq!(
            session.report.counts,
            vec![("broken".to_string(), 0), ("healthy".to_string(), 2)]
        );
        // The failed topic's cursor never advanced
        assert_eq!(session.marks, vec![("healthy".to_string(), 200)]);
        assert!(session.output.contains("broken: Server returned status 500"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_twice_prints_one_summary() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        cancel.cancel();
        let source = ScriptedSource::new(cancel.clone());

        let session = run_session(&["alerts"], 50, 1, true, source, cancel).await;

        assert_eq!(session.report.total, 0);
        assert_eq!(count_of(&session.output, "Watch session ended."), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_messages_at_or_before_seed_are_invisible() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(cancel.clone()).script(
            "alerts",
            vec![Ok(vec![
                msg("alerts", 900, None),
                msg("alerts", 1000, None),
            ])],
        );

        let session = run_session(&["alerts"], 1000, 1, true, source, cancel).await;

        assert_eq!(session.report.total, 0);
        assert!(session.marks.is_empty());
        assert!(!session.output.contains("body-900"));
        assert!(!session.output.contains("body-1000"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_end_to_end() {
        let cancel = CancellationToken::new();
        let source = ScriptedSource::new(cancel.clone()).script(
            "alerts",
            vec![
                // Cycle 1: nothing newer than the seed
                Ok(vec![msg("alerts", 1000, None)]),
                // Cycle 2: one high-priority message arrives
                Ok(vec![msg("alerts", 1005, Some(5))]),
            ],
        );

        let session = run_session(&["alerts"], 1000, 1, false, source, cancel).await;

        assert_eq!(session.report.total, 1);
        assert_eq!(session.report.counts, vec![("alerts".to_string(), 1)]);
        assert_eq!(session.marks, vec![("alerts".to_string(), 1005)]);
        assert_eq!(session.plays, 1);
        assert_eq!(count_of(&session.output, "body-1005"), 1);
        assert!(session.output.contains("alerts: 1"));
        assert_eq!(count_of(&session.output, "Watch session ended."), 1);
    }
}
