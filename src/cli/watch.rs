use crate::api::ApiClient;
use crate::cli::Ctx;
use crate::config;
use crate::error::{ExitStatus, PlingError, Result};
use crate::state::{self, ReadState};
use crate::watch::{
    default_sound, HttpSource, MessageRender, ReadMarker, SystemClock, SystemSound, WatchEngine,
    WatchOptions,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Persists watch-session cursors into the durable read-state store, so a
/// later unread check does not re-surface messages seen live.
struct StoreMarker {
    profile: String,
    state: ReadState,
}

impl ReadMarker for StoreMarker {
    fn mark_read(&mut self, topic: &str, timestamp: i64) -> Result<()> {
        self.state = std::mem::take(&mut self.state).updated(&self.profile, topic, timestamp);
        state::save_state(&self.state)
    }
}

/// Run the watch command
#[allow(clippy::too_many_arguments)]
pub async fn run_watch(
    ctx: &Ctx,
    topic: Option<String>,
    group: Option<String>,
    interval: Option<u64>,
    no_sound: bool,
    sound: Option<PathBuf>,
    device: Option<String>,
    min_priority: Option<u8>,
) -> Result<ExitStatus> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;
    let profile = cfg.resolve_profile(ctx.profile.as_deref())?;

    let topics = profile
        .watch_targets(topic.as_deref(), group.as_deref())
        .map_err(PlingError::Config)?;

    let interval = interval.unwrap_or(cfg.watch.interval_seconds);
    if interval == 0 {
        return Err(PlingError::ConfigInvalid(
            "Poll interval must be positive".to_string(),
        ));
    }

    let min_priority = min_priority.unwrap_or(cfg.watch.min_priority);
    if !(1..=5).contains(&min_priority) {
        return Err(PlingError::ConfigInvalid(
            "min_priority must be between 1 and 5".to_string(),
        ));
    }

    let sound = sound
        .or_else(|| cfg.watch.sound.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_sound);

    let client = ApiClient::new(profile)?;
    let marker = StoreMarker {
        profile: profile.name.clone(),
        state: state::load_state()?,
    };

    let options = WatchOptions {
        topics,
        interval: Duration::from_secs(interval),
        no_sound,
        sound,
        device,
        min_priority,
    };

    // The signal handler's only job is to trip the token; the engine owns
    // every cancellation decision.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    info!(
        profile = %profile.name,
        interval,
        "Starting watch session"
    );

    let engine = WatchEngine::new(
        HttpSource::new(client),
        SystemSound::new(),
        &SystemClock,
        marker,
        MessageRender::stdout(ctx.console.color),
        options,
        cancel,
    );

    engine.run().await;
    Ok(ExitStatus::Success)
}
