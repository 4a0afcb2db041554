use crate::cli::Ctx;
use crate::config;
use crate::error::{PlingError, Result};
use crate::state;
use crate::watch::{Clock, SystemClock};

/// Run the mark-read command: advance the durable read state to now for
/// one topic, or for every watched topic
pub fn run_mark_read(ctx: &Ctx, topic: Option<String>) -> Result<()> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;
    let profile = cfg.resolve_profile(ctx.profile.as_deref())?;

    let topics: Vec<String> = match topic {
        Some(t) => {
            if !profile.watches(&t) {
                return Err(PlingError::TopicNotFound(t));
            }
            vec![t]
        }
        None => profile.topics.clone(),
    };

    if topics.is_empty() {
        ctx.console.info("No watched topics");
        return Ok(());
    }

    let now = SystemClock.now_unix();
    let mut read_state = state::load_state()?;
    for t in &topics {
        read_state = read_state.updated(&profile.name, t, now);
    }
    state::save_state(&read_state)?;

    ctx.console.success(&format!(
        "Marked {} {} read up to now",
        topics.len(),
        if topics.len() == 1 { "topic" } else { "topics" }
    ));
    Ok(())
}
