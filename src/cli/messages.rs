use crate::api::{ApiClient, Since};
use crate::cli::Ctx;
use crate::config;
use crate::error::{PlingError, Result};
use crate::state;
use crate::watch::MessageRender;

/// Run the messages command: one-shot fetch for a topic
pub async fn run_messages(
    ctx: &Ctx,
    topic: Option<String>,
    since: String,
    mark_read: bool,
    json: bool,
) -> Result<()> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;
    let profile = cfg.resolve_profile(ctx.profile.as_deref())?;

    let topic = topic
        .or_else(|| profile.default_topic.clone())
        .ok_or_else(|| PlingError::NoTopics(profile.name.clone()))?;

    let since = Since::parse(&since).ok_or(PlingError::InvalidSince(since))?;

    let client = ApiClient::new(profile)?;
    let spinner = ctx.console.spinner(&format!("Fetching {}...", topic));
    let result = client.poll(&topic, &since).await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    let mut messages = result?;
    messages.sort_by_key(|m| m.time);

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
    } else if messages.is_empty() {
        ctx.console.info(&format!("No messages in {}", topic));
    } else {
        let mut render = MessageRender::stdout(ctx.console.color);
        for msg in &messages {
            render.message(msg);
        }
    }

    if mark_read {
        if let Some(newest) = messages.iter().map(|m| m.time).max() {
            let state = state::load_state()?.updated(&profile.name, &topic, newest);
            state::save_state(&state)?;
            ctx.console
                .success(&format!("Marked {} read up to {}", topic, newest));
        }
    }

    Ok(())
}
