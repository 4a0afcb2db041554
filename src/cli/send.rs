use crate::api::{ApiClient, Outgoing};
use crate::cli::Ctx;
use crate::config;
use crate::error::{PlingError, Result};

/// Run the send command
#[allow(clippy::too_many_arguments)]
pub async fn run_send(
    ctx: &Ctx,
    topic: Option<String>,
    body: String,
    title: Option<String>,
    priority: Option<u8>,
    tags: Option<String>,
    click: Option<String>,
) -> Result<()> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;
    let profile = cfg.resolve_profile(ctx.profile.as_deref())?;

    let topic = topic
        .or_else(|| profile.default_topic.clone())
        .ok_or_else(|| PlingError::NoTopics(profile.name.clone()))?;

    let outgoing = Outgoing {
        body,
        title,
        priority,
        tags: tags
            .map(|t| {
                t.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        click,
    };

    let client = ApiClient::new(profile)?;
    let spinner = ctx.console.spinner(&format!("Sending to {}...", topic));
    let result = client.publish(&topic, &outgoing).await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    let sent = result?;
    ctx.console
        .success(&format!("Sent to {} (id {})", topic, sent.id));
    Ok(())
}
