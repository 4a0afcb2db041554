use crate::api::{ApiClient, Since};
use crate::cli::Ctx;
use crate::config;
use crate::error::{ExitStatus, Result};
use crate::state;
use crate::ui::truncate;
use futures::future::join_all;

/// Run the unread command: count messages newer than the durable read
/// state across all watched topics. Topics are independent and read-only,
/// so the fetches fan out concurrently.
pub async fn run_unread(ctx: &Ctx) -> Result<ExitStatus> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;
    let profile = cfg.resolve_profile(ctx.profile.as_deref())?;
    let read_state = state::load_state()?;

    if profile.topics.is_empty() {
        ctx.console.info("No watched topics");
        return Ok(ExitStatus::Success);
    }

    let client = ApiClient::new(profile)?;

    let fetches = profile.topics.iter().map(|topic| {
        let client = &client;
        let last_read = read_state.last_read(&profile.name, topic);
        async move {
            let since = if last_read > 0 {
                Since::Unix(last_read)
            } else {
                Since::All
            };
            let result = client.poll(topic, &since).await.map(|messages| {
                messages
                    .into_iter()
                    .filter(|m| m.time > last_read)
                    .count()
            });
            (topic.clone(), result)
        }
    });

    let spinner = ctx.console.spinner("Checking topics...");
    let results = join_all(fetches).await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    println!("{:<24} {}", "TOPIC", "UNREAD");
    println!("{}", "-".repeat(32));

    let mut failures = 0;
    let mut total = 0;
    for (topic, result) in &results {
        match result {
            Ok(count) => {
                total += count;
                println!("{:<24} {}", truncate(topic, 22), count);
            }
            Err(e) => {
                failures += 1;
                println!("{:<24} error", truncate(topic, 22));
                ctx.console.error(&format!("{}: {}", topic, e));
            }
        }
    }

    ctx.console.blank();
    ctx.console.info(&format!(
        "{} unread across {} topics",
        total,
        results.len()
    ));

    if failures == 0 {
        Ok(ExitStatus::Success)
    } else if failures == results.len() {
        Ok(ExitStatus::AllTopicsFailed)
    } else {
        Ok(ExitStatus::PartialFailure)
    }
}
