use crate::api::ApiClient;
use crate::cli::Ctx;
use crate::config;
use crate::error::{ExitStatus, PlingError, Result};
use futures::future::join_all;

/// Run the health command: check every profile's server concurrently, or
/// just the selected one when --profile is given
pub async fn run_health(ctx: &Ctx) -> Result<ExitStatus> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;

    let profiles: Vec<_> = match &ctx.profile {
        Some(name) => vec![cfg
            .find_profile(name)
            .ok_or_else(|| PlingError::ProfileNotFound(name.clone()))?],
        None => cfg.profiles.iter().collect(),
    };

    if profiles.is_empty() {
        return Err(PlingError::NoProfiles);
    }

    let checks = profiles.iter().map(|profile| async move {
        let result = match ApiClient::new(profile) {
            Ok(client) => client.health().await,
            Err(e) => Err(e),
        };
        (profile.name.clone(), profile.url.clone(), result)
    });

    let spinner = ctx.console.spinner("Checking servers...");
    let results = join_all(checks).await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    let mut failures = 0;
    for (name, url, result) in &results {
        match result {
            Ok(true) => ctx.console.success(&format!("{} ({}): healthy", name, url)),
            Ok(false) => {
                failures += 1;
                ctx.console.error(&format!("{} ({}): unhealthy", name, url));
            }
            Err(e) => {
                failures += 1;
                ctx.console.error(&format!("{} ({}): {}", name, url, e));
            }
        }
    }

    if failures == 0 {
        Ok(ExitStatus::Success)
    } else if failures == results.len() {
        Ok(ExitStatus::AllTopicsFailed)
    } else {
        Ok(ExitStatus::PartialFailure)
    }
}
