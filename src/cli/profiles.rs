use crate::cli::{Ctx, ProfilesCommands};
use crate::config::{self, ServerProfile};
use crate::error::{PlingError, Result};
use crate::ui::truncate;

/// Run profiles subcommands
pub fn run_profiles(ctx: &Ctx, command: ProfilesCommands) -> Result<()> {
    match command {
        ProfilesCommands::List => list_profiles(ctx),
        ProfilesCommands::Add {
            name,
            url,
            username,
            password_command,
            token_command,
            default_topic,
        } => add_profile(ctx, name, url, username, password_command, token_command, default_topic),
        ProfilesCommands::Remove { name } => remove_profile(ctx, &name),
        ProfilesCommands::Show { name } => show_profile(ctx, name),
        ProfilesCommands::SetDefault { name } => set_default(ctx, &name),
    }
}

fn list_profiles(ctx: &Ctx) -> Result<()> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;

    if cfg.profiles.is_empty() {
        ctx.console.info("No profiles configured");
        ctx.console.info("Use 'pling profiles add' to add one");
        return Ok(());
    }

    println!("{:<16} {:<36} {:<8} {}", "NAME", "URL", "TOPICS", "DEFAULT");
    println!("{}", "-".repeat(70));

    for profile in &cfg.profiles {
        let is_default = cfg.default_profile.as_deref() == Some(profile.name.as_str());
        println!(
            "{:<16} {:<36} {:<8} {}",
            truncate(&profile.name, 14),
            truncate(&profile.url, 34),
            profile.topics.len(),
            if is_default { "*" } else { "" }
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn add_profile(
    ctx: &Ctx,
    name: String,
    url: String,
    username: Option<String>,
    password_command: Option<String>,
    token_command: Option<String>,
    default_topic: Option<String>,
) -> Result<()> {
    let mut cfg = config::load_config(ctx.config_path.as_deref()).unwrap_or_default();

    if cfg.find_profile(&name).is_some() {
        return Err(PlingError::ProfileExists(name));
    }

    let mut profile = ServerProfile::new(&name, &url);
    profile.username = username;
    profile.password_command = password_command;
    profile.token_command = token_command;
    profile.default_topic = default_topic;

    profile.validate().map_err(PlingError::ConfigInvalid)?;

    cfg.profiles.push(profile);
    if cfg.profiles.len() == 1 {
        cfg.default_profile = Some(name.clone());
    }
    config::save_config(&cfg, ctx.config_path.as_deref())?;

    ctx.console.success(&format!("Added profile '{}'", name));
    Ok(())
}

fn remove_profile(ctx: &Ctx, name: &str) -> Result<()> {
    let mut cfg = config::load_config(ctx.config_path.as_deref())?;

    let before = cfg.profiles.len();
    cfg.profiles.retain(|p| p.name != name);
    if cfg.profiles.len() == before {
        return Err(PlingError::ProfileNotFound(name.to_string()));
    }

    if cfg.default_profile.as_deref() == Some(name) {
        cfg.default_profile = cfg.profiles.first().map(|p| p.name.clone());
    }
    config::save_config(&cfg, ctx.config_path.as_deref())?;

    ctx.console.success(&format!("Removed profile '{}'", name));
    Ok(())
}

fn show_profile(ctx: &Ctx, name: Option<String>) -> Result<()> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;
    let redacted = config::redact_config(&cfg);

    let profile = match &name {
        Some(n) => redacted
            .find_profile(n)
            .ok_or_else(|| PlingError::ProfileNotFound(n.clone()))?,
        None => {
            let resolved = cfg.resolve_profile(ctx.profile.as_deref())?;
            redacted
                .find_profile(&resolved.name)
                .ok_or_else(|| PlingError::ProfileNotFound(resolved.name.clone()))?
        }
    };

    println!("{}", toml::to_string_pretty(profile)?);
    Ok(())
}

fn set_default(ctx: &Ctx, name: &str) -> Result<()> {
    let mut cfg = config::load_config(ctx.config_path.as_deref())?;

    if cfg.find_profile(name).is_none() {
        return Err(PlingError::ProfileNotFound(name.to_string()));
    }

    cfg.default_profile = Some(name.to_string());
    config::save_config(&cfg, ctx.config_path.as_deref())?;

    ctx.console.success(&format!("Default profile is now '{}'", name));
    Ok(())
}
