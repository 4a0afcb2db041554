use crate::cli::{Ctx, ConfigCommands};
use crate::config::{self, Config, ServerProfile};
use crate::error::{PlingError, Result};
use std::process::Command;

/// Run config subcommands
pub fn run_config(ctx: &Ctx, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show_config(ctx),
        ConfigCommands::Edit => edit_config(ctx),
        ConfigCommands::Validate => validate_config(ctx),
        ConfigCommands::Path => print_path(ctx),
        ConfigCommands::Init { force } => init_config(ctx, force),
    }
}

fn show_config(ctx: &Ctx) -> Result<()> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;
    let redacted = config::redact_config(&cfg);
    println!("{}", toml::to_string_pretty(&redacted)?);
    Ok(())
}

fn edit_config(ctx: &Ctx) -> Result<()> {
    let path = config::config_path(ctx.config_path.as_deref())?;

    if !path.exists() {
        return Err(PlingError::ConfigNotFound(path.display().to_string()));
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    let status = Command::new(&editor)
        .arg(&path)
        .status()
        .map_err(|e| PlingError::Config(format!("Failed to launch editor '{}': {}", editor, e)))?;

    if !status.success() {
        return Err(PlingError::Config(format!(
            "Editor exited with status {}",
            status
        )));
    }

    // Validate the config after editing
    match config::load_config(ctx.config_path.as_deref()) {
        Ok(cfg) => match cfg.validate() {
            Ok(_) => ctx.console.success("Config is valid"),
            Err(errors) => {
                ctx.console.warning("Config has validation errors:");
                for error in errors {
                    ctx.console.error(&format!("  {}", error));
                }
            }
        },
        Err(e) => {
            ctx.console.error(&format!("Config has syntax errors: {}", e));
        }
    }

    Ok(())
}

fn validate_config(ctx: &Ctx) -> Result<()> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;

    match cfg.validate() {
        Ok(warnings) => {
            for warning in warnings {
                ctx.console.warning(&warning);
            }
            ctx.console.success("Config is valid");
            Ok(())
        }
        Err(errors) => {
            for error in errors {
                ctx.console.error(&error);
            }
            Err(PlingError::ConfigInvalid(
                "Config validation failed".to_string(),
            ))
        }
    }
}

fn print_path(ctx: &Ctx) -> Result<()> {
    let path = config::config_path(ctx.config_path.as_deref())?;
    println!("{}", path.display());
    Ok(())
}

fn init_config(ctx: &Ctx, force: bool) -> Result<()> {
    let path = config::config_path(ctx.config_path.as_deref())?;

    if path.exists() && !force {
        return Err(PlingError::Config(format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        )));
    }

    let mut cfg = Config::default();
    let mut profile = ServerProfile::new("default", "https://push.example.com");
    profile.default_topic = Some("alerts".to_string());
    profile.topics = vec!["alerts".to_string()];
    cfg.default_profile = Some("default".to_string());
    cfg.profiles.push(profile);

    config::save_config(&cfg, ctx.config_path.as_deref())?;

    ctx.console
        .success(&format!("Created starter config at {}", path.display()));
    ctx.console
        .info("Edit the profile URL with 'pling config edit'");
    Ok(())
}
