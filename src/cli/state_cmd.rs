use crate::cli::{Ctx, StateCommands};
use crate::config;
use crate::error::{PlingError, Result};
use crate::state::{self, ReadState};
use crate::ui;

/// Run state subcommands
pub fn run_state(ctx: &Ctx, command: StateCommands) -> Result<()> {
    match command {
        StateCommands::Show => show_state(),
        StateCommands::Prune => prune_state(ctx),
        StateCommands::Reset { topic } => reset_state(ctx, topic),
        StateCommands::Path => print_path(),
    }
}

fn show_state() -> Result<()> {
    let read_state = state::load_state()?;
    let content = serde_json::to_string_pretty(&read_state)
        .map_err(|e| PlingError::State(format!("Failed to serialize state: {}", e)))?;
    println!("{}", content);
    Ok(())
}

fn prune_state(ctx: &Ctx) -> Result<()> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;
    let mut read_state = state::load_state()?;

    // Keys still backed by a configured profile and watched topic
    let valid_keys: Vec<String> = cfg
        .profiles
        .iter()
        .flat_map(|p| p.topics.iter().map(|t| ReadState::key(&p.name, t)))
        .collect();

    let orphans = read_state.prune_orphans(&valid_keys);

    if orphans.is_empty() {
        ctx.console.info("No orphaned state entries found");
    } else {
        state::save_state(&read_state)?;
        ctx.console
            .success(&format!("Pruned {} orphaned state entries", orphans.len()));
        for key in orphans {
            ctx.console.info(&format!("  Removed: {}", key));
        }
    }

    Ok(())
}

fn reset_state(ctx: &Ctx, topic: Option<String>) -> Result<()> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;
    let profile = cfg.resolve_profile(ctx.profile.as_deref())?;
    let mut read_state = state::load_state()?;

    match topic {
        Some(topic) => {
            if read_state.forget(&profile.name, &topic) {
                state::save_state(&read_state)?;
                ctx.console
                    .success(&format!("Reset read state for '{}'", topic));
            } else {
                ctx.console
                    .info(&format!("No read state for '{}'", topic));
            }
        }
        None => {
            if ui::is_interactive() {
                eprint!("Reset all read state? [y/N] ");
                let mut answer = String::new();
                std::io::stdin().read_line(&mut answer)?;
                if !answer.trim().eq_ignore_ascii_case("y") {
                    ctx.console.info("Cancelled");
                    return Ok(());
                }
            }

            let count = read_state.topics.len();
            read_state.topics.clear();
            state::save_state(&read_state)?;
            ctx.console
                .success(&format!("Reset read state for {} entries", count));
        }
    }

    Ok(())
}

fn print_path() -> Result<()> {
    let path = config::state_path()?;
    println!("{}", path.display());
    Ok(())
}
