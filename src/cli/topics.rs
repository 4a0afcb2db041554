use crate::cli::{Ctx, TopicsCommands};
use crate::config::{self, validate_topic_name};
use crate::error::{PlingError, Result};
use crate::state;
use crate::ui::truncate;
use chrono::{TimeZone, Utc};

/// Run topics subcommands
pub fn run_topics(ctx: &Ctx, command: TopicsCommands) -> Result<()> {
    match command {
        TopicsCommands::List => list_topics(ctx),
        TopicsCommands::Add { topic } => add_topic(ctx, topic),
        TopicsCommands::Remove { topic } => remove_topic(ctx, &topic),
        TopicsCommands::Groups => list_groups(ctx),
        TopicsCommands::GroupSet { name, topics } => set_group(ctx, name, topics),
        TopicsCommands::GroupRemove { name } => remove_group(ctx, &name),
    }
}

fn list_topics(ctx: &Ctx) -> Result<()> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;
    let profile = cfg.resolve_profile(ctx.profile.as_deref())?;
    let read_state = state::load_state()?;

    if profile.topics.is_empty() {
        ctx.console.info("No watched topics");
        ctx.console.info("Use 'pling topics add' to watch one");
        return Ok(());
    }

    println!("{:<24} {}", "TOPIC", "LAST READ");
    println!("{}", "-".repeat(48));

    for topic in &profile.topics {
        let last_read = read_state.last_read(&profile.name, topic);
        let label = if last_read == 0 {
            "never".to_string()
        } else {
            match Utc.timestamp_opt(last_read, 0) {
                chrono::LocalResult::Single(t) => t.format("%Y-%m-%d %H:%M").to_string(),
                _ => last_read.to_string(),
            }
        };
        println!("{:<24} {}", truncate(topic, 22), label);
    }

    Ok(())
}

fn add_topic(ctx: &Ctx, topic: String) -> Result<()> {
    let mut cfg = config::load_config(ctx.config_path.as_deref())?;
    let name = cfg.resolve_profile(ctx.profile.as_deref())?.name.clone();
    let profile = cfg
        .find_profile_mut(&name)
        .ok_or_else(|| PlingError::ProfileNotFound(name.clone()))?;

    validate_topic_name(&topic).map_err(PlingError::ConfigInvalid)?;
    if profile.watches(&topic) {
        return Err(PlingError::TopicExists(topic));
    }

    profile.topics.push(topic.clone());
    config::save_config(&cfg, ctx.config_path.as_deref())?;

    ctx.console.success(&format!("Watching '{}'", topic));
    Ok(())
}

fn remove_topic(ctx: &Ctx, topic: &str) -> Result<()> {
    let mut cfg = config::load_config(ctx.config_path.as_deref())?;
    let name = cfg.resolve_profile(ctx.profile.as_deref())?.name.clone();
    let profile = cfg
        .find_profile_mut(&name)
        .ok_or_else(|| PlingError::ProfileNotFound(name.clone()))?;

    if !profile.watches(topic) {
        return Err(PlingError::TopicNotFound(topic.to_string()));
    }

    profile.topics.retain(|t| t != topic);
    // Groups must only reference watched topics
    for members in profile.groups.values_mut() {
        members.retain(|t| t != topic);
    }
    profile.groups.retain(|_, members| !members.is_empty());
    config::save_config(&cfg, ctx.config_path.as_deref())?;

    ctx.console.success(&format!("Stopped watching '{}'", topic));
    Ok(())
}

fn list_groups(ctx: &Ctx) -> Result<()> {
    let cfg = config::load_config(ctx.config_path.as_deref())?;
    let profile = cfg.resolve_profile(ctx.profile.as_deref())?;

    if profile.groups.is_empty() {
        ctx.console.info("No groups defined");
        return Ok(());
    }

    for (name, members) in &profile.groups {
        println!("{}: {}", name, members.join(", "));
    }

    Ok(())
}

fn set_group(ctx: &Ctx, name: String, topics: Vec<String>) -> Result<()> {
    let mut cfg = config::load_config(ctx.config_path.as_deref())?;
    let profile_name = cfg.resolve_profile(ctx.profile.as_deref())?.name.clone();
    let profile = cfg
        .find_profile_mut(&profile_name)
        .ok_or_else(|| PlingError::ProfileNotFound(profile_name.clone()))?;

    // Boundary invariant: every member must already be a watched topic
    for topic in &topics {
        if !profile.watches(topic) {
            return Err(PlingError::TopicNotFound(topic.clone()));
        }
    }

    profile.groups.insert(name.clone(), topics);
    config::save_config(&cfg, ctx.config_path.as_deref())?;

    ctx.console.success(&format!("Group '{}' saved", name));
    Ok(())
}

fn remove_group(ctx: &Ctx, name: &str) -> Result<()> {
    let mut cfg = config::load_config(ctx.config_path.as_deref())?;
    let profile_name = cfg.resolve_profile(ctx.profile.as_deref())?.name.clone();
    let profile = cfg
        .find_profile_mut(&profile_name)
        .ok_or_else(|| PlingError::ProfileNotFound(profile_name.clone()))?;

    if profile.groups.remove(name).is_none() {
        return Err(PlingError::GroupNotFound(name.to_string()));
    }
    config::save_config(&cfg, ctx.config_path.as_deref())?;

    ctx.console.success(&format!("Group '{}' removed", name));
    Ok(())
}
