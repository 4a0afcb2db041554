mod api;
mod cli;
mod config;
mod error;
mod state;
mod ui;
mod watch;

use clap::Parser;
use cli::{Cli, Commands, Ctx};
use error::{ExitStatus, PlingError};
use std::process::ExitCode;
use ui::Console;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.log_format.as_deref());

    let ctx = Ctx {
        console: Console::new(cli.quiet, cli.no_color),
        config_path: cli.config.clone(),
        profile: cli.profile.clone(),
    };

    let result = run_command(&ctx, cli).await;

    match result {
        Ok(status) => status.into(),
        Err(e) => {
            ctx.console.error(&e.to_string());
            e.exit_status().into()
        }
    }
}

async fn run_command(ctx: &Ctx, cli: Cli) -> Result<ExitStatus, PlingError> {
    match cli.command {
        Some(Commands::Watch {
            topic,
            group,
            interval,
            no_sound,
            sound,
            device,
            min_priority,
        }) => {
            cli::run_watch(ctx, topic, group, interval, no_sound, sound, device, min_priority).await
        }

        Some(Commands::Messages {
            topic,
            since,
            mark_read,
            json,
        }) => {
            cli::run_messages(ctx, topic, since, mark_read, json).await?;
            Ok(ExitStatus::Success)
        }

        Some(Commands::Send {
            topic,
            body,
            title,
            priority,
            tags,
            click,
        }) => {
            cli::run_send(ctx, topic, body, title, priority, tags, click).await?;
            Ok(ExitStatus::Success)
        }

        Some(Commands::Unread) => cli::run_unread(ctx).await,

        Some(Commands::MarkRead { topic }) => {
            cli::run_mark_read(ctx, topic)?;
            Ok(ExitStatus::Success)
        }

        Some(Commands::Health) => cli::run_health(ctx).await,

        Some(Commands::Profiles { command }) => {
            cli::run_profiles(ctx, command)?;
            Ok(ExitStatus::Success)
        }

        Some(Commands::Topics { command }) => {
            cli::run_topics(ctx, command)?;
            Ok(ExitStatus::Success)
        }

        Some(Commands::Config { command }) => {
            cli::run_config(ctx, command)?;
            Ok(ExitStatus::Success)
        }

        Some(Commands::State { command }) => {
            cli::run_state(ctx, command)?;
            Ok(ExitStatus::Success)
        }

        Some(Commands::Completions { shell }) => {
            cli::run_completions(shell)?;
            Ok(ExitStatus::Success)
        }

        None => {
            // No command - show help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().ok();
            Ok(ExitStatus::Success)
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool, format: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        Some("json") => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().without_time().with_target(false))
                .init();
        }
    }
}
