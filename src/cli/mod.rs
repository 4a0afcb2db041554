mod completions;
mod config_cmd;
mod health;
mod mark_read;
mod messages;
mod profiles;
mod send;
mod state_cmd;
mod topics;
mod unread;
mod watch;

pub use completions::run_completions;
pub use config_cmd::run_config;
pub use health::run_health;
pub use mark_read::run_mark_read;
pub use messages::run_messages;
pub use profiles::run_profiles;
pub use send::run_send;
pub use state_cmd::run_state;
pub use topics::run_topics;
pub use unread::run_unread;
pub use watch::run_watch;

use crate::ui::Console;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Per-invocation context threaded through every command
pub struct Ctx {
    pub console: Console,
    pub config_path: Option<PathBuf>,
    pub profile: Option<String>,
}

#[derive(Parser)]
#[command(name = "pling")]
#[command(author, version, about = "Fetch, send, and watch topics on a push notification server")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (can repeat: -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log output format: text (default) or json
    #[arg(long, value_name = "FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Server profile to use (default: config default_profile)
    #[arg(short = 'P', long, value_name = "NAME", global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll topics continuously and alert on new messages
    Watch {
        /// Watch only this topic (default: all watched topics)
        topic: Option<String>,

        /// Watch the topics of a named group instead
        #[arg(short, long, value_name = "NAME", conflicts_with = "topic")]
        group: Option<String>,

        /// Poll interval in seconds
        #[arg(short, long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Never play the alert sound
        #[arg(long)]
        no_sound: bool,

        /// Alert sound file to play
        #[arg(long, value_name = "PATH")]
        sound: Option<PathBuf>,

        /// Output device hint for the sound player
        #[arg(long, value_name = "NAME")]
        device: Option<String>,

        /// Minimum batch priority (1-5) that triggers the sound
        #[arg(long, value_name = "PRIORITY", value_parser = clap::value_parser!(u8).range(1..=5))]
        min_priority: Option<u8>,
    },

    /// Fetch messages from a topic
    Messages {
        /// Topic to fetch (default: the profile's default topic)
        topic: Option<String>,

        /// Lower bound: 'all', a Unix timestamp, or a duration like 10m
        #[arg(long, default_value = "all")]
        since: String,

        /// Advance the read state past the fetched messages
        #[arg(long)]
        mark_read: bool,

        /// Output raw JSON records
        #[arg(long)]
        json: bool,
    },

    /// Send a notification to a topic
    Send {
        /// Target topic (default: the profile's default topic)
        #[arg(short, long, value_name = "TOPIC")]
        topic: Option<String>,

        /// Message body
        body: String,

        /// Message title
        #[arg(long)]
        title: Option<String>,

        /// Priority 1-5
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
        priority: Option<u8>,

        /// Comma-separated tag list
        #[arg(long, value_name = "TAGS")]
        tags: Option<String>,

        /// Click-through URL
        #[arg(long, value_name = "URL")]
        click: Option<String>,
    },

    /// Show unread message counts across watched topics
    Unread,

    /// Mark topics as read up to now
    MarkRead {
        /// Topic to mark (default: all watched topics)
        topic: Option<String>,
    },

    /// Check server health for all profiles
    Health,

    /// Manage server profiles
    Profiles {
        #[command(subcommand)]
        command: ProfilesCommands,
    },

    /// Manage watched topics and groups
    Topics {
        #[command(subcommand)]
        command: TopicsCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage read state
    State {
        #[command(subcommand)]
        command: StateCommands,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProfilesCommands {
    /// List all profiles
    List,

    /// Add a new profile
    Add {
        /// Profile name
        name: String,

        /// Server base URL
        url: String,

        /// Username for basic auth
        #[arg(long, requires = "password_command")]
        username: Option<String>,

        /// Command that prints the basic-auth password
        #[arg(long, requires = "username")]
        password_command: Option<String>,

        /// Command that prints a bearer token
        #[arg(long, conflicts_with_all = ["username", "password_command"])]
        token_command: Option<String>,

        /// Default topic for send/messages
        #[arg(long, value_name = "TOPIC")]
        default_topic: Option<String>,
    },

    /// Remove a profile
    Remove {
        /// Profile name
        name: String,
    },

    /// Show one profile (secrets redacted)
    Show {
        /// Profile name (default: the resolved profile)
        name: Option<String>,
    },

    /// Set the default profile
    SetDefault {
        /// Profile name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum TopicsCommands {
    /// List watched topics with read state
    List,

    /// Add a topic to the watch list
    Add {
        /// Topic name
        topic: String,
    },

    /// Remove a topic from the watch list
    Remove {
        /// Topic name
        topic: String,
    },

    /// List topic groups
    Groups,

    /// Create or replace a topic group
    GroupSet {
        /// Group name
        name: String,

        /// Member topics (must already be watched)
        #[arg(required = true)]
        topics: Vec<String>,
    },

    /// Remove a topic group
    GroupRemove {
        /// Group name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show config (secrets redacted)
    Show,

    /// Open config in $EDITOR
    Edit,

    /// Validate config file
    Validate,

    /// Print config file path
    Path,

    /// Create a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum StateCommands {
    /// Show current read state
    Show,

    /// Remove entries for profiles/topics no longer in config
    Prune,

    /// Reset read state for a topic (or all topics if omitted)
    Reset {
        /// Topic name
        topic: Option<String>,
    },

    /// Print state file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_watch_flags_parse() {
        let cli = Cli::parse_from([
            "pling", "watch", "alerts", "--interval", "30", "--no-sound", "--min-priority", "4",
        ]);
        match cli.command {
            Some(Commands::Watch {
                topic,
                interval,
                no_sound,
                min_priority,
                ..
            }) => {
                assert_eq!(topic.as_deref(), Some("alerts"));
                assert_eq!(interval, Some(30));
                assert!(no_sound);
                assert_eq!(min_priority, Some(4));
            }
            _ => panic!("expected watch command"),
        }
    }

    #[test]
    fn test_watch_rejects_zero_interval() {
        assert!(Cli::try_parse_from(["pling", "watch", "--interval", "0"]).is_err());
    }

    #[test]
    fn test_send_rejects_out_of_range_priority() {
        assert!(Cli::try_parse_from(["pling", "send", "hello", "--priority", "6"]).is_err());
    }
}
