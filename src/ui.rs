use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal output settings, constructed once in main and threaded through
/// every command. Nothing here is global: two consoles with different
/// settings can coexist in the same process.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    pub quiet: bool,
    pub color: bool,
}

impl Console {
    pub fn new(quiet: bool, no_color: bool) -> Self {
        let color = !no_color && atty::is(atty::Stream::Stdout);
        Console { quiet, color }
    }

    /// Print a success message (suppressed in quiet mode)
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", self.paint_green("✓"), message);
        }
    }

    /// Print an error message (always shown, even in quiet mode)
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.paint_red("✗"), message);
    }

    /// Print a warning message (suppressed in quiet mode)
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", self.paint_yellow("!"), message);
        }
    }

    /// Print an info message (suppressed in quiet mode)
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", self.paint_blue("→"), message);
        }
    }

    /// Print a blank line (suppressed in quiet mode)
    pub fn blank(&self) {
        if !self.quiet {
            println!();
        }
    }

    /// Start a spinner, or nothing in quiet/non-TTY mode
    pub fn spinner(&self, message: &str) -> Option<Spinner> {
        if self.quiet || !atty::is(atty::Stream::Stderr) {
            None
        } else {
            Some(Spinner::new(message))
        }
    }

    fn paint_green(&self, s: &str) -> String {
        if self.color {
            style(s).green().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_red(&self, s: &str) -> String {
        if self.color {
            style(s).red().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_yellow(&self, s: &str) -> String {
        if self.color {
            style(s).yellow().to_string()
        } else {
            s.to_string()
        }
    }

    fn paint_blue(&self, s: &str) -> String {
        if self.color {
            style(s).blue().to_string()
        } else {
            s.to_string()
        }
    }
}

/// A progress spinner shown during network calls
pub struct Spinner {
    progress: ProgressBar,
}

impl Spinner {
    fn new(message: &str) -> Self {
        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        progress.set_message(message.to_string());
        progress.enable_steady_tick(Duration::from_millis(100));
        Spinner { progress }
    }

    /// Stop the spinner and clear it
    pub fn finish_and_clear(&self) {
        self.progress.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.progress.is_finished() {
            self.progress.finish_and_clear();
        }
    }
}

/// Check if running in a TTY
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

/// Truncate a string for column display
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-ten", 11), "exactly-ten");
        assert_eq!(truncate("much too long for this", 8), "much to…");
    }

    #[test]
    fn test_console_settings_are_independent() {
        let a = Console { quiet: true, color: false };
        let b = Console { quiet: false, color: true };
        assert!(a.quiet);
        assert!(!b.quiet);
    }
}
