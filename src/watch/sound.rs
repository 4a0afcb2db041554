use crate::watch::AlertSound;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;
use tracing::{debug, warn};

/// Plays alert sounds through whatever player binary the platform offers,
/// trying each candidate in order. Playback failure never propagates; at
/// most one warning is emitted per player instance.
pub struct SystemSound {
    warned: AtomicBool,
}

impl SystemSound {
    pub fn new() -> Self {
        SystemSound {
            warned: AtomicBool::new(false),
        }
    }
}

impl Default for SystemSound {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertSound for SystemSound {
    async fn play(&self, sound: &Path, device: Option<&str>) {
        for mut cmd in candidate_commands(sound, device) {
            let result = cmd.stdout(Stdio::null()).stderr(Stdio::null()).status().await;
            match result {
                Ok(status) if status.success() => return,
                Ok(status) => debug!("Sound player exited with {}", status),
                Err(e) => debug!("Sound player not available: {}", e),
            }
        }

        if !self.warned.swap(true, Ordering::Relaxed) {
            warn!("Could not play alert sound {}", sound.display());
        }
    }
}

/// Player candidates in fallback order for the current platform
#[cfg(target_os = "macos")]
fn candidate_commands(sound: &Path, _device: Option<&str>) -> Vec<Command> {
    let mut afplay = Command::new("afplay");
    afplay.arg(sound);
    vec![afplay]
}

#[cfg(target_os = "linux")]
fn candidate_commands(sound: &Path, device: Option<&str>) -> Vec<Command> {
    let mut paplay = Command::new("paplay");
    if let Some(d) = device {
        paplay.arg(format!("--device={}", d));
    }
    paplay.arg(sound);

    let mut aplay = Command::new("aplay");
    if let Some(d) = device {
        aplay.arg("-D").arg(d);
    }
    aplay.arg("-q").arg(sound);

    let mut ffplay = Command::new("ffplay");
    ffplay
        .arg("-nodisp")
        .arg("-autoexit")
        .arg("-loglevel")
        .arg("quiet")
        .arg(sound);

    vec![paplay, aplay, ffplay]
}

#[cfg(target_os = "windows")]
fn candidate_commands(sound: &Path, _device: Option<&str>) -> Vec<Command> {
    let mut powershell = Command::new("powershell");
    powershell.arg("-NoProfile").arg("-Command").arg(format!(
        "(New-Object Media.SoundPlayer '{}').PlaySync()",
        sound.display()
    ));
    vec![powershell]
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn candidate_commands(_sound: &Path, _device: Option<&str>) -> Vec<Command> {
    Vec::new()
}

/// Platform default alert sound, used when neither the config nor the
/// command line names one
pub fn default_sound() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        PathBuf::from("/System/Library/Sounds/Ping.aiff")
    }
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/usr/share/sounds/freedesktop/stereo/message-new-instant.oga")
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        PathBuf::from("alert.wav")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(any(target_os = "macos", target_os = "linux", target_os = "windows"))]
    #[test]
    fn test_candidates_exist() {
        assert!(!candidate_commands(Path::new("beep.wav"), None).is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_device_hint_reaches_players() {
        let cmds = candidate_commands(Path::new("beep.wav"), Some("hdmi:0"));
        let args: Vec<String> = cmds[0]
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert!(args.iter().any(|a| a.contains("hdmi:0")));
    }

    #[tokio::test]
    async fn test_play_failure_is_swallowed() {
        let player = SystemSound::new();
        // A path no player can open; both attempts must return quietly
        player.play(Path::new("/nonexistent/beep.wav"), None).await;
        player.play(Path::new("/nonexistent/beep.wav"), None).await;
        assert!(player.warned.load(Ordering::Relaxed));
    }
}
