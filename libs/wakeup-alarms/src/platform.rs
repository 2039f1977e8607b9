//! Desktop platform adapters
//!
//! Notifications and sound playback go through the host's own tools, run as
//! child processes without a shell:
//!
//! | Platform | Notification            | Play                     |
//! |----------|-------------------------|--------------------------|
//! | Linux    | `notify-send`           | `paplay`                 |
//! | macOS    | `osascript`             | `afplay`                 |
//! | Windows  | PowerShell `NotifyIcon` | PowerShell `MediaPlayer` |
//!
//! Players are tracked per alarm in a [`Playback`] table. Stopping an alarm
//! kills only the player started for it; other alarms and other programs'
//! players keep going.
//!
//! Every operation reports success as a `bool` and logs failures itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Sounds shipped with the service; warned about when missing
pub const DEFAULT_SOUNDS: [&str; 3] = ["default", "gentle", "energetic"];

/// File extension of sound files
pub const SOUND_EXTENSION: &str = "mp3";

/// Notification and sound output of the host desktop
#[async_trait]
pub trait DesktopPlatform: Send + Sync {
    fn name(&self) -> &'static str;

    /// Show a desktop notification
    async fn send(&self, title: &str, message: &str) -> bool;

    /// Start the named sound for `alarm_id`; returns once the player is running
    async fn play(&self, alarm_id: i64, sound: &str) -> bool;

    /// Stop the sound started for `alarm_id`, if it is still playing
    async fn stop(&self, alarm_id: i64) -> bool;
}

/// Which adapter to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// Pick from the host OS
    #[default]
    Auto,
    Linux,
    Macos,
    Windows,
    /// Log only
    None,
}

impl PlatformKind {
    /// Replace `Auto` with the host OS; unknown hosts get `None`
    pub fn resolve(self) -> Self {
        match self {
            PlatformKind::Auto => match std::env::consts::OS {
                "linux" => PlatformKind::Linux,
                "macos" => PlatformKind::Macos,
                "windows" => PlatformKind::Windows,
                _ => PlatformKind::None,
            },
            other => other,
        }
    }
}

/// Directory of `<name>.mp3` files
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    dir: PathBuf,
}

impl SoundLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of an existing sound file
    ///
    /// Names that could leave the library directory are rejected.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            warn!("Rejected sound name: {:?}", name);
            return None;
        }

        let path = self.dir.join(format!("{}.{}", name, SOUND_EXTENSION));
        if path.is_file() {
            Some(path)
        } else {
            warn!("Sound file not found: {}", path.display());
            None
        }
    }

    /// Create the directory if needed and return the default sounds it lacks
    pub fn ensure_dir(&self) -> std::io::Result<Vec<&'static str>> {
        std::fs::create_dir_all(&self.dir)?;

        let missing: Vec<&'static str> = DEFAULT_SOUNDS
            .into_iter()
            .filter(|name| {
                !self
                    .dir
                    .join(format!("{}.{}", name, SOUND_EXTENSION))
                    .is_file()
            })
            .collect();

        for name in &missing {
            warn!(
                "Default sound '{}' missing from {}",
                name,
                self.dir.display()
            );
        }
        Ok(missing)
    }
}

/// Build the adapter for `kind`
pub fn select_platform(kind: PlatformKind, sounds: SoundLibrary) -> Arc<dyn DesktopPlatform> {
    let platform: Arc<dyn DesktopPlatform> = match kind.resolve() {
        PlatformKind::Linux => Arc::new(LinuxPlatform::new(sounds)),
        PlatformKind::Macos => Arc::new(MacPlatform::new(sounds)),
        PlatformKind::Windows => Arc::new(WindowsPlatform::new(sounds)),
        PlatformKind::None | PlatformKind::Auto => Arc::new(SilentPlatform),
    };
    info!("Desktop platform: {}", platform.name());
    platform
}

/// Run a program to completion; true on a zero exit status
async fn run_command(program: &str, args: &[&str]) -> bool {
    match Command::new(program).args(args).output().await {
        Ok(output) if output.status.success() => true,
        Ok(output) => {
            warn!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            false
        },
        Err(e) => {
            warn!("Failed to run {}: {}", program, e);
            false
        },
    }
}

/// Sound players started by this service, keyed by alarm id
#[derive(Debug, Default)]
pub struct Playback {
    players: Mutex<HashMap<i64, Child>>,
}

impl Playback {
    /// Spawn a player for `alarm_id`, replacing (and killing) its previous one
    pub async fn start(&self, alarm_id: i64, program: &str, args: &[&str]) -> bool {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start {}: {}", program, e);
                return false;
            },
        };

        let mut players = self.players.lock().await;
        players.retain(|_, player| matches!(player.try_wait(), Ok(None)));
        players.insert(alarm_id, child);
        debug!("{} playing for alarm {}", program, alarm_id);
        true
    }

    /// Kill the player of `alarm_id`; true when nothing of it is left playing
    pub async fn stop(&self, alarm_id: i64) -> bool {
        let Some(mut child) = self.players.lock().await.remove(&alarm_id) else {
            debug!("No sound playing for alarm {}", alarm_id);
            return true;
        };

        if let Ok(Some(_)) = child.try_wait() {
            return true;
        }
        match child.kill().await {
            Ok(()) => {
                debug!("Stopped sound for alarm {}", alarm_id);
                true
            },
            Err(e) => {
                warn!("Failed to stop sound for alarm {}: {}", alarm_id, e);
                false
            },
        }
    }
}

/// Linux desktop (libnotify + PulseAudio)
#[derive(Debug)]
pub struct LinuxPlatform {
    sounds: SoundLibrary,
    playback: Playback,
}

impl LinuxPlatform {
    pub fn new(sounds: SoundLibrary) -> Self {
        Self {
            sounds,
            playback: Playback::default(),
        }
    }
}

#[async_trait]
impl DesktopPlatform for LinuxPlatform {
    fn name(&self) -> &'static str {
        "linux"
    }

    async fn send(&self, title: &str, message: &str) -> bool {
        run_command("notify-send", &[title, message]).await
    }

    async fn play(&self, alarm_id: i64, sound: &str) -> bool {
        let Some(path) = self.sounds.resolve(sound) else {
            return false;
        };
        let path = path.to_string_lossy();
        self.playback.start(alarm_id, "paplay", &[&*path]).await
    }

    async fn stop(&self, alarm_id: i64) -> bool {
        self.playback.stop(alarm_id).await
    }
}

/// macOS desktop
#[derive(Debug)]
pub struct MacPlatform {
    sounds: SoundLibrary,
    playback: Playback,
}

impl MacPlatform {
    pub fn new(sounds: SoundLibrary) -> Self {
        Self {
            sounds,
            playback: Playback::default(),
        }
    }
}

/// Quote text for an AppleScript string literal
fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn notification_script(title: &str, message: &str) -> String {
    format!(
        "display notification \"{}\" with title \"{}\"",
        applescript_escape(message),
        applescript_escape(title)
    )
}

#[async_trait]
impl DesktopPlatform for MacPlatform {
    fn name(&self) -> &'static str {
        "macos"
    }

    async fn send(&self, title: &str, message: &str) -> bool {
        let script = notification_script(title, message);
        run_command("osascript", &["-e", &script]).await
    }

    async fn play(&self, alarm_id: i64, sound: &str) -> bool {
        let Some(path) = self.sounds.resolve(sound) else {
            return false;
        };
        let path = path.to_string_lossy();
        self.playback.start(alarm_id, "afplay", &[&*path]).await
    }

    async fn stop(&self, alarm_id: i64) -> bool {
        self.playback.stop(alarm_id).await
    }
}

/// Windows desktop, driven through PowerShell
#[derive(Debug)]
pub struct WindowsPlatform {
    sounds: SoundLibrary,
    playback: Playback,
}

impl WindowsPlatform {
    pub fn new(sounds: SoundLibrary) -> Self {
        Self {
            sounds,
            playback: Playback::default(),
        }
    }
}

/// Quote text for a single-quoted PowerShell string
fn powershell_escape(text: &str) -> String {
    text.replace('\'', "''")
}

fn balloon_script(title: &str, message: &str) -> String {
    format!(
        "Add-Type -AssemblyName System.Windows.Forms; \
         $n = New-Object System.Windows.Forms.NotifyIcon; \
         $n.Icon = [System.Drawing.SystemIcons]::Information; \
         $n.BalloonTipTitle = '{}'; \
         $n.BalloonTipText = '{}'; \
         $n.Visible = $true; \
         $n.ShowBalloonTip(10000); \
         Start-Sleep -Seconds 5; \
         $n.Dispose()",
        powershell_escape(title),
        powershell_escape(message)
    )
}

fn media_player_script(path: &Path) -> String {
    format!(
        "Add-Type -AssemblyName PresentationCore; \
         $p = New-Object System.Windows.Media.MediaPlayer; \
         $p.Open([uri]'{}'); \
         while (-not $p.NaturalDuration.HasTimeSpan) {{ Start-Sleep -Milliseconds 100 }}; \
         $p.Play(); \
         Start-Sleep -Seconds ([math]::Ceiling($p.NaturalDuration.TimeSpan.TotalSeconds)); \
         $p.Close()",
        powershell_escape(&path.to_string_lossy())
    )
}

#[async_trait]
impl DesktopPlatform for WindowsPlatform {
    fn name(&self) -> &'static str {
        "windows"
    }

    async fn send(&self, title: &str, message: &str) -> bool {
        let script = balloon_script(title, message);
        run_command("powershell", &["-NoProfile", "-Command", &script]).await
    }

    async fn play(&self, alarm_id: i64, sound: &str) -> bool {
        let Some(path) = self.sounds.resolve(sound) else {
            return false;
        };
        let path = std::path::absolute(&path).unwrap_or(path);
        let script = media_player_script(&path);
        self.playback
            .start(alarm_id, "powershell", &["-NoProfile", "-Command", &script])
            .await
    }

    // MediaPlayer lives in the PowerShell process, so killing it ends playback
    async fn stop(&self, alarm_id: i64) -> bool {
        self.playback.stop(alarm_id).await
    }
}

/// Logs instead of touching the desktop
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPlatform;

#[async_trait]
impl DesktopPlatform for SilentPlatform {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn send(&self, title: &str, message: &str) -> bool {
        info!("Notification (not shown): {} - {}", title, message);
        false
    }

    async fn play(&self, alarm_id: i64, sound: &str) -> bool {
        info!("Sound for alarm {} (not played): {}", alarm_id, sound);
        false
    }

    async fn stop(&self, _alarm_id: i64) -> bool {
        true
    }
}
