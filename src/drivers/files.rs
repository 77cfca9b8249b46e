// Tablet Power Daemon - RAM Disk Files
//
// The dashboard and the daemon talk through two small files on a RAM disk:
// the dashboard writes its settings to the command file and the daemon
// writes battery status to the status file. The command file is copied to
// real storage at shutdown, together with the brightness index, and copied
// back at the next start.

use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use anyhow::Context;

use crate::config::{COMMAND_FILE, COMMAND_SAVE_FILE, STATUS_FILE};
use crate::drivers::{CommandSource, StatusSink};
use crate::events::{Commands, StatusReport};

/// Saved brightness is stored as a letter, `A` for index 0.
const BRIGHTNESS_LETTERS: std::ops::RangeInclusive<u8> = b'A'..=b'I';

// ---------------------------------------------------------------------------
// Dashboard settings
// ---------------------------------------------------------------------------

/// Three whitespace-separated integers: allow dim, USB on, Wi-Fi on.
/// Anything short of three integers is rejected as a whole.
pub fn parse_commands(text: &str) -> Option<Commands> {
    let mut fields = text.split_whitespace().map(|f| f.parse::<i64>().ok());
    let allow_dim = fields.next()??;
    let usb = fields.next()??;
    let wifi = fields.next()??;
    Some(Commands {
        allow_dim: allow_dim != 0,
        usb_enabled: usb != 0,
        wifi_enabled: wifi != 0,
    })
}

pub struct CommandFile {
    path: PathBuf,
}

impl CommandFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for CommandFile {
    fn default() -> Self {
        Self::new(COMMAND_FILE)
    }
}

impl CommandSource for CommandFile {
    fn read_commands(&mut self) -> Option<Commands> {
        let text = fs::read_to_string(&self.path).ok()?;
        parse_commands(&text)
    }
}

// ---------------------------------------------------------------------------
// Battery status
// ---------------------------------------------------------------------------

pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for StatusFile {
    fn default() -> Self {
        Self::new(STATUS_FILE)
    }
}

impl StatusSink for StatusFile {
    fn publish(&mut self, status: &StatusReport) -> anyhow::Result<()> {
        let mut file =
            File::create(&self.path).with_context(|| format!("create {}", self.path.display()))?;
        writeln!(file, "{}", status)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Persistence across restarts
// ---------------------------------------------------------------------------

pub struct SettingsStore {
    live: PathBuf,
    saved: PathBuf,
}

impl SettingsStore {
    pub fn new(live: impl Into<PathBuf>, saved: impl Into<PathBuf>) -> Self {
        Self {
            live: live.into(),
            saved: saved.into(),
        }
    }

    /// Seed the RAM disk command file from the saved copy if it is not
    /// there yet. Returns the saved brightness index, if one was found.
    pub fn restore(&self) -> anyhow::Result<Option<usize>> {
        if self.live.exists() || !self.saved.exists() {
            return Ok(None);
        }

        let saved = fs::read(&self.saved)
            .with_context(|| format!("read {}", self.saved.display()))?;
        let split = saved.iter().position(|b| BRIGHTNESS_LETTERS.contains(b));
        let (commands, brightness) = match split {
            // The dashboard does not need anything past the letter.
            Some(at) => (&saved[..at], Some(usize::from(saved[at] - b'A'))),
            None => (&saved[..], None),
        };

        fs::write(&self.live, commands)
            .with_context(|| format!("write {}", self.live.display()))?;
        fs::set_permissions(&self.live, fs::Permissions::from_mode(0o666))?;
        Ok(brightness)
    }

    /// Copy the RAM disk command file to persistent storage, followed by the
    /// brightness index.
    pub fn save(&self, brightness_index: usize) -> anyhow::Result<()> {
        let commands = fs::read(&self.live)
            .with_context(|| format!("read {}", self.live.display()))?;
        let letter = BRIGHTNESS_LETTERS
            .clone()
            .nth(brightness_index)
            .context("brightness index out of range")?;

        let mut file =
            File::create(&self.saved).with_context(|| format!("create {}", self.saved.display()))?;
        file.write_all(&commands)?;
        writeln!(file, "{}", char::from(letter))?;
        writeln!(file, "Do not edit this file!")?;
        Ok(())
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(COMMAND_FILE, COMMAND_SAVE_FILE)
    }
}
