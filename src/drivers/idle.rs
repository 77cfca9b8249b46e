// Tablet Power Daemon - X11 Idle Time
//
// Asks the X server's screen saver extension how long the user has been
// idle, via `xprintidle`. Only called when the dimming deadline passes, so
// spawning a process is acceptable.

use std::process::{Command, Stdio};

use crate::config::X_DISPLAY;
use crate::drivers::IdleTimeSource;

pub struct XIdleTime {
    display: String,
}

impl XIdleTime {
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
        }
    }

    fn query(&self) -> anyhow::Result<u64> {
        let output = Command::new("xprintidle")
            .env("DISPLAY", &self.display)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()?;
        if !output.status.success() {
            anyhow::bail!("xprintidle exited with {}", output.status);
        }
        parse_idle(&String::from_utf8_lossy(&output.stdout))
    }
}

impl Default for XIdleTime {
    fn default() -> Self {
        Self::new(X_DISPLAY)
    }
}

impl IdleTimeSource for XIdleTime {
    fn idle_millis(&mut self) -> Option<u64> {
        match self.query() {
            Ok(ms) => Some(ms),
            Err(e) => {
                log::debug!("idle time unavailable: {e:#}");
                None
            }
        }
    }
}

fn parse_idle(text: &str) -> anyhow::Result<u64> {
    Ok(text.trim().parse()?)
}
