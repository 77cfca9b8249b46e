// Tablet Power Daemon - Window Manager & Peripheral Actions
//
// Window actions go through `wmctrl`. A fullscreen window hides everything
// on top of it, so fullscreen is dropped before bringing another window
// forward or toggling maximization.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::Context;

use crate::config::USB_POWER_FILE;
use crate::drivers::ActionSink;
use crate::events::Action;

const REMOVE_FULLSCREEN: &[&str] = &["wmctrl", "-r", ":ACTIVE:", "-b", "remove,fullscreen"];
/// The dashboard's window title.
const DASHBOARD_TITLE: &str = "%";
const KEYBOARD_TITLE: &str = "xvkbd";

pub struct ShellActions {
    usb_power: PathBuf,
}

impl ShellActions {
    pub fn new(usb_power: impl Into<PathBuf>) -> Self {
        Self {
            usb_power: usb_power.into(),
        }
    }

    fn set_usb_power(&self, on: bool) -> anyhow::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.usb_power)
            .with_context(|| format!("open {}", self.usb_power.display()))?;
        writeln!(file, "{}", u8::from(on))?;
        Ok(())
    }
}

impl Default for ShellActions {
    fn default() -> Self {
        Self::new(USB_POWER_FILE)
    }
}

impl ActionSink for ShellActions {
    fn perform(&mut self, action: Action) -> anyhow::Result<()> {
        match action {
            Action::SetUsb(on) => {
                self.set_usb_power(on)?;
                if !on {
                    // lxpanel spins at 100% CPU when the USB sound card
                    // disappears under it; a restart calms it down.
                    let _ = run(&["/usr/bin/lxpanelctl", "restart"]);
                }
                Ok(())
            }
            other => {
                for argv in command_plan(other) {
                    run(&argv)?;
                }
                Ok(())
            }
        }
    }
}

/// Commands that carry out a window or radio action, in order.
pub fn command_plan(action: Action) -> Vec<Vec<&'static str>> {
    match action {
        Action::ShowKeyboard => vec![REMOVE_FULLSCREEN.to_vec(), vec!["wmctrl", "-a", KEYBOARD_TITLE]],
        Action::ShowDashboard => vec![REMOVE_FULLSCREEN.to_vec(), vec!["wmctrl", "-a", DASHBOARD_TITLE]],
        Action::ToggleMaximized => vec![
            REMOVE_FULLSCREEN.to_vec(),
            vec!["wmctrl", "-r", ":ACTIVE:", "-b", "toggle,maximized_vert,maximized_horz"],
        ],
        Action::ToggleFullscreen => vec![vec!["wmctrl", "-r", ":ACTIVE:", "-b", "toggle,fullscreen"]],
        Action::SetWifi(false) => vec![vec!["/sbin/iwconfig", "wlan0", "txpower", "off"]],
        // The driver only takes it the second time.
        Action::SetWifi(true) => vec![
            vec!["/sbin/iwconfig", "wlan0", "txpower", "auto"],
            vec!["/sbin/iwconfig", "wlan0", "txpower", "auto"],
        ],
        Action::SetUsb(_) => Vec::new(),
    }
}

fn run(argv: &[&str]) -> anyhow::Result<()> {
    let (program, args) = argv.split_first().context("empty command")?;
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("spawn {}", program))?;
    if !status.success() {
        anyhow::bail!("{} exited with {}", argv.join(" "), status);
    }
    Ok(())
}
