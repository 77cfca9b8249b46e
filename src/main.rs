// Tablet Power Daemon - Entry Point
//
// Start-up sequence:
//   1. Stop any instance that is already running (and exit, with -k).
//   2. Claim the GPIO inputs, so a wiring or permission problem shows up on
//      the terminal before detaching.
//   3. Detach into the background unless -n was given.
//   4. Record the PID, rotate the log, restore the dashboard settings.
//   5. Run the tick loop until the power switch is turned off or the
//      battery has been low for a full minute.
//   6. Save the settings and power the system off.

use std::fs;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{self, Command, Stdio};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use tabletd::config::*;
use tabletd::control::{ControlLoop, Ports};
use tabletd::drivers::backlight::SysfsBacklight;
use tabletd::drivers::files::{CommandFile, SettingsStore, StatusFile};
use tabletd::drivers::gpio::{self, BatteryMonitor, GpioInputs};
use tabletd::drivers::idle::XIdleTime;
use tabletd::drivers::shell::ShellActions;
use tabletd::logging::{self, FileLogger};
use tabletd::tasks::tick::tick_task;

#[derive(Debug, Parser)]
#[command(name = "tabletd")]
#[command(about = "Battery, power switch, button, and backlight daemon for the Pi tablet")]
struct Cli {
    /// Log detailed battery readings
    #[arg(short = 'b', long)]
    log_battery: bool,
    /// Kill the running daemon and exit
    #[arg(short = 'k', long)]
    kill: bool,
    /// Do not become a daemon, remain in the foreground
    #[arg(short = 'n', long)]
    foreground: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    FileLogger::new(LOG_FILE, LevelFilter::Info, cli.foreground).init()?;

    // ---- Single instance ----------------------------------------------------
    kill_running_instance(Path::new(PID_FILE));
    if cli.kill {
        return Ok(());
    }

    // ---- Hardware -----------------------------------------------------------
    let controller = gpio::open()?;
    let mut inputs = GpioInputs::new(&controller)?;
    let mut battery = BatteryMonitor::new(&controller)?;

    if !cli.foreground {
        drop((inputs, battery));
        detach(&cli)?;
        return Ok(());
    }

    fs::write(PID_FILE, format!("{}\n", process::id()))
        .with_context(|| format!("unable to record process ID in {}", PID_FILE))?;

    logging::rotate(Path::new(LOG_FILE), LOG_ROTATIONS);
    log::info!("starting with pid={}", process::id());

    // ---- Settings -----------------------------------------------------------
    let settings = SettingsStore::default();
    let brightness_index = match settings.restore() {
        Ok(index) => index.unwrap_or(0),
        Err(e) => {
            log::warn!("settings not restored: {e:#}");
            0
        }
    };

    let config = ControlConfig {
        log_battery: cli.log_battery,
        ..ControlConfig::default()
    };
    let mut control = ControlLoop::new(config, BatteryCalibration::default(), brightness_index);

    // ---- Tick loop ----------------------------------------------------------
    let mut backlight = SysfsBacklight::default();
    let mut idle = XIdleTime::default();
    let mut actions = ShellActions::default();
    let mut commands = CommandFile::default();
    let mut status = StatusFile::default();

    let cause = {
        let mut ports = Ports {
            inputs: &mut inputs,
            battery: &mut battery,
            idle: &mut idle,
            display: &mut backlight,
            actions: &mut actions,
            commands: &mut commands,
        };
        tick_task(
            &mut control,
            &mut ports,
            &mut status,
            Duration::from_micros(TICK_SLEEP_US),
        )
    };
    log::info!("{}", cause);

    // ---- Shutdown -----------------------------------------------------------
    if let Err(e) = settings.save(control.brightness().current_index()) {
        log::warn!("settings not saved: {e:#}");
    }
    let _ = fs::remove_file(PID_FILE);

    Command::new("/sbin/shutdown")
        .arg("now")
        .status()
        .context("failed to run shutdown")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Lifecycle helpers
// ---------------------------------------------------------------------------

/// Send SIGINT to the process named in the PID file, then remove the file.
fn kill_running_instance(pid_file: &Path) {
    let Ok(text) = fs::read_to_string(pid_file) else {
        return;
    };
    if let Ok(pid) = text.trim().parse::<u32>() {
        let killed = Command::new("kill")
            .args(["-INT", &pid.to_string()])
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if killed {
            log::info!("killed {}", pid);
        }
    }
    let _ = fs::remove_file(pid_file);
}

/// Re-launch this executable in the foreground mode, detached from the
/// terminal, and let the caller exit.
fn detach(cli: &Cli) -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("cannot locate own executable")?;
    let mut command = Command::new(exe);
    command.arg("--foreground");
    if cli.log_battery {
        command.arg("--log-battery");
    }
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .context("failed to become a daemon")?;
    Ok(())
}
