// In-memory stand-ins for the tablet hardware.

#![allow(dead_code)]

use tabletd::config::{BatteryCalibration, ControlConfig};
use tabletd::control::{ControlLoop, Ports};
use tabletd::drivers::{
    ActionSink, BatterySource, CommandSource, DisplayDriver, IdleTimeSource, InputSource,
    StatusSink,
};
use tabletd::events::{Action, Commands, InputId, ShutdownCause, StatusReport, TickOutcome};

#[derive(Default)]
pub struct Pins {
    pub levels: [bool; InputId::COUNT],
}

impl InputSource for Pins {
    fn read(&mut self, id: InputId) -> bool {
        self.levels[id.index()]
    }
}

/// Alternates 1, 0, 1, ... which matches the seeded window: a steady 50%.
#[derive(Default)]
pub struct Comparator {
    pub reads: usize,
}

impl BatterySource for Comparator {
    fn read_battery_bit(&mut self) -> bool {
        self.reads += 1;
        self.reads % 2 == 1
    }
}

pub struct Idle {
    pub millis: Option<u64>,
    pub queries: usize,
}

impl IdleTimeSource for Idle {
    fn idle_millis(&mut self) -> Option<u64> {
        self.queries += 1;
        self.millis
    }
}

#[derive(Default)]
pub struct Backlight {
    pub writes: Vec<u32>,
}

impl DisplayDriver for Backlight {
    fn set_brightness(&mut self, level: u32) -> anyhow::Result<()> {
        self.writes.push(level);
        Ok(())
    }
}

#[derive(Default)]
pub struct Actions {
    pub log: Vec<Action>,
    pub fail_usb: bool,
}

impl Actions {
    pub fn count(&self, action: Action) -> usize {
        self.log.iter().filter(|a| **a == action).count()
    }
}

impl ActionSink for Actions {
    fn perform(&mut self, action: Action) -> anyhow::Result<()> {
        self.log.push(action);
        if self.fail_usb && matches!(action, Action::SetUsb(_)) {
            anyhow::bail!("bus power file missing");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct Dashboard {
    pub commands: Option<Commands>,
    pub reads: usize,
}

impl CommandSource for Dashboard {
    fn read_commands(&mut self) -> Option<Commands> {
        self.reads += 1;
        self.commands
    }
}

#[derive(Default)]
pub struct Published {
    pub reports: Vec<StatusReport>,
}

impl StatusSink for Published {
    fn publish(&mut self, status: &StatusReport) -> anyhow::Result<()> {
        self.reports.push(*status);
        Ok(())
    }
}

/// A control loop wired to fakes, power switch on.
pub struct Rig {
    pub pins: Pins,
    pub battery: Comparator,
    pub idle: Idle,
    pub backlight: Backlight,
    pub actions: Actions,
    pub dashboard: Dashboard,
    pub control: ControlLoop,
}

impl Rig {
    pub fn new(config: ControlConfig) -> Self {
        let mut pins = Pins::default();
        pins.levels[InputId::PowerSwitch.index()] = true;
        Self {
            pins,
            battery: Comparator::default(),
            idle: Idle {
                millis: Some(0),
                queries: 0,
            },
            backlight: Backlight::default(),
            actions: Actions::default(),
            dashboard: Dashboard::default(),
            control: ControlLoop::new(config, BatteryCalibration::default(), 4),
        }
    }

    pub fn set(&mut self, id: InputId, on: bool) {
        self.pins.levels[id.index()] = on;
    }

    pub fn tick(&mut self) -> TickOutcome {
        let mut ports = Ports {
            inputs: &mut self.pins,
            battery: &mut self.battery,
            idle: &mut self.idle,
            display: &mut self.backlight,
            actions: &mut self.actions,
            commands: &mut self.dashboard,
        };
        self.control.tick(&mut ports)
    }

    /// Run `n` ticks; returns whether any reported a change. Panics on
    /// an unexpected shutdown.
    pub fn run(&mut self, n: u64) -> bool {
        let mut changed = false;
        for _ in 0..n {
            match self.tick() {
                TickOutcome::Running { changed: c } => changed |= c,
                TickOutcome::Shutdown(cause) => {
                    panic!("unexpected shutdown at tick {}: {:?}", self.control.ticks(), cause)
                }
            }
        }
        changed
    }

    /// Run until shutdown, at most `limit` ticks. Returns the cause and the
    /// tick it fired on.
    pub fn run_until_shutdown(&mut self, limit: u64) -> Option<(ShutdownCause, u64)> {
        for _ in 0..limit {
            if let TickOutcome::Shutdown(cause) = self.tick() {
                return Some((cause, self.control.ticks() - 1));
            }
        }
        None
    }

    /// Hold an input for `ticks`, then release it for the debounce window.
    pub fn press(&mut self, id: InputId, ticks: u64) {
        self.set(id, true);
        self.run(ticks);
        self.set(id, false);
        self.run(8);
    }
}
