// Tablet Power Daemon - Control Loop
//
// One call to `ControlLoop::tick` per millisecond. Everything the daemon
// remembers between ticks lives here; the outside world is reached only
// through the `Ports` handed in for the duration of the call.

use crate::battery::BatteryEstimator;
use crate::brightness::BrightnessController;
use crate::config::*;
use crate::display_power::{DisplayPowerStateMachine, DisplayState};
use crate::drivers::{
    ActionSink, BatterySource, CommandSource, DisplayDriver, IdleTimeSource, InputSource,
};
use crate::events::{Action, Commands, Edge, InputId, ShutdownCause, StatusReport, TickOutcome};
use crate::input::DebounceEngine;

/// Borrowed collaborators for one tick.
pub struct Ports<'a> {
    pub inputs: &'a mut dyn InputSource,
    pub battery: &'a mut dyn BatterySource,
    pub idle: &'a mut dyn IdleTimeSource,
    pub display: &'a mut dyn DisplayDriver,
    pub actions: &'a mut dyn ActionSink,
    pub commands: &'a mut dyn CommandSource,
}

const BUTTONS: [InputId; 3] = [InputId::Button1, InputId::Button2, InputId::Button3];

pub struct ControlLoop {
    config: ControlConfig,
    tick: u64,
    inputs: DebounceEngine,
    battery: BatteryEstimator,
    brightness: BrightnessController,
    display: DisplayPowerStateMachine,

    /// Tick after which a held button counts as a long press.
    long_press_at: [u64; 3],
    /// Ticks the low-battery warning has been continuously asserted.
    low_battery_ticks: u32,

    charging: bool,
    charge_complete: bool,
    /// Last applied dashboard settings, also the actual USB/Wi-Fi state.
    settings: Commands,

    last_voltage: Option<f64>,
    last_energy: Option<f64>,
    status: StatusReport,
    finished: Option<ShutdownCause>,
}

impl ControlLoop {
    pub fn new(
        config: ControlConfig,
        calibration: BatteryCalibration,
        brightness_index: usize,
    ) -> Self {
        // Periods are used as divisors.
        let config = ControlConfig {
            command_poll_ticks: config.command_poll_ticks.max(1),
            nudge_period_ticks: config.nudge_period_ticks.max(1),
            ..config
        };
        Self {
            display: DisplayPowerStateMachine::new(&config),
            config,
            tick: 0,
            inputs: DebounceEngine::new(),
            battery: BatteryEstimator::new(calibration),
            brightness: BrightnessController::new(brightness_index),
            long_press_at: [0; 3],
            low_battery_ticks: 0,
            charging: false,
            charge_complete: false,
            settings: Commands::default(),
            last_voltage: None,
            last_energy: None,
            status: StatusReport::default(),
            finished: None,
        }
    }

    /// Run one tick. Once a shutdown has been signalled every later call
    /// returns the same cause without touching any state.
    pub fn tick(&mut self, ports: &mut Ports<'_>) -> TickOutcome {
        if let Some(cause) = self.finished {
            return TickOutcome::Shutdown(cause);
        }

        let tick = self.tick;
        self.tick += 1;

        let outcome = self.step(tick, ports);
        if let TickOutcome::Shutdown(cause) = outcome {
            self.finished = Some(cause);
        }
        outcome
    }

    fn step(&mut self, tick: u64, ports: &mut Ports<'_>) -> TickOutcome {
        let edges = InputId::ALL.map(|id| self.inputs.sample(id, ports.inputs.read(id)));
        let edge = |id: InputId| edges[id.index()];

        if edge(InputId::PowerSwitch) == Edge::Fell {
            return TickOutcome::Shutdown(ShutdownCause::PowerSwitch);
        }

        // ---- Buttons ----
        let mut interaction = false;
        for (slot, id) in BUTTONS.into_iter().enumerate() {
            match edge(id) {
                Edge::Rose => {
                    self.long_press_at[slot] = tick + self.config.long_press_ticks;
                    interaction = true;
                }
                Edge::Fell => {
                    let long = tick > self.long_press_at[slot];
                    self.on_release(id, long, ports.actions);
                }
                Edge::None => {}
            }
        }
        if interaction {
            self.display.force_active(tick, &mut self.brightness);
        }

        // ---- Dashboard settings ----
        if tick % self.config.command_poll_ticks == 0 {
            if let Some(commands) = ports.commands.read_commands() {
                self.apply_commands(commands, ports.actions);
            }
        }

        // ---- Charger ----
        let was_plugged = self.is_plugged_in();
        let mut changed = false;

        match edge(InputId::Charging) {
            Edge::Rose => {
                self.charging = true;
                changed = true;
            }
            Edge::Fell => {
                self.charging = false;
                changed = true;
            }
            Edge::None => {}
        }
        match edge(InputId::Charged) {
            Edge::Rose => {
                log::info!("charging completed");
                self.charge_complete = true;
                changed = true;
            }
            Edge::Fell => {
                self.charge_complete = false;
                changed = true;
            }
            Edge::None => {}
        }

        let plugged = self.is_plugged_in();
        if was_plugged && !plugged {
            log::info!("charger disconnected");
            // Don't dim the moment the cable comes out.
            self.display.postpone(tick);
        } else if !was_plugged && plugged {
            log::info!("charger connected");
        }

        // ---- Battery ----
        let reading = self
            .battery
            .sample(ports.battery.read_battery_bit(), self.charging);

        if tick >= self.battery.capacity() as u64 {
            let voltage = (self.battery.raw_to_voltage(reading.actual) * 100.0).round() / 100.0;
            let energy = self.battery.raw_to_energy_percent(reading.adjusted).round();

            if accept_reading(self.charging, voltage, self.last_voltage, VOLTAGE_TOLERANCE) {
                if self.config.log_battery {
                    log::info!("battery voltage {:1.2}V", voltage);
                }
                self.last_voltage = Some(voltage);
                changed = true;
            }
            if accept_reading(self.charging, energy, self.last_energy, ENERGY_TOLERANCE) {
                if self.config.log_battery {
                    log::info!("energy remaining {:1.0}%", energy);
                }
                self.last_energy = Some(energy);
                changed = true;
            }

            if self.config.log_battery
                && tick % RAW_BATTERY_LOG_TICKS == self.battery.capacity() as u64 % RAW_BATTERY_LOG_TICKS
            {
                log::info!("raw battery {:1.3}", reading.actual);
            }
        }

        self.status = StatusReport {
            voltage: self.last_voltage.unwrap_or(0.0),
            energy_percent: self.last_energy.unwrap_or(0.0),
            charging: self.charging,
            charge_complete: self.charge_complete,
        };

        // Nothing worth showing until the battery has a reading.
        let changed = changed && self.last_voltage.is_some();

        // ---- Idle dimming ----
        if self.display.is_due(tick, plugged) {
            let idle = ports.idle.idle_millis();
            let transition = self.display.evaluate(
                tick,
                idle,
                plugged,
                self.settings.allow_dim,
                &mut self.brightness,
            );
            if let Some(state) = transition {
                log::debug!("display {:?} after {:?} ms idle", state, idle);
                if state == DisplayState::Dark {
                    // Somewhere safe to tap when the screen comes back.
                    perform(ports.actions, Action::ShowDashboard);
                }
            }
        }

        // ---- Low battery ----
        match edge(InputId::LowBattery) {
            Edge::Rose => self.low_battery_ticks = 1,
            Edge::Fell => self.low_battery_ticks = 0,
            Edge::None if self.low_battery_ticks > 0 => {
                self.low_battery_ticks += 1;
                if self.low_battery_ticks >= self.config.low_battery_shutdown_ticks {
                    return TickOutcome::Shutdown(ShutdownCause::LowBattery {
                        voltage: self.status.voltage,
                    });
                }
            }
            Edge::None => {}
        }

        // ---- Backlight fade ----
        if tick % self.config.nudge_period_ticks == 0 {
            self.brightness.nudge(ports.display);
        }

        TickOutcome::Running { changed }
    }

    fn on_release(&mut self, id: InputId, long: bool, actions: &mut dyn ActionSink) {
        match (id, long) {
            (InputId::Button1, false) => perform(actions, Action::ShowKeyboard),
            (InputId::Button1, true) => perform(actions, Action::ShowDashboard),
            (InputId::Button2, false) => self.brightness.set_next(),
            (InputId::Button2, true) => self.brightness.set_max(),
            (InputId::Button3, false) => perform(actions, Action::ToggleMaximized),
            (InputId::Button3, true) => perform(actions, Action::ToggleFullscreen),
            _ => {}
        }
    }

    /// Act on settings edges only. A failed switch leaves the remembered
    /// state alone so the next poll tries again.
    fn apply_commands(&mut self, commands: Commands, actions: &mut dyn ActionSink) {
        self.settings.allow_dim = commands.allow_dim;

        if commands.usb_enabled != self.settings.usb_enabled {
            let on = commands.usb_enabled;
            match actions.perform(Action::SetUsb(on)) {
                Ok(()) => {
                    log::info!("{} USB and Bluetooth", if on { "enabled" } else { "disabled" });
                    self.settings.usb_enabled = on;
                }
                Err(e) => log::debug!("USB power switch failed: {e:#}"),
            }
        }

        if commands.wifi_enabled != self.settings.wifi_enabled {
            let on = commands.wifi_enabled;
            match actions.perform(Action::SetWifi(on)) {
                Ok(()) => {
                    log::info!("{} wifi", if on { "enabled" } else { "disabled" });
                    self.settings.wifi_enabled = on;
                }
                Err(e) => log::debug!("wifi switch failed: {e:#}"),
            }
        }
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn is_plugged_in(&self) -> bool {
        self.charging || self.charge_complete
    }

    pub fn status(&self) -> StatusReport {
        self.status
    }

    pub fn settings(&self) -> Commands {
        self.settings
    }

    pub fn brightness(&self) -> &BrightnessController {
        &self.brightness
    }

    pub fn display_state(&self) -> DisplayState {
        self.display.state()
    }

    pub fn next_idle_check(&self) -> u64 {
        self.display.next_check()
    }

    pub fn low_battery_ticks(&self) -> u32 {
        self.low_battery_ticks
    }
}

fn perform(actions: &mut dyn ActionSink, action: Action) {
    if let Err(e) = actions.perform(action) {
        log::debug!("{:?} failed: {e:#}", action);
    }
}

/// Report a new rounded reading only if it moved the way the charger says
/// it should, or jumped by more than the tolerance the other way.
fn accept_reading(charging: bool, value: f64, last: Option<f64>, tolerance: f64) -> bool {
    let Some(last) = last else {
        return true;
    };
    (charging && value > last) || (!charging && value < last) || (value - last).abs() > tolerance
}
