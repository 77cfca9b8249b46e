// Tablet Power Daemon - Idle Display Dimming
//
// After a stretch of inactivity on battery the backlight is dimmed, and
// after a further stretch it is turned off. Any activity, plugging in the
// charger, or the dashboard disallowing dimming brings it back.
//
// Querying the idle time goes through the X server, so the machine is only
// evaluated once a tick deadline has passed. A tick is about a millisecond,
// so idle thresholds in milliseconds double as tick offsets.

use crate::brightness::BrightnessController;
use crate::config::ControlConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Active,
    Dim,
    Dark,
}

#[derive(Debug, Clone)]
pub struct DisplayPowerStateMachine {
    state: DisplayState,
    next_check: u64,
    idle_to_dim: u64,
    dim_to_dark: u64,
    recovery: u64,
}

impl DisplayPowerStateMachine {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            state: DisplayState::Active,
            next_check: config.idle_to_dim_ms,
            idle_to_dim: config.idle_to_dim_ms,
            dim_to_dark: config.dim_to_dark_ms,
            recovery: config.idle_recovery_ticks,
        }
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn next_check(&self) -> u64 {
        self.next_check
    }

    /// Whether [`evaluate`](Self::evaluate) should run this tick. While
    /// active on external power there is nothing to do, so the idle time is
    /// not even queried.
    pub fn is_due(&self, tick: u64, plugged_in: bool) -> bool {
        tick > self.next_check && (self.state != DisplayState::Active || !plugged_in)
    }

    /// Run one transition. `idle_ms` of `None` means the idle time is
    /// unavailable, which counts as not idle. Returns the new state if it
    /// changed.
    pub fn evaluate(
        &mut self,
        tick: u64,
        idle_ms: Option<u64>,
        plugged_in: bool,
        allow_dim: bool,
        brightness: &mut BrightnessController,
    ) -> Option<DisplayState> {
        let idle = idle_ms.unwrap_or(0);
        let from = self.state;
        let wake = idle < self.idle_to_dim || !allow_dim || plugged_in;

        match self.state {
            DisplayState::Active => {
                if idle > self.idle_to_dim && allow_dim {
                    brightness.dim_half();
                    self.state = DisplayState::Dim;
                    self.next_check = tick + self.recovery;
                } else {
                    self.next_check = tick + self.idle_to_dim.saturating_sub(idle);
                }
            }
            DisplayState::Dim => {
                if wake {
                    self.wake(tick, idle, brightness);
                } else if idle > self.idle_to_dim + self.dim_to_dark {
                    brightness.darken_full();
                    self.state = DisplayState::Dark;
                    self.next_check = tick + self.recovery;
                } else {
                    self.next_check = tick + self.recovery;
                }
            }
            DisplayState::Dark => {
                if wake {
                    self.wake(tick, idle, brightness);
                } else {
                    self.next_check = tick + self.recovery;
                }
            }
        }

        if !allow_dim {
            self.next_check = tick + self.idle_to_dim;
        }

        (self.state != from).then_some(self.state)
    }

    fn wake(&mut self, tick: u64, idle: u64, brightness: &mut BrightnessController) {
        brightness.restore();
        self.state = DisplayState::Active;
        self.next_check = tick + self.idle_to_dim.saturating_sub(idle);
    }

    /// User interaction: leave any dim or dark state and restart the idle
    /// countdown.
    pub fn force_active(&mut self, tick: u64, brightness: &mut BrightnessController) {
        if self.state != DisplayState::Active {
            brightness.restore();
            self.state = DisplayState::Active;
        }
        self.postpone(tick);
    }

    /// Push the next check a full dim threshold out.
    pub fn postpone(&mut self, tick: u64) {
        self.next_check = tick + self.idle_to_dim;
    }
}
