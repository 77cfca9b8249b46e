// Tablet Power Daemon - Hardware & Host Interfaces
//
// The control loop only sees these traits. Concrete adapters for the
// Raspberry Pi tablet live in the submodules; tests substitute fakes.

pub mod backlight;
pub mod files;
pub mod gpio;
pub mod idle;
pub mod shell;

use crate::events::{Action, Commands, InputId, StatusReport};

/// Raw level of each debounced input, already corrected for active-low pins.
pub trait InputSource {
    fn read(&mut self, id: InputId) -> bool;
}

/// Output of the battery monitor's duty-cycle comparator.
pub trait BatterySource {
    fn read_battery_bit(&mut self) -> bool;
}

/// User idle time in milliseconds; `None` when it cannot be determined.
pub trait IdleTimeSource {
    fn idle_millis(&mut self) -> Option<u64>;
}

pub trait DisplayDriver {
    fn set_brightness(&mut self, level: u32) -> anyhow::Result<()>;
}

/// Window manager and peripheral power switches.
pub trait ActionSink {
    fn perform(&mut self, action: Action) -> anyhow::Result<()>;
}

/// Dashboard settings. `None` when missing or malformed.
pub trait CommandSource {
    fn read_commands(&mut self) -> Option<Commands>;
}

pub trait StatusSink {
    fn publish(&mut self, status: &StatusReport) -> anyhow::Result<()>;
}
