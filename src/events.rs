// Tablet Power Daemon - Shared Events & Data Types

use std::fmt;

// ---------------------------------------------------------------------------
// Debounced inputs
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputId {
    PowerSwitch,
    Button1,
    Button2,
    Button3,
    LowBattery,
    Charging,
    Charged,
}

impl InputId {
    pub const COUNT: usize = 7;

    /// All inputs in polling order.
    pub const ALL: [InputId; Self::COUNT] = [
        Self::PowerSwitch,
        Self::Button1,
        Self::Button2,
        Self::Button3,
        Self::LowBattery,
        Self::Charging,
        Self::Charged,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Map a raw channel number to an input; `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PowerSwitch => "power switch",
            Self::Button1 => "button 1",
            Self::Button2 => "button 2",
            Self::Button3 => "button 3",
            Self::LowBattery => "low battery",
            Self::Charging => "charging",
            Self::Charged => "charge complete",
        }
    }
}

/// Result of feeding one raw sample through a debounced channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edge {
    Rose,
    Fell,
    #[default]
    None,
}

// ---------------------------------------------------------------------------
// Side effects requested by the control loop
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Bring the on-screen keyboard to the front.
    ShowKeyboard,
    /// Bring the dashboard to the front.
    ShowDashboard,
    ToggleMaximized,
    ToggleFullscreen,
    /// Power USB, wired Ethernet, and the Bluetooth dongle on or off.
    SetUsb(bool),
    SetWifi(bool),
}

/// Settings written by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commands {
    pub allow_dim: bool,
    pub usb_enabled: bool,
    pub wifi_enabled: bool,
}

impl Default for Commands {
    fn default() -> Self {
        Self {
            allow_dim: true,
            usb_enabled: true,
            wifi_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Status published to the dashboard
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatusReport {
    /// Volts, rounded to 10 mV.
    pub voltage: f64,
    /// Percent of energy remaining, rounded to a whole percent.
    pub energy_percent: f64,
    pub charging: bool,
    pub charge_complete: bool,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:4.2} {:2.0} {} {}",
            self.voltage,
            self.energy_percent,
            u8::from(self.charging),
            u8::from(self.charge_complete)
        )
    }
}

// ---------------------------------------------------------------------------
// Loop termination
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShutdownCause {
    /// The power switch was turned off.
    PowerSwitch,
    /// The low-battery warning stayed asserted for the full timeout.
    LowBattery { voltage: f64 },
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerSwitch => write!(f, "shutdown initiated"),
            Self::LowBattery { voltage } => write!(f, "low battery at {:1.2}V", voltage),
        }
    }
}

/// What a single tick produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Running { changed: bool },
    Shutdown(ShutdownCause),
}
