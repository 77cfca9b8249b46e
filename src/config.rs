// Tablet Power Daemon - Hardware & System Configuration
// Target: Raspberry Pi 3 tablet with a PowerBoost 1000C charger board

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (BCM numbering)
// ---------------------------------------------------------------------------
pub const PIN_POWER_SWITCH: u8 = 21; // J8-40 (1 = on, 0 = off)
pub const PIN_BUTTON_1: u8 = 13;     // J8-33 (active LOW)
pub const PIN_BUTTON_2: u8 = 19;     // J8-35 (active LOW)
pub const PIN_BUTTON_3: u8 = 26;     // J8-37 (active LOW)
pub const PIN_LOW_BATTERY: u8 = 16;  // J8-36 LBO from the charger (active LOW)
pub const PIN_CHARGING: u8 = 6;      // J8-31 charging LED (active LOW)
pub const PIN_CHARGED: u8 = 5;       // J8-29 charge-complete LED (active LOW)
pub const PIN_BATTERY_MON: u8 = 20;  // J8-38 duty-cycle comparator output

// ---------------------------------------------------------------------------
// Debounce windows (ticks, one tick is about 1 ms)
// ---------------------------------------------------------------------------
pub const DEBOUNCE_POWER_SWITCH: u8 = 16;
pub const DEBOUNCE_DEFAULT: u8 = 4;

// ---------------------------------------------------------------------------
// Timing (ticks unless noted otherwise)
// ---------------------------------------------------------------------------
pub const TICK_SLEEP_US: u64 = 927;               // ~1 ms per tick after loop overhead
pub const LONG_PRESS_TICKS: u64 = 500;
pub const COMMAND_POLL_TICKS: u64 = 5000;         // dashboard settings every 5 s
pub const NUDGE_PERIOD_TICKS: u64 = 16;           // off to full in about 1 s
pub const LOW_BATTERY_SHUTDOWN_TICKS: u32 = 60_000;
pub const IDLE_TO_DIM_MS: u64 = 120_000;
pub const DIM_TO_DARK_MS: u64 = 180_000;
pub const IDLE_RECOVERY_TICKS: u64 = 500;
pub const RAW_BATTERY_LOG_TICKS: u64 = 60_000;

// ---------------------------------------------------------------------------
// Battery monitor calibration
// ---------------------------------------------------------------------------
pub const BATTERY_SAMPLES: usize = 16384;
pub const VOLTAGE_AT_0: f64 = 2.7096;             // volts at 0% duty cycle
pub const VOLTAGE_AT_1: f64 = 4.8267;             // volts at 100% duty cycle

/// Duty cycle to energy fraction knees: empty, low, high, full.
pub const ENERGY_KNEES: [(f64, f64); 4] = [
    (0.3725, 0.00),
    (0.4650, 0.18),
    (0.6070, 0.80),
    (0.6806, 1.00),
];

pub const VOLTAGE_TOLERANCE: f64 = 0.0101;        // report a 10 mV move against the trend
pub const ENERGY_TOLERANCE: f64 = 1.01;           // report a 1% move against the trend

pub const CHARGER_BIAS: f64 = 0.12;               // share of each charging-tagged set bit
pub const CHARGER_BIAS_FLOOR: f64 = 0.25;         // residual share of the bias at 100% duty

// ---------------------------------------------------------------------------
// Backlight
// ---------------------------------------------------------------------------
/// Chosen to roughly double LED current per step from ~4 mA to 500 mA, then
/// tweaked until the steps looked uniform.
pub const BRIGHTNESS_LEVELS: [u32; 9] = [0, 10, 14, 23, 42, 72, 115, 172, 212];
pub const DEFAULT_BRIGHTNESS_INDEX: usize = 4;    // ~1/4 of max, ~3/4 perceptually
pub const BRIGHTNESS_CRAWL_LIMIT: u32 = 20;       // below this, brighten one unit per nudge

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------
pub const LOG_FILE: &str = "/var/log/tabletd.log";
pub const LOG_ROTATIONS: u32 = 9;
pub const PID_FILE: &str = "/var/run/tabletd.pid";
pub const STATUS_FILE: &str = "/ram/tabletd.dat";
pub const COMMAND_FILE: &str = "/ram/tabletd.cmd";
pub const COMMAND_SAVE_FILE: &str = "/var/tmp/tabletd.cmd";
pub const BACKLIGHT_FILE: &str = "/sys/class/backlight/rpi_backlight/brightness";
pub const USB_POWER_FILE: &str = "/sys/devices/platform/soc/3f980000.usb/buspower";
pub const X_DISPLAY: &str = ":0.0";

// ---------------------------------------------------------------------------
// Tunables grouped for callers that need to override them
// ---------------------------------------------------------------------------

/// Calibration of the duty-cycle battery monitor. Device specific; the
/// defaults describe a 6200 mAh LiPo cell.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryCalibration {
    pub capacity: usize,
    pub voltage_at_0: f64,
    pub voltage_at_1: f64,
    pub energy_knees: [(f64, f64); 4],
    pub charger_bias: f64,
    pub charger_bias_floor: f64,
}

impl Default for BatteryCalibration {
    fn default() -> Self {
        Self {
            capacity: BATTERY_SAMPLES,
            voltage_at_0: VOLTAGE_AT_0,
            voltage_at_1: VOLTAGE_AT_1,
            energy_knees: ENERGY_KNEES,
            charger_bias: CHARGER_BIAS,
            charger_bias_floor: CHARGER_BIAS_FLOOR,
        }
    }
}

/// Periods and thresholds used by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlConfig {
    pub long_press_ticks: u64,
    pub command_poll_ticks: u64,
    pub nudge_period_ticks: u64,
    pub low_battery_shutdown_ticks: u32,
    pub idle_to_dim_ms: u64,
    pub dim_to_dark_ms: u64,
    pub idle_recovery_ticks: u64,
    pub log_battery: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            long_press_ticks: LONG_PRESS_TICKS,
            command_poll_ticks: COMMAND_POLL_TICKS,
            nudge_period_ticks: NUDGE_PERIOD_TICKS,
            low_battery_shutdown_ticks: LOW_BATTERY_SHUTDOWN_TICKS,
            idle_to_dim_ms: IDLE_TO_DIM_MS,
            dim_to_dark_ms: DIM_TO_DARK_MS,
            idle_recovery_ticks: IDLE_RECOVERY_TICKS,
            log_battery: false,
        }
    }
}
