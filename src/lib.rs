// Tablet Power Daemon
//
// Watches the battery, power switch, and push buttons of a Raspberry Pi
// tablet, fades the backlight, dims it when idle, and shuts the system
// down when the switch is turned off or the battery runs out.

pub mod battery;
pub mod brightness;
pub mod config;
pub mod control;
pub mod display_power;
pub mod drivers;
pub mod events;
pub mod input;
pub mod logging;
pub mod tasks;
