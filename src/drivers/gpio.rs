// Tablet Power Daemon - GPIO Inputs
//
// All monitored pins are plain inputs with the internal pull-up enabled.
// The buttons and the charger's status outputs pull low when active, so
// their levels are inverted here; the control loop only sees "active".

use anyhow::Context;
use rppal::gpio::{Gpio, InputPin};

use crate::config::*;
use crate::drivers::{BatterySource, InputSource};
use crate::events::InputId;

/// BCM pin number and whether the input is active low.
pub fn pin_for(id: InputId) -> (u8, bool) {
    match id {
        InputId::PowerSwitch => (PIN_POWER_SWITCH, false),
        InputId::Button1 => (PIN_BUTTON_1, true),
        InputId::Button2 => (PIN_BUTTON_2, true),
        InputId::Button3 => (PIN_BUTTON_3, true),
        InputId::LowBattery => (PIN_LOW_BATTERY, true),
        InputId::Charging => (PIN_CHARGING, true),
        InputId::Charged => (PIN_CHARGED, true),
    }
}

/// Open the GPIO controller shared by [`GpioInputs`] and [`BatteryMonitor`].
pub fn open() -> anyhow::Result<Gpio> {
    Gpio::new().context("failed to initialize GPIO")
}

fn input_pin(gpio: &Gpio, number: u8, name: &str) -> anyhow::Result<InputPin> {
    Ok(gpio
        .get(number)
        .with_context(|| format!("GPIO{} ({}) unavailable", number, name))?
        .into_input_pullup())
}

struct MonitoredPin {
    pin: InputPin,
    active_low: bool,
}

pub struct GpioInputs {
    /// Indexed by [`InputId::index`].
    inputs: Vec<MonitoredPin>,
}

impl GpioInputs {
    pub fn new(gpio: &Gpio) -> anyhow::Result<Self> {
        let mut inputs = Vec::with_capacity(InputId::COUNT);
        for id in InputId::ALL {
            let (number, active_low) = pin_for(id);
            let pin = input_pin(gpio, number, id.display_name())?;
            inputs.push(MonitoredPin { pin, active_low });
        }
        log::debug!("GPIO inputs configured");
        Ok(Self { inputs })
    }
}

impl InputSource for GpioInputs {
    fn read(&mut self, id: InputId) -> bool {
        let input = &self.inputs[id.index()];
        input.pin.is_high() != input.active_low
    }
}

/// The battery monitor's comparator output, sampled raw.
pub struct BatteryMonitor {
    pin: InputPin,
}

impl BatteryMonitor {
    pub fn new(gpio: &Gpio) -> anyhow::Result<Self> {
        Ok(Self {
            pin: input_pin(gpio, PIN_BATTERY_MON, "battery monitor")?,
        })
    }
}

impl BatterySource for BatteryMonitor {
    fn read_battery_bit(&mut self) -> bool {
        self.pin.is_high()
    }
}
