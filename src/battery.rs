// Tablet Power Daemon - Battery Estimator
//
// The charger's battery monitor drives a comparator whose output is a
// duty-cycle signal proportional to cell voltage. One bit is sampled per
// tick into a circular window; the fraction of set bits is the raw reading.
//
// Samples taken while charging read high because of the voltage drop across
// the cell's internal resistance. Each sample is therefore tagged with the
// charging state, and the adjusted reading discounts the tagged set bits by
// a bias that tapers off above the high knee as charge current falls.

use crate::config::BatteryCalibration;

const RAW_BIT: u8 = 0b01;
const CHARGING_BIT: u8 = 0b10;

// ---------------------------------------------------------------------------
// Sample window
// ---------------------------------------------------------------------------

/// Fixed-size circular buffer of 2-bit samples with running totals.
#[derive(Debug, Clone)]
pub struct BatteryWindow {
    slots: Vec<u8>,
    set_bits: usize,
    charging_set_bits: usize,
    cursor: usize,
}

impl BatteryWindow {
    /// Seeded with alternating bits so the reading starts at a 50% duty cycle.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let slots: Vec<u8> = (0..capacity)
            .map(|i| if i % 2 == 0 { RAW_BIT } else { 0 })
            .collect();
        let set_bits = slots.iter().filter(|s| *s & RAW_BIT != 0).count();
        Self {
            slots,
            set_bits,
            charging_set_bits: 0,
            cursor: 0,
        }
    }

    /// Replace the oldest sample. The charging tag is only kept on set bits.
    pub fn push(&mut self, raw: bool, charging: bool) {
        let old = self.slots[self.cursor];
        self.set_bits -= usize::from(old & RAW_BIT != 0);
        self.charging_set_bits -= usize::from(old & CHARGING_BIT != 0);

        let mut new = 0;
        if raw {
            new |= RAW_BIT;
            if charging {
                new |= CHARGING_BIT;
            }
        }
        self.slots[self.cursor] = new;
        self.set_bits += usize::from(raw);
        self.charging_set_bits += usize::from(new & CHARGING_BIT != 0);

        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn set_bits(&self) -> usize {
        self.set_bits
    }

    pub fn charging_set_bits(&self) -> usize {
        self.charging_set_bits
    }

    pub fn average(&self) -> f64 {
        self.set_bits as f64 / self.slots.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Energy curve
// ---------------------------------------------------------------------------

/// Piecewise-linear map from duty cycle to energy fraction.
///
/// Knees must be strictly increasing in duty cycle and non-decreasing in
/// energy; neighbouring segments share their end points, so the curve is
/// continuous. Outside the first and last knee it clamps to 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyCurve {
    knees: [(f64, f64); 4],
}

impl EnergyCurve {
    pub fn new(knees: [(f64, f64); 4]) -> Self {
        Self { knees }
    }

    pub fn knees(&self) -> &[(f64, f64); 4] {
        &self.knees
    }

    pub fn energy_fraction(&self, duty: f64) -> f64 {
        let (first, last) = (self.knees[0], self.knees[self.knees.len() - 1]);
        if duty <= first.0 {
            return first.1.clamp(0.0, 1.0);
        }
        if duty >= last.0 {
            return last.1.clamp(0.0, 1.0);
        }

        let fraction = self
            .knees
            .windows(2)
            .find(|pair| duty < pair[1].0)
            .map(|pair| {
                let (lo, hi) = (pair[0], pair[1]);
                lo.1 + (duty - lo.0) / (hi.0 - lo.0) * (hi.1 - lo.1)
            })
            .unwrap_or(last.1);
        fraction.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// One pair of readings from [`BatteryEstimator::sample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    /// Fraction of set bits in the window.
    pub actual: f64,
    /// Same, with the charger bias removed from charging-tagged samples.
    pub adjusted: f64,
}

#[derive(Debug, Clone)]
pub struct BatteryEstimator {
    window: BatteryWindow,
    curve: EnergyCurve,
    calibration: BatteryCalibration,
}

impl BatteryEstimator {
    pub fn new(calibration: BatteryCalibration) -> Self {
        Self {
            window: BatteryWindow::new(calibration.capacity),
            curve: EnergyCurve::new(calibration.energy_knees),
            calibration,
        }
    }

    /// Number of samples needed before readings mean anything.
    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn window(&self) -> &BatteryWindow {
        &self.window
    }

    pub fn sample(&mut self, raw: bool, charging: bool) -> BatteryReading {
        self.window.push(raw, charging);

        let capacity = self.window.capacity() as f64;
        let actual = self.window.average();
        let delta = self.charger_bias(actual);
        let adjusted =
            (self.window.set_bits() as f64 - delta * self.window.charging_set_bits() as f64) / capacity;

        BatteryReading { actual, adjusted }
    }

    /// Share of each charging-tagged set bit to discount. Full strength up to
    /// the high knee, then linear down to the floor share at 100% duty.
    pub fn charger_bias(&self, actual: f64) -> f64 {
        let nominal = self.calibration.charger_bias;
        let knee = self.curve.knees()[2].0;
        if actual <= knee || knee >= 1.0 {
            return nominal;
        }
        let t = ((actual - knee) / (1.0 - knee)).min(1.0);
        nominal * (1.0 - t * (1.0 - self.calibration.charger_bias_floor))
    }

    pub fn raw_to_voltage(&self, average: f64) -> f64 {
        let cal = &self.calibration;
        average * (cal.voltage_at_1 - cal.voltage_at_0) + cal.voltage_at_0
    }

    pub fn raw_to_energy_percent(&self, average: f64) -> f64 {
        (self.curve.energy_fraction(average) * 100.0).clamp(0.0, 100.0)
    }
}

impl Default for BatteryEstimator {
    fn default() -> Self {
        Self::new(BatteryCalibration::default())
    }
}
