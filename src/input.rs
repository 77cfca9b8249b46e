// Tablet Power Daemon - Debounced Input Manager
//
// The power switch, user buttons, and charger status LEDs are all treated as
// buttons. Each raw sample is shifted into the low bit of a per-channel
// history word; a channel becomes active after W consecutive ones and
// inactive after W consecutive zeroes, where W is the channel's window.
// Polled once per tick, so each bit is about 1 ms of settle time.

use crate::config::*;
use crate::events::{Edge, InputId};

/// One logical input: sample history plus its debounced state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputChannel {
    history: u32,
    mask: u32,
    active: bool,
}

impl InputChannel {
    /// `window` is the number of identical samples required (1..=32).
    pub fn new(window: u8) -> Self {
        let window = window.clamp(1, 32) as u32;
        let mask = if window == 32 { u32::MAX } else { (1u32 << window) - 1 };
        Self {
            history: 0,
            mask,
            active: false,
        }
    }

    /// Shift in one polarity-corrected sample and report any edge.
    pub fn shift(&mut self, bit: bool) -> Edge {
        self.history = (self.history << 1) | u32::from(bit);

        if !self.active && self.history & self.mask == self.mask {
            self.active = true;
            return Edge::Rose;
        }
        if self.active && self.history & self.mask == 0 {
            self.active = false;
            return Edge::Fell;
        }
        Edge::None
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn window(&self) -> u32 {
        self.mask.count_ones()
    }
}

/// The seven debounced inputs of the tablet.
#[derive(Debug, Clone)]
pub struct DebounceEngine {
    channels: [InputChannel; InputId::COUNT],
}

impl DebounceEngine {
    pub fn new() -> Self {
        Self::with_windows(|id| match id {
            InputId::PowerSwitch => DEBOUNCE_POWER_SWITCH,
            _ => DEBOUNCE_DEFAULT,
        })
    }

    pub fn with_windows(window_for: impl Fn(InputId) -> u8) -> Self {
        Self {
            channels: InputId::ALL.map(|id| InputChannel::new(window_for(id))),
        }
    }

    pub fn sample(&mut self, id: InputId, bit: bool) -> Edge {
        self.channels[id.index()].shift(bit)
    }

    /// Sample by raw channel number. Out-of-range numbers are a caller bug;
    /// they report no edge and touch no state.
    pub fn sample_index(&mut self, index: usize, bit: bool) -> Edge {
        match InputId::from_index(index) {
            Some(id) => self.sample(id, bit),
            None => Edge::None,
        }
    }

    pub fn is_active(&self, id: InputId) -> bool {
        self.channels[id.index()].is_active()
    }

    pub fn channel(&self, id: InputId) -> &InputChannel {
        &self.channels[id.index()]
    }
}

impl Default for DebounceEngine {
    fn default() -> Self {
        Self::new()
    }
}
