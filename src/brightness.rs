// Tablet Power Daemon - Backlight Brightness Controller
//
// The user picks a level from a fixed non-linear table; the live backlight
// value is then nudged toward that target a few percent at a time so
// changes fade rather than jump.

use crate::config::{BRIGHTNESS_CRAWL_LIMIT, BRIGHTNESS_LEVELS, DEFAULT_BRIGHTNESS_INDEX};
use crate::drivers::DisplayDriver;

const LEVEL_COUNT: usize = BRIGHTNESS_LEVELS.len();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrightnessController {
    /// Table index of the last user-chosen level.
    cursor: usize,
    live: u32,
    target: u32,
    /// Target to come back to after a dim or dark period.
    remembered: u32,
}

impl BrightnessController {
    /// Start at a saved table index. Index 0 (off) and out-of-range indices
    /// fall back to the default so the tablet never boots with a dark screen.
    pub fn new(initial_index: usize) -> Self {
        let cursor = if (1..LEVEL_COUNT).contains(&initial_index) {
            initial_index
        } else {
            DEFAULT_BRIGHTNESS_INDEX
        };
        let target = BRIGHTNESS_LEVELS[cursor];
        Self {
            cursor,
            // One below target so the first nudge writes the level out.
            live: target.saturating_sub(1),
            target,
            remembered: target,
        }
    }

    /// Cycle to the next table level, wrapping from the brightest to off.
    pub fn set_next(&mut self) {
        self.cursor = (self.cursor + 1) % LEVEL_COUNT;
        self.choose(BRIGHTNESS_LEVELS[self.cursor]);
    }

    /// Jump to the brightest level; the next [`set_next`](Self::set_next)
    /// wraps around to off.
    pub fn set_max(&mut self) {
        self.cursor = LEVEL_COUNT - 1;
        self.choose(BRIGHTNESS_LEVELS[self.cursor]);
    }

    fn choose(&mut self, level: u32) {
        self.target = level;
        self.remembered = level;
    }

    /// Move the live value one step toward the target and push it to the
    /// driver. Returns the new live value, or `None` if already there.
    pub fn nudge(&mut self, driver: &mut dyn DisplayDriver) -> Option<u32> {
        if self.live == self.target {
            return None;
        }

        self.live = if self.live == 0 {
            // Anything below the first level is invisible anyway.
            BRIGHTNESS_LEVELS[1]
        } else if self.live < self.target {
            let next = if self.live < BRIGHTNESS_CRAWL_LIMIT {
                self.live + 1
            } else {
                self.live * 21 / 20
            };
            next.min(self.target)
        } else {
            // Darken faster than we brighten so full-on to off doesn't drag.
            (self.live * 10 / 11).max(self.target)
        };

        if let Err(e) = driver.set_brightness(self.live) {
            log::debug!("backlight write failed: {e:#}");
        }
        Some(self.live)
    }

    /// Dim to about half the perceived brightness. No-op when off or at the
    /// dimmest visible level.
    pub fn dim_half(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.target = BRIGHTNESS_LEVELS[(self.cursor / 2).max(1)];
    }

    pub fn darken_full(&mut self) {
        self.target = BRIGHTNESS_LEVELS[0];
    }

    pub fn restore(&mut self) {
        self.target = self.remembered;
    }

    /// Table index of the current user choice, for saving across restarts.
    pub fn current_index(&self) -> usize {
        self.cursor
    }

    pub fn live(&self) -> u32 {
        self.live
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn remembered(&self) -> u32 {
        self.remembered
    }
}

impl Default for BrightnessController {
    fn default() -> Self {
        Self::new(DEFAULT_BRIGHTNESS_INDEX)
    }
}
