// Tablet Power Daemon - Backlight Driver
//
// The official 7" display exposes its PWM backlight through sysfs.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;

use crate::config::BACKLIGHT_FILE;
use crate::drivers::DisplayDriver;

pub struct SysfsBacklight {
    path: PathBuf,
}

impl SysfsBacklight {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for SysfsBacklight {
    fn default() -> Self {
        Self::new(BACKLIGHT_FILE)
    }
}

impl DisplayDriver for SysfsBacklight {
    fn set_brightness(&mut self, level: u32) -> anyhow::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        writeln!(file, "{}", level)?;
        Ok(())
    }
}
