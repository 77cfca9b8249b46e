// Tablet Power Daemon - Log File
//
// `log` backend that appends timestamped lines to a plain file. The file is
// reopened for every record, which is fine because only events are logged,
// never per-tick chatter.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};

pub struct FileLogger {
    path: PathBuf,
    level: LevelFilter,
    /// Also copy records to stderr (foreground mode).
    echo: bool,
}

impl FileLogger {
    pub fn new(path: impl Into<PathBuf>, level: LevelFilter, echo: bool) -> Self {
        Self {
            path: path.into(),
            level,
            echo,
        }
    }

    /// Install as the global logger.
    pub fn init(self) -> anyhow::Result<()> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(&Local::now().format("%Y-%m-%d %H:%M:%S").to_string(), record);

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(file, "{}", line);
        }
        if self.echo {
            eprintln!("{}", line);
        }
    }

    fn flush(&self) {}
}

fn format_line(timestamp: &str, record: &Record) -> String {
    match record.level() {
        log::Level::Info => format!("{} {}", timestamp, record.args()),
        level => format!("{} {}: {}", timestamp, level.as_str().to_lowercase(), record.args()),
    }
}

/// Shift `log.1`..`log.{keep-1}` up by one, dropping the oldest, and move the
/// live log to `log.1`. Missing files are skipped.
pub fn rotate(path: &Path, keep: u32) {
    let numbered = |n: u32| {
        let mut name = path.as_os_str().to_owned();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    };

    let _ = fs::remove_file(numbered(keep));
    for n in (1..keep).rev() {
        let _ = fs::rename(numbered(n), numbered(n + 1));
    }
    let _ = fs::rename(path, numbered(1));
}
