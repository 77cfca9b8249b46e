// Tablet Power Daemon - Tick Task
//
// Drives the control loop at roughly one tick per millisecond and publishes
// the battery status whenever something visible changed. Returns when the
// loop signals a shutdown.

use std::thread;
use std::time::Duration;

use crate::control::{ControlLoop, Ports};
use crate::drivers::StatusSink;
use crate::events::{ShutdownCause, TickOutcome};

pub fn tick_task(
    control: &mut ControlLoop,
    ports: &mut Ports<'_>,
    status: &mut dyn StatusSink,
    interval: Duration,
) -> ShutdownCause {
    log::debug!("Tick task started");

    loop {
        match control.tick(ports) {
            TickOutcome::Running { changed: true } => {
                if let Err(e) = status.publish(&control.status()) {
                    log::debug!("status not published: {e:#}");
                }
            }
            TickOutcome::Running { changed: false } => {}
            TickOutcome::Shutdown(cause) => return cause,
        }

        // Sleep slightly under 1 ms to allow for loop overhead.
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
}
