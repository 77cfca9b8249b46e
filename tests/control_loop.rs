// Control loop scenarios against in-memory hardware.

mod common;

use common::Rig;
use tabletd::config::{ControlConfig, IDLE_TO_DIM_MS};
use tabletd::display_power::DisplayState;
use tabletd::events::{Action, Commands, InputId, ShutdownCause, TickOutcome};

fn short_idle() -> ControlConfig {
    ControlConfig {
        idle_to_dim_ms: 1000,
        dim_to_dark_ms: 2000,
        ..ControlConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

#[test]
fn power_switch_off_shuts_down_after_debounce() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.run(100);

    rig.set(InputId::PowerSwitch, false);
    rig.run(15);
    assert_eq!(rig.tick(), TickOutcome::Shutdown(ShutdownCause::PowerSwitch));
}

#[test]
fn ticks_after_shutdown_do_nothing() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.run(100);
    rig.set(InputId::PowerSwitch, false);
    assert_eq!(
        rig.run_until_shutdown(100),
        Some((ShutdownCause::PowerSwitch, 115))
    );

    let reads = rig.battery.reads;
    let ticks = rig.control.ticks();
    for _ in 0..10 {
        assert_eq!(rig.tick(), TickOutcome::Shutdown(ShutdownCause::PowerSwitch));
    }
    assert_eq!(rig.battery.reads, reads);
    assert_eq!(rig.control.ticks(), ticks);
}

#[test]
fn sustained_low_battery_shuts_down_with_last_voltage() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.set(InputId::LowBattery, true);

    // Asserted at tick 3, then a full minute of ticks.
    assert_eq!(
        rig.run_until_shutdown(70_000),
        Some((ShutdownCause::LowBattery { voltage: 3.77 }, 60_002))
    );

    let reads = rig.battery.reads;
    assert_eq!(reads, 60_003);
    rig.tick();
    assert_eq!(rig.battery.reads, reads);
}

#[test]
fn low_battery_glitch_restarts_the_countdown() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.set(InputId::LowBattery, true);
    rig.run(30_000);
    assert!(rig.control.low_battery_ticks() > 29_000);

    rig.set(InputId::LowBattery, false);
    rig.run(4);
    assert_eq!(rig.control.low_battery_ticks(), 0);

    rig.set(InputId::LowBattery, true);
    rig.run(59_000);
    let (cause, at) = rig.run_until_shutdown(2000).unwrap();
    assert!(matches!(cause, ShutdownCause::LowBattery { .. }));
    assert_eq!(at, 30_007 + 59_999);
}

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

#[test]
fn brightness_button_short_and_long_press() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.run(20);
    assert_eq!(rig.control.brightness().target(), 42);

    rig.press(InputId::Button2, 50);
    assert_eq!(rig.control.brightness().target(), 72);

    rig.press(InputId::Button2, 600);
    assert_eq!(rig.control.brightness().target(), 212);
    assert_eq!(rig.control.brightness().current_index(), 8);

    // Wraps around to off.
    rig.press(InputId::Button2, 50);
    assert_eq!(rig.control.brightness().target(), 0);
}

#[test]
fn window_buttons_map_to_actions() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.run(20);

    rig.press(InputId::Button1, 50);
    rig.press(InputId::Button1, 600);
    rig.press(InputId::Button3, 50);
    rig.press(InputId::Button3, 600);

    assert_eq!(
        rig.actions.log,
        vec![
            Action::ShowKeyboard,
            Action::ShowDashboard,
            Action::ToggleMaximized,
            Action::ToggleFullscreen,
        ]
    );
}

#[test]
fn backlight_fades_toward_target() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.run(1000);
    assert_eq!(rig.backlight.writes.first(), Some(&42));
    assert_eq!(rig.control.brightness().live(), 42);

    rig.press(InputId::Button2, 50);
    rig.run(2000);
    assert_eq!(rig.control.brightness().live(), 72);
    let writes = &rig.backlight.writes;
    assert!(writes.windows(2).all(|w| w[0] < w[1]), "{:?}", writes);
}

// ---------------------------------------------------------------------------
// Idle dimming
// ---------------------------------------------------------------------------

#[test]
fn idle_dims_then_darkens_then_a_press_wakes() {
    let mut rig = Rig::new(short_idle());
    rig.idle.millis = Some(10_000_000);

    rig.run(1002);
    assert_eq!(rig.control.display_state(), DisplayState::Dim);
    assert_eq!(rig.control.brightness().target(), 14);
    assert_eq!(rig.actions.count(Action::ShowDashboard), 0);

    rig.run(501);
    assert_eq!(rig.control.display_state(), DisplayState::Dark);
    assert_eq!(rig.control.brightness().target(), 0);
    assert_eq!(rig.actions.count(Action::ShowDashboard), 1);

    let pressed_at = rig.control.ticks() + 3;
    rig.press(InputId::Button1, 50);
    assert_eq!(rig.control.display_state(), DisplayState::Active);
    assert_eq!(rig.control.brightness().target(), 42);
    assert_eq!(rig.control.next_idle_check(), pressed_at + 1000);
    assert_eq!(rig.actions.count(Action::ShowKeyboard), 1);
}

#[test]
fn external_power_keeps_display_on_without_querying_idle() {
    let mut rig = Rig::new(short_idle());
    rig.idle.millis = Some(10_000_000);
    rig.set(InputId::Charging, true);

    rig.run(5000);
    assert_eq!(rig.control.display_state(), DisplayState::Active);
    assert_eq!(rig.idle.queries, 0);
}

#[test]
fn dashboard_can_forbid_dimming() {
    let mut rig = Rig::new(short_idle());
    rig.idle.millis = Some(10_000_000);
    rig.dashboard.commands = Some(Commands {
        allow_dim: false,
        ..Commands::default()
    });

    rig.run(5000);
    assert_eq!(rig.control.display_state(), DisplayState::Active);
    assert!(rig.idle.queries > 0);
}

#[test]
fn unavailable_idle_time_counts_as_busy() {
    let mut rig = Rig::new(short_idle());
    rig.idle.millis = None;

    rig.run(5000);
    assert_eq!(rig.control.display_state(), DisplayState::Active);
}

// ---------------------------------------------------------------------------
// Dashboard settings
// ---------------------------------------------------------------------------

#[test]
fn settings_are_polled_and_applied_on_change_only() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.dashboard.commands = Some(Commands {
        allow_dim: true,
        usb_enabled: false,
        wifi_enabled: true,
    });

    rig.run(20_001);
    assert_eq!(rig.dashboard.reads, 5);
    assert_eq!(rig.actions.log, vec![Action::SetUsb(false)]);
    assert!(!rig.control.settings().usb_enabled);

    rig.dashboard.commands = Some(Commands {
        allow_dim: true,
        usb_enabled: true,
        wifi_enabled: false,
    });
    rig.run(5000);
    assert_eq!(
        rig.actions.log,
        vec![Action::SetUsb(false), Action::SetUsb(true), Action::SetWifi(false)]
    );
}

#[test]
fn failed_switch_is_retried_at_the_next_poll() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.actions.fail_usb = true;
    rig.dashboard.commands = Some(Commands {
        usb_enabled: false,
        ..Commands::default()
    });

    rig.run(10_001);
    assert_eq!(rig.actions.count(Action::SetUsb(false)), 3);
    assert!(rig.control.settings().usb_enabled);

    rig.actions.fail_usb = false;
    rig.run(5000);
    assert_eq!(rig.actions.count(Action::SetUsb(false)), 4);
    assert!(!rig.control.settings().usb_enabled);

    rig.run(10_000);
    assert_eq!(rig.actions.count(Action::SetUsb(false)), 4);
}

#[test]
fn unreadable_settings_change_nothing() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.run(10_001);
    assert_eq!(rig.dashboard.reads, 3);
    assert_eq!(rig.control.settings(), Commands::default());
    assert!(rig.actions.log.is_empty());
}

// ---------------------------------------------------------------------------
// Charger and battery status
// ---------------------------------------------------------------------------

#[test]
fn charger_edges_report_a_change() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.run(16_385);

    rig.set(InputId::Charging, true);
    assert!(!rig.run(3));
    assert_eq!(rig.tick(), TickOutcome::Running { changed: true });
    assert!(rig.control.is_plugged_in());
    assert!(rig.control.status().charging);

    rig.set(InputId::Charging, false);
    assert!(!rig.run(3));
    assert_eq!(rig.tick(), TickOutcome::Running { changed: true });
    assert!(!rig.control.is_plugged_in());

    let unplugged_at = rig.control.ticks() - 1;
    assert_eq!(rig.control.next_idle_check(), unplugged_at + IDLE_TO_DIM_MS);
}

#[test]
fn booting_on_the_charger_waits_for_a_battery_reading() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.set(InputId::Charging, true);

    assert!(!rig.run(16_384));
    assert!(rig.control.is_plugged_in());

    assert_eq!(rig.tick(), TickOutcome::Running { changed: true });
    let status = rig.control.status();
    assert!(status.charging);
    assert_eq!(status.voltage, 3.77);
}

#[test]
fn charge_complete_counts_as_plugged_in() {
    let mut rig = Rig::new(ControlConfig::default());
    rig.set(InputId::Charged, true);
    rig.run(4);
    assert!(rig.control.is_plugged_in());
    assert!(rig.control.status().charge_complete);
    assert!(!rig.control.status().charging);
}

#[test]
fn battery_is_reported_once_the_window_is_full() {
    let mut rig = Rig::new(ControlConfig::default());

    assert!(!rig.run(16_384));
    assert_eq!(rig.control.status().voltage, 0.0);

    assert_eq!(rig.tick(), TickOutcome::Running { changed: true });
    let status = rig.control.status();
    assert_eq!(status.voltage, 3.77);
    assert_eq!(status.energy_percent, 33.0);

    // A steady battery stays quiet.
    assert!(!rig.run(5000));
}

#[test]
fn zero_periods_are_treated_as_every_tick() {
    let mut rig = Rig::new(ControlConfig {
        command_poll_ticks: 0,
        nudge_period_ticks: 0,
        ..ControlConfig::default()
    });
    rig.run(10);
    assert_eq!(rig.dashboard.reads, 10);
    assert_eq!(rig.control.brightness().live(), 42);
}
