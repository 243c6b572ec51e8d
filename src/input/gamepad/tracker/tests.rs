//! Tests for the gamepad tracker

use super::*;
use crate::input::gamepad::error::BackendError;
use crate::input::gamepad::scripted::{MotorCommand, ScriptedBackend};
use crate::input::gamepad::xinput_convert::button_flags;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn make_tracker() -> (ScriptedBackend, GamepadTracker<ScriptedBackend>) {
    let script = ScriptedBackend::new();
    let tracker = GamepadTracker::with_backend(script.clone());
    (script, tracker)
}

fn counter_callback(counter: &Arc<AtomicUsize>) -> impl Fn(usize) + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move |_slot: usize| {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_initial_state() {
    let (_script, tracker) = make_tracker();

    assert_eq!(tracker.connected_count(), 0);
    for slot in 0..MAX_DEVICES {
        assert!(!tracker.is_connected(slot));
        assert_eq!(tracker.connection_id(slot), DISCONNECTED);
        assert_eq!(tracker.product_name(slot), "");
        assert_eq!(tracker.analog_states(slot), &AnalogState::default());
        assert_eq!(tracker.digital_states(slot), &DigitalState::default());
        assert_eq!(tracker.dead_zone(slot), DeadZone::default());
    }
}

#[test]
fn test_connect_on_tick() {
    let (script, mut tracker) = make_tracker();
    script.connect(0, "Test Pad");

    tracker.tick();

    assert!(tracker.is_connected(0));
    assert!(tracker.is_just_connected(0));
    assert_eq!(tracker.connection_id(0), 0);
    assert_eq!(tracker.product_name(0), "Test Pad");
    assert_eq!(tracker.connected_count(), 1);
    assert!(!tracker.is_connected(1));

    tracker.tick();
    assert!(tracker.is_connected(0));
    assert!(!tracker.is_just_connected(0));
    assert_eq!(tracker.connected_count(), 1);
}

#[test]
fn test_full_stick_is_not_filtered() {
    let (script, mut tracker) = make_tracker();
    script.set_state(0, RawGamepadState {
        thumb_lx: 32767,
        thumb_ly: -32768,
        left_trigger: 255,
        ..Default::default()
    });

    tracker.tick();

    let lx = tracker.analog_state(0, AnalogChannel::ThumbLX);
    assert!((lx - 0.99997).abs() < 1e-4, "lx = {}", lx);
    assert_eq!(tracker.analog_state(0, AnalogChannel::ThumbLY), -1.0);
    assert_eq!(tracker.analog_state(0, AnalogChannel::TriggerL), 1.0);
    assert_eq!(tracker.analog_state(0, AnalogChannel::TriggerR), 0.0);
}

#[test]
fn test_stick_scaling_uses_positive_range() {
    let (script, mut tracker) = make_tracker();
    script.set_state(0, RawGamepadState {
        thumb_lx: 32767,
        thumb_ly: 16384,
        thumb_rx: -32768,
        thumb_ry: -32767,
        ..Default::default()
    });

    tracker.tick();

    assert_eq!(tracker.analog_state(0, AnalogChannel::ThumbLX), 32767.0 / 32767.0);
    assert_eq!(tracker.analog_state(0, AnalogChannel::ThumbLY), 16384.0 / 32767.0);
    // Clamped up from just below -1.0
    assert_eq!(tracker.analog_state(0, AnalogChannel::ThumbRX), -1.0);
    assert_eq!(tracker.analog_state(0, AnalogChannel::ThumbRY), -1.0);
}

#[test]
fn test_deadzone_filters_small_deflection() {
    let (script, mut tracker) = make_tracker();
    // Roughly 0.03 of full range, inside the default 0.04 deadzone
    script.set_state(0, RawGamepadState {
        thumb_rx: 1000,
        thumb_ry: -1000,
        ..Default::default()
    });

    tracker.tick();
    assert_eq!(tracker.analog_state(0, AnalogChannel::ThumbRX), 0.0);
    assert_eq!(tracker.analog_state(0, AnalogChannel::ThumbRY), 0.0);

    tracker.set_dead_zone(0, 0.01, -0.01).unwrap();
    assert_eq!(tracker.dead_zone(0), DeadZone::new(0.01, 0.01));

    tracker.tick();
    assert!(tracker.analog_state(0, AnalogChannel::ThumbRX) > 0.0);
    assert!(tracker.analog_state(0, AnalogChannel::ThumbRY) < 0.0);
}

#[test]
fn test_deadzone_is_per_axis() {
    let (script, mut tracker) = make_tracker();
    script.set_state(0, RawGamepadState {
        thumb_lx: 8192,
        thumb_ly: 8192,
        ..Default::default()
    });
    tracker.tick();
    tracker.set_dead_zone(0, 0.5, 0.0).unwrap();
    tracker.tick();

    assert_eq!(tracker.analog_state(0, AnalogChannel::ThumbLX), 0.0);
    assert_eq!(tracker.analog_state(0, AnalogChannel::ThumbLY), 8192.0 / 32767.0);
}

#[test]
fn test_disconnect_fires_callback_once() {
    let (script, mut tracker) = make_tracker();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    tracker.on_disconnected(move |slot| s.lock().push(slot));

    script.set_state(0, RawGamepadState {
        left_trigger: 128,
        buttons: button_flags::A,
        ..Default::default()
    });
    tracker.tick();
    assert!(tracker.is_connected(0));

    script.disconnect(0);
    tracker.tick();

    assert!(!tracker.is_connected(0));
    assert!(tracker.is_just_disconnected(0));
    assert_eq!(tracker.connected_count(), 0);
    assert_eq!(tracker.product_name(0), "");
    assert_eq!(tracker.analog_states(0), &AnalogState::default());
    assert_eq!(tracker.digital_states(0), &DigitalState::default());
    // The previous frame still holds the last connected sample
    assert!(tracker.prev_digital_states(0)[Button::FaceA]);
    assert!(tracker.prev_analog_states(0)[AnalogChannel::TriggerL] > 0.0);

    tracker.tick();
    assert!(!tracker.is_just_disconnected(0));
    assert_eq!(*seen.lock(), vec![0]);
}

#[test]
fn test_disconnect_restores_configured_deadzone() {
    let script = ScriptedBackend::new();
    let config = TrackerConfig {
        deadzone: crate::config::DeadzoneConfig { x: 0.1, y: 0.2 },
        ..TrackerConfig::default()
    };
    let mut tracker = GamepadTracker::new(script.clone(), &config);
    assert_eq!(tracker.dead_zone(2), DeadZone::new(0.1, 0.2));

    script.connect(2, "Pad");
    tracker.tick();
    tracker.set_dead_zone(2, 0.5, 0.5).unwrap();

    script.disconnect(2);
    tracker.tick();
    assert_eq!(tracker.dead_zone(2), DeadZone::new(0.1, 0.2));
}

#[test]
fn test_set_vibration_clamps_and_commands() {
    let (script, mut tracker) = make_tracker();
    script.connect(1, "Rumble Pad");
    tracker.tick();

    tracker.set_vibration(1, 1.5, -0.5).unwrap();

    assert_eq!(tracker.analog_state(1, AnalogChannel::VibrationL), 1.0);
    assert_eq!(tracker.analog_state(1, AnalogChannel::VibrationR), 0.0);
    assert_eq!(
        script.motor_commands(),
        vec![MotorCommand { slot: 1, left: 65535, right: 0 }]
    );

    // Set-points survive the next poll
    tracker.tick();
    assert_eq!(tracker.analog_state(1, AnalogChannel::VibrationL), 1.0);
}

#[test]
fn test_set_vibration_half_speed() {
    let (script, mut tracker) = make_tracker();
    script.connect(0, "Pad");
    tracker.tick();

    tracker.set_vibration(0, 0.5, f32::NAN).unwrap();
    assert_eq!(
        script.motor_commands(),
        vec![MotorCommand { slot: 0, left: 32768, right: 0 }]
    );
}

#[test]
fn test_set_vibration_on_disconnected_slot() {
    let (script, mut tracker) = make_tracker();

    let err = tracker.set_vibration(2, 1.0, 1.0).unwrap_err();
    assert!(matches!(err, TrackerError::NotConnected { slot: 2 }));
    assert_eq!(tracker.analog_states(2), &AnalogState::default());
    assert!(script.motor_commands().is_empty());
}

#[test]
fn test_set_vibration_backend_failure() {
    let (script, mut tracker) = make_tracker();
    script.connect(0, "Pad");
    tracker.tick();
    script.reject_motors(true);

    let err = tracker.set_vibration(0, 0.25, 0.75).unwrap_err();
    assert!(matches!(err, TrackerError::Backend(BackendError::Rejected { slot: 0, .. })));
    assert_eq!(tracker.analog_state(0, AnalogChannel::VibrationL), 0.25);
    assert_eq!(tracker.analog_state(0, AnalogChannel::VibrationR), 0.75);
}

#[test]
fn test_two_connect_callbacks_each_called_once() {
    let (script, mut tracker) = make_tracker();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    tracker.on_connected(counter_callback(&first));
    tracker.on_connected(counter_callback(&second));

    script.connect(3, "Pad");
    tracker.tick();
    tracker.tick();

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn test_connect_callback_receives_slot() {
    let (script, mut tracker) = make_tracker();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    tracker.on_connected(move |slot| s.lock().push(slot));

    script.connect(1, "A");
    script.connect(3, "B");
    tracker.tick();

    assert_eq!(*seen.lock(), vec![1, 3]);
}

#[test]
fn test_removed_callback_is_not_called() {
    let (script, mut tracker) = make_tracker();
    let counter = Arc::new(AtomicUsize::new(0));
    let handle = tracker.on_connected(counter_callback(&counter));

    assert!(tracker.remove_connected(handle));
    assert!(!tracker.remove_connected(handle));
    // Removing from the other list is a no-op
    assert!(!tracker.remove_disconnected(handle));

    script.connect(0, "Pad");
    tracker.tick();
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[test]
fn test_register_at_existing_handle_overwrites() {
    let (script, mut tracker) = make_tracker();
    let old = Arc::new(AtomicUsize::new(0));
    let new = Arc::new(AtomicUsize::new(0));
    let handle = tracker.on_disconnected(counter_callback(&old));
    tracker.register_disconnected_at(handle, counter_callback(&new));

    script.connect(0, "Pad");
    tracker.tick();
    script.disconnect(0);
    tracker.tick();

    assert_eq!(old.load(Ordering::SeqCst), 0);
    assert_eq!(new.load(Ordering::SeqCst), 1);
}

#[test]
fn test_panicking_callback_does_not_stop_tick() {
    let (script, mut tracker) = make_tracker();
    let counter = Arc::new(AtomicUsize::new(0));
    tracker.on_connected(|_| panic!("boom"));
    tracker.on_connected(counter_callback(&counter));

    script.connect(0, "Pad");
    script.connect(1, "Pad");
    tracker.tick();

    assert_eq!(tracker.connected_count(), 2);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_button_edges() {
    let (script, mut tracker) = make_tracker();
    script.connect(0, "Pad");
    tracker.tick();

    script.set_buttons(0, button_flags::A | button_flags::START);
    tracker.tick();
    assert!(tracker.is_triggered_down(0, Button::FaceA));
    assert!(tracker.is_triggered_down(0, Button::Start));
    assert!(tracker.is_button_pressed(0, Button::FaceA));
    assert!(!tracker.is_triggered_up(0, Button::FaceA));

    tracker.tick();
    assert!(!tracker.is_triggered_down(0, Button::FaceA));
    assert!(tracker.is_button_pressed(0, Button::FaceA));

    script.set_buttons(0, button_flags::START);
    tracker.tick();
    assert!(tracker.is_triggered_up(0, Button::FaceA));
    assert!(!tracker.is_button_pressed(0, Button::FaceA));
    assert!(tracker.is_button_pressed(0, Button::Start));
    assert!(!tracker.is_triggered_up(0, Button::Start));
}

#[test]
fn test_all_button_flags_map() {
    let (script, mut tracker) = make_tracker();
    script.connect(0, "Pad");
    tracker.tick();

    let cases = [
        (button_flags::DPAD_UP, Button::DpadUp),
        (button_flags::DPAD_DOWN, Button::DpadDown),
        (button_flags::DPAD_LEFT, Button::DpadLeft),
        (button_flags::DPAD_RIGHT, Button::DpadRight),
        (button_flags::LEFT_SHOULDER, Button::ShoulderLeft),
        (button_flags::RIGHT_SHOULDER, Button::ShoulderRight),
        (button_flags::LEFT_THUMB, Button::ThumbLeft),
        (button_flags::RIGHT_THUMB, Button::ThumbRight),
        (button_flags::BACK, Button::Back),
        (button_flags::Y, Button::FaceY),
    ];
    for (flag, button) in cases {
        script.set_buttons(0, flag);
        tracker.tick();
        assert!(tracker.is_button_pressed(0, button), "{:?}", button);
        assert_eq!(tracker.digital_states(0).pressed().count(), 1);
    }
}

#[test]
fn test_disconnected_slot_reports_no_edges() {
    let (script, mut tracker) = make_tracker();
    script.set_state(0, RawGamepadState {
        buttons: button_flags::B,
        ..Default::default()
    });
    tracker.tick();
    script.disconnect(0);
    tracker.tick();

    // Button was held before the unplug, but a disconnected slot never reports a release
    assert!(!tracker.is_triggered_up(0, Button::FaceB));
    assert!(!tracker.is_button_pressed(0, Button::FaceB));
    assert_eq!(tracker.analog_state(0, AnalogChannel::TriggerL), 0.0);
}

#[test]
fn test_connected_count_matches_slots() {
    let (script, mut tracker) = make_tracker();
    let steps: [&[(usize, bool)]; 5] = [
        &[(0, true), (2, true)],
        &[(1, true)],
        &[(0, false), (3, true)],
        &[(1, false), (2, false), (3, false)],
        &[(0, true)],
    ];

    for step in steps {
        for &(slot, plugged) in step {
            if plugged {
                script.connect(slot, "Pad");
            } else {
                script.disconnect(slot);
            }
        }
        tracker.tick();
        let actual = (0..MAX_DEVICES).filter(|&s| tracker.is_connected(s)).count();
        assert_eq!(tracker.connected_count(), actual);
    }
    assert_eq!(tracker.connected_count(), 1);
}

#[test]
fn test_invalid_slot_is_harmless() {
    let (_script, mut tracker) = make_tracker();
    let invalid = MAX_DEVICES;

    assert!(!tracker.is_connected(invalid));
    assert_eq!(tracker.connection_id(invalid), DISCONNECTED);
    assert_eq!(tracker.product_name(invalid), "");
    assert_eq!(tracker.analog_states(invalid), &AnalogState::default());
    assert_eq!(tracker.prev_digital_states(invalid), &DigitalState::default());
    assert!(!tracker.is_triggered_down(invalid, Button::FaceA));
    assert_eq!(tracker.dead_zone(invalid), DeadZone::default());
    assert_eq!(tracker.dump(invalid, StreamType::All), "");
    assert!(tracker.slot_state(invalid).is_none());

    assert!(matches!(
        tracker.set_dead_zone(invalid, 0.1, 0.1),
        Err(TrackerError::InvalidSlot { index: 4 })
    ));
    assert!(matches!(
        tracker.set_vibration(invalid, 1.0, 1.0),
        Err(TrackerError::InvalidSlot { index: 4 })
    ));
}

#[test]
fn test_init_devices_is_idempotent() {
    let (script, mut tracker) = make_tracker();
    let counter = Arc::new(AtomicUsize::new(0));
    tracker.on_connected(counter_callback(&counter));

    script.connect(0, "Pad");
    script.connect(2, "Pad");
    tracker.init_devices();
    assert_eq!(tracker.connected_count(), 2);
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    tracker.init_devices();
    assert_eq!(tracker.connected_count(), 2);
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    // A tick after the scan sees no new connection
    tracker.tick();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert!(!tracker.is_just_connected(0));
}

#[test]
fn test_refresh_called_once_per_tick() {
    let (script, mut tracker) = make_tracker();
    tracker.tick();
    tracker.tick();
    assert_eq!(script.refreshes(), 2);
}

#[test]
fn test_packet_number_tracks_last_sample() {
    let (script, mut tracker) = make_tracker();
    script.set_state(1, RawGamepadState {
        packet_number: 7,
        ..Default::default()
    });
    tracker.tick();
    assert_eq!(tracker.slot_state(1).map(|s| s.packet_number), Some(7));

    script.set_state(1, RawGamepadState {
        packet_number: 8,
        buttons: button_flags::A,
        ..Default::default()
    });
    tracker.tick();
    assert_eq!(tracker.slot_state(1).map(|s| s.packet_number), Some(8));

    script.disconnect(1);
    tracker.tick();
    assert_eq!(tracker.slot_state(1).map(|s| s.packet_number), Some(0));
}

#[test]
fn test_dump_connected_slot() {
    let (script, mut tracker) = make_tracker();
    script.set_state(0, RawGamepadState {
        right_trigger: 255,
        buttons: button_flags::X,
        ..Default::default()
    });
    tracker.tick();

    let out = tracker.dump(0, StreamType::All);
    assert!(out.contains("GamepadTracker: Trigger_R   = 1\n"));
    assert!(out.contains("GamepadTracker: Face_X         = TRUE\n"));

    let analog = tracker.dump(0, StreamType::Analog);
    assert!(!analog.contains("DIGITAL"));
}

#[test]
fn test_product_name_is_bounded() {
    let (script, mut tracker) = make_tracker();
    script.connect(0, &"Very Long Controller Name ".repeat(4));
    tracker.tick();
    assert!(tracker.product_name(0).len() <= crate::input::gamepad::MAX_PRODUCT_NAME);
}

#[test]
fn test_from_config_with_null_backend() {
    let config = TrackerConfig {
        backend: crate::input::gamepad::BackendKind::None,
        async_callbacks: true,
        ..TrackerConfig::default()
    };
    let mut tracker = GamepadTracker::from_config(&config);
    assert_eq!(tracker.backend_name(), "none");
    assert_eq!(tracker.dispatch_mode(), DispatchMode::Async);

    tracker.init_devices();
    tracker.tick();
    assert_eq!(tracker.connected_count(), 0);

    tracker.set_async_callbacks(false);
    assert_eq!(tracker.dispatch_mode(), DispatchMode::Sync);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_async_callbacks_run_detached() {
    let (script, mut tracker) = make_tracker();
    tracker.set_async_callbacks(true);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let connected_tx = tx.clone();
    tracker.on_connected(move |slot| {
        let _ = connected_tx.send(("connected", slot));
    });
    tracker.on_disconnected(move |slot| {
        let _ = tx.send(("disconnected", slot));
    });

    script.connect(2, "Pad");
    tracker.tick();
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert_eq!(event, Some(("connected", 2)));

    script.disconnect(2);
    tracker.tick();
    let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert_eq!(event, Some(("disconnected", 2)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_async_callback_does_not_block_tick() {
    let (script, mut tracker) = make_tracker();
    tracker.set_async_callbacks(true);

    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();
    tracker.on_connected(move |slot| {
        let _ = release_rx.lock().recv_timeout(Duration::from_secs(5));
        let _ = done_tx.send(slot);
    });

    script.connect(0, "Pad");
    // Returns while the callback is still parked
    tracker.tick();
    assert!(tracker.is_connected(0));
    assert!(done_rx.try_recv().is_err());

    release_tx.send(()).unwrap();
    let slot = tokio::time::timeout(Duration::from_secs(5), done_rx.recv()).await.unwrap();
    assert_eq!(slot, Some(0));
}

#[tokio::test]
async fn test_async_panic_is_contained_on_current_thread_runtime() {
    let (script, mut tracker) = make_tracker();
    tracker.set_async_callbacks(true);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    tracker.on_connected(|_| panic!("callback failure"));
    tracker.on_connected(move |slot| {
        let _ = tx.send(slot);
    });

    script.connect(1, "Pad");
    tracker.tick();

    let slot = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert_eq!(slot, Some(1));
    assert_eq!(tracker.connected_count(), 1);
}
