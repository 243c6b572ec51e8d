//! Normalization functions for raw trigger and thumbstick readings.
//!
//! # Trigger Normalization
//!
//! Triggers report 0-255 and map linearly onto 0.0..=1.0.
//!
//! # Stick Normalization
//!
//! Sticks report -32768..=32767 and are divided by 32767, so 32767 maps to
//! 1.0. The one extra negative step (-32768) would fall just below -1.0 and
//! is clamped back to exactly -1.0. Only the lower bound is clamped.
//!
//! Deadzone filtering is per axis (square deadzone): X and Y are compared
//! against their own thresholds independently.

use super::types::{AnalogChannel, AnalogState, DeadZone};
use super::xinput_convert::RawGamepadState;

/// Divisor for raw thumbstick values
pub const STICK_RANGE: f32 = 32767.0;

/// Divisor for raw trigger values
pub const TRIGGER_MAX: f32 = 255.0;

/// Normalize a raw trigger byte to 0.0..=1.0
pub fn normalize_trigger(raw: u8) -> f32 {
    raw as f32 / TRIGGER_MAX
}

/// Normalize a raw thumbstick axis
///
/// # Example
/// ```
/// use padstate::input::gamepad::normalize::normalize_stick;
///
/// assert_eq!(normalize_stick(i16::MIN), -1.0);
/// assert_eq!(normalize_stick(0), 0.0);
/// assert_eq!(normalize_stick(i16::MAX), 1.0);
/// assert_eq!(normalize_stick(16384), 16384.0 / 32767.0);
/// ```
pub fn normalize_stick(raw: i16) -> f32 {
    (raw as f32 / STICK_RANGE).max(-1.0)
}

/// Force an axis to exactly zero when its magnitude is below `threshold`
pub fn apply_deadzone(value: f32, threshold: f32) -> f32 {
    if value.abs() < threshold {
        0.0
    } else {
        value
    }
}

/// Recompute triggers and thumbsticks from a raw sample
///
/// Vibration channels are left untouched; they hold the last commanded
/// motor set-points rather than readings.
pub fn update_analog(analog: &mut AnalogState, raw: &RawGamepadState, deadzone: &DeadZone) {
    analog[AnalogChannel::TriggerL] = normalize_trigger(raw.left_trigger);
    analog[AnalogChannel::TriggerR] = normalize_trigger(raw.right_trigger);

    analog[AnalogChannel::ThumbLX] = apply_deadzone(normalize_stick(raw.thumb_lx), deadzone.x);
    analog[AnalogChannel::ThumbLY] = apply_deadzone(normalize_stick(raw.thumb_ly), deadzone.y);
    analog[AnalogChannel::ThumbRX] = apply_deadzone(normalize_stick(raw.thumb_rx), deadzone.x);
    analog[AnalogChannel::ThumbRY] = apply_deadzone(normalize_stick(raw.thumb_ry), deadzone.y);
}

/// Clamp a vibration set-point to 0.0..=1.0 (NaN becomes 0.0)
pub fn clamp_vibration(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Convert a clamped vibration set-point to the 16-bit motor range
pub fn motor_speed(value: f32) -> u16 {
    (65535.0 * clamp_vibration(value)).round() as u16
}
