//! Raw XInput-layout samples and conversion to digital state
//!
//! Every backend reports in the XInput layout (16-bit button mask, byte
//! triggers, signed 16-bit sticks), so the tracker only needs one decoder.

use super::types::{Button, DigitalState};

/// XInput button bit flags
///
/// rusty_xinput doesn't export individual button constants,
/// so we define them here from the XInput API documentation.
pub mod button_flags {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// One raw controller sample as reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawGamepadState {
    pub packet_number: u32,
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

#[cfg(windows)]
impl From<&rusty_xinput::XInputState> for RawGamepadState {
    fn from(state: &rusty_xinput::XInputState) -> Self {
        Self {
            packet_number: state.raw.dwPacketNumber,
            buttons: state.raw.Gamepad.wButtons,
            left_trigger: state.left_trigger(),
            right_trigger: state.right_trigger(),
            thumb_lx: state.raw.Gamepad.sThumbLX,
            thumb_ly: state.raw.Gamepad.sThumbLY,
            thumb_rx: state.raw.Gamepad.sThumbRX,
            thumb_ry: state.raw.Gamepad.sThumbRY,
        }
    }
}

/// Mask bit backing each digital channel
pub const fn button_flag(button: Button) -> u16 {
    match button {
        Button::FaceA => button_flags::A,
        Button::FaceB => button_flags::B,
        Button::FaceX => button_flags::X,
        Button::FaceY => button_flags::Y,
        Button::DpadLeft => button_flags::DPAD_LEFT,
        Button::DpadRight => button_flags::DPAD_RIGHT,
        Button::DpadUp => button_flags::DPAD_UP,
        Button::DpadDown => button_flags::DPAD_DOWN,
        Button::ShoulderLeft => button_flags::LEFT_SHOULDER,
        Button::ShoulderRight => button_flags::RIGHT_SHOULDER,
        Button::ThumbLeft => button_flags::LEFT_THUMB,
        Button::ThumbRight => button_flags::RIGHT_THUMB,
        Button::Back => button_flags::BACK,
        Button::Start => button_flags::START,
    }
}

/// Decode a raw button mask into digital channels
pub fn update_digital(digital: &mut DigitalState, buttons: u16) {
    for button in Button::ALL {
        digital[button] = buttons & button_flag(button) != 0;
    }
}

/// Poll XInput controller and return current state if available
///
/// # Returns
/// - `Ok(Some(state))` if controller is connected
/// - `Ok(None)` if controller is not connected
/// - `Err(_)` if XInput API failed
#[cfg(windows)]
pub fn poll_xinput_controller(
    handle: &rusty_xinput::XInputHandle,
    user_index: u32,
) -> Result<Option<rusty_xinput::XInputState>, rusty_xinput::XInputUsageError> {
    use rusty_xinput::XInputUsageError;

    match handle.get_state(user_index) {
        Ok(state) => Ok(Some(state)),
        Err(XInputUsageError::DeviceNotConnected) => Ok(None),
        Err(e) => Err(e),
    }
}
