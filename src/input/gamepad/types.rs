//! Gamepad control state type definitions
//!
//! Analog and digital channels are stored in fixed arrays indexed by closed
//! enums, so every channel can be iterated and compared without per-field code.

use std::ops::{Index, IndexMut};

/// Number of controller slots (XInput user indices 0-3)
pub const MAX_DEVICES: usize = 4;

/// Number of digital channels per slot
pub const GP_MAX_BUTTONS: usize = 14;

/// Number of analog channels per slot
pub const GP_MAX_ANALOG: usize = 8;

/// Default thumbstick deadzone (normalized units)
pub const DEFAULT_DEADZONE: f32 = 0.04;

/// Numeric connection id reported for a disconnected slot
pub const DISCONNECTED: i16 = -1;

/// Maximum stored product name length in bytes
pub const MAX_PRODUCT_NAME: usize = 32;

/// Digital buttons, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    FaceA,
    FaceB,
    FaceX,
    FaceY,
    DpadLeft,
    DpadRight,
    DpadUp,
    DpadDown,
    ShoulderLeft,
    ShoulderRight,
    ThumbLeft,
    ThumbRight,
    Back,
    Start,
}

impl Button {
    pub const ALL: [Button; GP_MAX_BUTTONS] = [
        Button::FaceA,
        Button::FaceB,
        Button::FaceX,
        Button::FaceY,
        Button::DpadLeft,
        Button::DpadRight,
        Button::DpadUp,
        Button::DpadDown,
        Button::ShoulderLeft,
        Button::ShoulderRight,
        Button::ThumbLeft,
        Button::ThumbRight,
        Button::Back,
        Button::Start,
    ];

    /// Label used in diagnostic dumps
    pub fn label(self) -> &'static str {
        match self {
            Button::FaceA => "Face_A",
            Button::FaceB => "Face_B",
            Button::FaceX => "Face_X",
            Button::FaceY => "Face_Y",
            Button::DpadLeft => "Dpad_Left",
            Button::DpadRight => "Dpad_Right",
            Button::DpadUp => "Dpad_Up",
            Button::DpadDown => "Dpad_Down",
            Button::ShoulderLeft => "Shoulder_Left",
            Button::ShoulderRight => "Shoulder_Right",
            Button::ThumbLeft => "Thumb_Left",
            Button::ThumbRight => "Thumb_Right",
            Button::Back => "Back",
            Button::Start => "Start",
        }
    }
}

/// Analog channels, in storage order
///
/// Value ranges:
/// - `TriggerL`, `TriggerR`, `VibrationL`, `VibrationR`: 0.0 to 1.0
/// - `ThumbLX`, `ThumbLY`, `ThumbRX`, `ThumbRY`: -1.0 to ~1.0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogChannel {
    TriggerL,
    TriggerR,
    ThumbLX,
    ThumbLY,
    ThumbRX,
    ThumbRY,
    VibrationL,
    VibrationR,
}

impl AnalogChannel {
    pub const ALL: [AnalogChannel; GP_MAX_ANALOG] = [
        AnalogChannel::TriggerL,
        AnalogChannel::TriggerR,
        AnalogChannel::ThumbLX,
        AnalogChannel::ThumbLY,
        AnalogChannel::ThumbRX,
        AnalogChannel::ThumbRY,
        AnalogChannel::VibrationL,
        AnalogChannel::VibrationR,
    ];

    /// Label used in diagnostic dumps
    pub fn label(self) -> &'static str {
        match self {
            AnalogChannel::TriggerL => "Trigger_L",
            AnalogChannel::TriggerR => "Trigger_R",
            AnalogChannel::ThumbLX => "Thumb_L_X",
            AnalogChannel::ThumbLY => "Thumb_L_Y",
            AnalogChannel::ThumbRX => "Thumb_R_X",
            AnalogChannel::ThumbRY => "Thumb_R_Y",
            AnalogChannel::VibrationL => "Vibration_L",
            AnalogChannel::VibrationR => "Vibration_R",
        }
    }
}

/// Normalized analog channel values for one slot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalogState(pub [f32; GP_MAX_ANALOG]);

impl Index<AnalogChannel> for AnalogState {
    type Output = f32;

    fn index(&self, channel: AnalogChannel) -> &f32 {
        &self.0[channel as usize]
    }
}

impl IndexMut<AnalogChannel> for AnalogState {
    fn index_mut(&mut self, channel: AnalogChannel) -> &mut f32 {
        &mut self.0[channel as usize]
    }
}

/// Pressed flags for one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DigitalState(pub [bool; GP_MAX_BUTTONS]);

impl DigitalState {
    /// Buttons currently pressed, in storage order
    pub fn pressed(&self) -> impl Iterator<Item = Button> + '_ {
        Button::ALL.into_iter().filter(|b| self[*b])
    }
}

impl Index<Button> for DigitalState {
    type Output = bool;

    fn index(&self, button: Button) -> &bool {
        &self.0[button as usize]
    }
}

impl IndexMut<Button> for DigitalState {
    fn index_mut(&mut self, button: Button) -> &mut bool {
        &mut self.0[button as usize]
    }
}

/// Per-axis thumbstick deadzone thresholds
///
/// Always stored as absolute magnitudes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadZone {
    pub x: f32,
    pub y: f32,
}

impl DeadZone {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x: x.abs(), y: y.abs() }
    }
}

impl Default for DeadZone {
    fn default() -> Self {
        Self {
            x: DEFAULT_DEADZONE,
            y: DEFAULT_DEADZONE,
        }
    }
}

/// One frame of control state for a slot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Controls {
    pub analog: AnalogState,
    pub digital: DigitalState,
    pub deadzone: DeadZone,
}

impl Controls {
    /// Zero all channels and restore the given deadzone
    pub fn reset(&mut self, deadzone: DeadZone) {
        self.analog = AnalogState::default();
        self.digital = DigitalState::default();
        self.deadzone = deadzone;
    }
}

/// Section filter for diagnostic dumps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamType {
    #[default]
    All,
    Digital,
    Analog,
}

impl StreamType {
    pub fn includes_analog(self) -> bool {
        matches!(self, StreamType::All | StreamType::Analog)
    }

    pub fn includes_digital(self) -> bool {
        matches!(self, StreamType::All | StreamType::Digital)
    }
}

impl std::str::FromStr for StreamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(StreamType::All),
            "digital" => Ok(StreamType::Digital),
            "analog" => Ok(StreamType::Analog),
            other => Err(format!("unknown stream type: {}", other)),
        }
    }
}
