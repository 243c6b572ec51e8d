//! padstate - per-frame gamepad state tracking
//!
//! Four fixed controller slots polled once per tick, with button and
//! connection edge detection, per-axis thumbstick deadzones, rumble and
//! connect/disconnect callbacks.

pub mod config;
pub mod input;

pub use config::TrackerConfig;
pub use input::gamepad::{
    AnalogChannel, BackendKind, Button, GamepadBackend, GamepadTracker, StreamType, TrackerError,
};
