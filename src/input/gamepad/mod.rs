//! Fixed-slot gamepad state tracking
//!
//! Polls up to four controllers through a platform backend, keeps one frame
//! of history per slot for edge detection, and reports connect/disconnect
//! transitions to registered callbacks.

pub mod backend;
pub mod callbacks;
pub mod diagnostics;
pub mod dump;
pub mod error;
#[cfg(feature = "gilrs")]
pub mod gilrs_backend;
pub mod normalize;
pub mod scripted;
pub mod slot;
pub mod tracker;
pub mod types;
#[cfg(windows)]
pub mod xinput_backend;
pub mod xinput_convert;

pub use backend::{create_backend, BackendKind, GamepadBackend, NullBackend};
pub use callbacks::{CallbackHandle, ConnectionCallback, ConnectionEvent, DispatchMode};
pub use diagnostics::print_gamepad_diagnostics;
pub use error::{BackendError, TrackerError};
#[cfg(feature = "gilrs")]
pub use gilrs_backend::GilrsBackend;
pub use scripted::{MotorCommand, ScriptedBackend};
pub use slot::GamepadSlot;
pub use tracker::GamepadTracker;
pub use types::*;
#[cfg(windows)]
pub use xinput_backend::XInputBackend;
pub use xinput_convert::{button_flags, RawGamepadState};
