//! Platform input backends
//!
//! The tracker never talks to a driver directly. It polls a [`GamepadBackend`]
//! once per slot per tick and sends motor commands through it, which lets the
//! XInput, gilrs and scripted backends be swapped without touching tracker
//! logic.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::BackendError;
use super::xinput_convert::RawGamepadState;

/// Capability interface consumed by the tracker
pub trait GamepadBackend {
    /// Short backend name for logging
    fn name(&self) -> &'static str;

    /// Drain pending platform events (called once at the start of each tick)
    fn refresh(&mut self) {}

    /// Poll the raw state of a slot, `None` if nothing answers there
    fn query_raw_state(&mut self, slot: usize) -> Option<RawGamepadState>;

    /// Product name of the device in a slot
    fn query_device_name(&mut self, slot: usize) -> String;

    /// Drive the left (low-frequency) and right (high-frequency) motors
    fn set_motor_speeds(&mut self, slot: usize, left: u16, right: u16) -> Result<(), BackendError>;
}

impl<B: GamepadBackend + ?Sized> GamepadBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn refresh(&mut self) {
        (**self).refresh()
    }

    fn query_raw_state(&mut self, slot: usize) -> Option<RawGamepadState> {
        (**self).query_raw_state(slot)
    }

    fn query_device_name(&mut self, slot: usize) -> String {
        (**self).query_device_name(slot)
    }

    fn set_motor_speeds(&mut self, slot: usize, left: u16, right: u16) -> Result<(), BackendError> {
        (**self).set_motor_speeds(slot, left, right)
    }
}

/// Backend with nothing attached
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl GamepadBackend for NullBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn query_raw_state(&mut self, _slot: usize) -> Option<RawGamepadState> {
        None
    }

    fn query_device_name(&mut self, _slot: usize) -> String {
        String::new()
    }

    fn set_motor_speeds(&mut self, slot: usize, _left: u16, _right: u16) -> Result<(), BackendError> {
        Err(BackendError::Rejected {
            slot,
            reason: "no backend attached".to_string(),
        })
    }
}

/// Backend selection in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// XInput on Windows, then gilrs, then nothing
    #[default]
    Auto,
    #[serde(rename = "xinput")]
    XInput,
    Gilrs,
    None,
}

/// Build the backend named by `kind`, falling back gracefully
///
/// An explicitly requested backend that fails to load degrades to
/// [`NullBackend`] with a warning rather than an error.
pub fn create_backend(kind: BackendKind) -> Box<dyn GamepadBackend> {
    match kind {
        BackendKind::Auto => load_xinput()
            .or_else(load_gilrs)
            .unwrap_or_else(|| {
                debug!("No gamepad backend available, continuing without gamepads");
                null_backend()
            }),
        BackendKind::XInput => load_xinput().unwrap_or_else(|| {
            warn!("XInput backend requested but unavailable on this system");
            null_backend()
        }),
        BackendKind::Gilrs => load_gilrs().unwrap_or_else(|| {
            warn!("gilrs backend requested but unavailable (feature disabled or init failed)");
            null_backend()
        }),
        BackendKind::None => null_backend(),
    }
}

fn null_backend() -> Box<dyn GamepadBackend> {
    Box::new(NullBackend)
}

#[cfg(windows)]
fn load_xinput() -> Option<Box<dyn GamepadBackend>> {
    match super::xinput_backend::XInputBackend::load() {
        Ok(backend) => {
            debug!("XInput initialized successfully");
            Some(Box::new(backend))
        },
        Err(e) => {
            warn!("XInput library not available: {}", e);
            None
        },
    }
}

#[cfg(not(windows))]
fn load_xinput() -> Option<Box<dyn GamepadBackend>> {
    None
}

#[cfg(feature = "gilrs")]
fn load_gilrs() -> Option<Box<dyn GamepadBackend>> {
    match super::gilrs_backend::GilrsBackend::new() {
        Ok(backend) => {
            debug!("gilrs initialized");
            Some(Box::new(backend))
        },
        Err(e) => {
            warn!("Failed to initialize gilrs: {}", e);
            None
        },
    }
}

#[cfg(not(feature = "gilrs"))]
fn load_gilrs() -> Option<Box<dyn GamepadBackend>> {
    None
}
