//! Direct XInput backend (Windows only)
//!
//! XInput user indices map one-to-one onto tracker slots.

use rusty_xinput::XInputHandle;
use tracing::{trace, warn};

use super::backend::GamepadBackend;
use super::error::BackendError;
use super::xinput_convert::{poll_xinput_controller, RawGamepadState};

pub struct XInputBackend {
    handle: XInputHandle,
}

impl XInputBackend {
    /// Load the XInput library
    pub fn load() -> Result<Self, BackendError> {
        let handle = XInputHandle::load_default()
            .map_err(|e| BackendError::Unavailable(format!("{:?}", e)))?;
        Ok(Self { handle })
    }
}

impl GamepadBackend for XInputBackend {
    fn name(&self) -> &'static str {
        "xinput"
    }

    fn query_raw_state(&mut self, slot: usize) -> Option<RawGamepadState> {
        let user_index = u32::try_from(slot).ok()?;
        match poll_xinput_controller(&self.handle, user_index) {
            Ok(state) => state.as_ref().map(RawGamepadState::from),
            Err(e) => {
                trace!("XInput poll failed for slot {}: {:?}", slot, e);
                None
            },
        }
    }

    fn query_device_name(&mut self, slot: usize) -> String {
        format!("XInput Controller {}", slot + 1)
    }

    fn set_motor_speeds(&mut self, slot: usize, left: u16, right: u16) -> Result<(), BackendError> {
        let user_index = u32::try_from(slot).map_err(|e| BackendError::Rejected {
            slot,
            reason: e.to_string(),
        })?;

        self.handle
            .set_state(user_index, left, right)
            .map_err(|e| {
                warn!("XInput rejected motor command for slot {}: {:?}", slot, e);
                BackendError::Rejected {
                    slot,
                    reason: format!("{:?}", e),
                }
            })
    }
}
