//! Deterministic scripted backend
//!
//! Clones share one script, so a test (or a host simulating input) keeps a
//! handle while the tracker owns another and drives it through `tick()`.

use parking_lot::Mutex;
use std::sync::Arc;

use super::backend::GamepadBackend;
use super::error::BackendError;
use super::types::MAX_DEVICES;
use super::xinput_convert::RawGamepadState;

#[derive(Debug, Default)]
struct Script {
    samples: [Option<RawGamepadState>; MAX_DEVICES],
    names: [String; MAX_DEVICES],
    motor_commands: Vec<MotorCommand>,
    reject_motors: bool,
    refreshes: u64,
}

/// A motor command received by the scripted backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCommand {
    pub slot: usize,
    pub left: u16,
    pub right: u16,
}

/// Backend whose slots report whatever the script says
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plug a device with a neutral sample into `slot`
    pub fn connect(&self, slot: usize, name: &str) {
        let mut script = self.script.lock();
        if slot < MAX_DEVICES {
            script.samples[slot] = Some(RawGamepadState::default());
            script.names[slot] = name.to_string();
        }
    }

    /// Unplug the device in `slot`
    pub fn disconnect(&self, slot: usize) {
        if let Some(sample) = self.script.lock().samples.get_mut(slot) {
            *sample = None;
        }
    }

    /// Replace the sample reported for `slot` (connects it if needed)
    pub fn set_state(&self, slot: usize, state: RawGamepadState) {
        if let Some(sample) = self.script.lock().samples.get_mut(slot) {
            *sample = Some(state);
        }
    }

    /// Update only the button mask of a connected slot
    pub fn set_buttons(&self, slot: usize, buttons: u16) {
        if let Some(Some(sample)) = self.script.lock().samples.get_mut(slot) {
            sample.buttons = buttons;
        }
    }

    /// Make subsequent motor commands fail
    pub fn reject_motors(&self, reject: bool) {
        self.script.lock().reject_motors = reject;
    }

    /// All motor commands accepted so far
    pub fn motor_commands(&self) -> Vec<MotorCommand> {
        self.script.lock().motor_commands.clone()
    }

    /// Number of `refresh` calls seen
    pub fn refreshes(&self) -> u64 {
        self.script.lock().refreshes
    }
}

impl GamepadBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn refresh(&mut self) {
        self.script.lock().refreshes += 1;
    }

    fn query_raw_state(&mut self, slot: usize) -> Option<RawGamepadState> {
        self.script.lock().samples.get(slot).copied().flatten()
    }

    fn query_device_name(&mut self, slot: usize) -> String {
        self.script
            .lock()
            .names
            .get(slot)
            .cloned()
            .unwrap_or_default()
    }

    fn set_motor_speeds(&mut self, slot: usize, left: u16, right: u16) -> Result<(), BackendError> {
        let mut script = self.script.lock();
        if script.reject_motors {
            return Err(BackendError::Rejected {
                slot,
                reason: "scripted rejection".to_string(),
            });
        }
        script.motor_commands.push(MotorCommand { slot, left, right });
        Ok(())
    }
}
