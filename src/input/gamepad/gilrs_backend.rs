//! Cross-platform backend built on gilrs
//!
//! gilrs devices have no natural port number, so connected gamepads are
//! assigned to the first free slot and keep it until they disconnect. State
//! is converted into the XInput raw layout so the tracker sees one format
//! regardless of platform.

use gilrs::ff::{BaseEffect, BaseEffectType, Effect, EffectBuilder, Repeat, Replay, Ticks};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use tracing::{debug, info, trace};

use super::backend::GamepadBackend;
use super::error::BackendError;
use super::slot::SlotAssignments;
use super::types::MAX_DEVICES;
use super::xinput_convert::{button_flags, RawGamepadState};

/// gilrs standard buttons and their XInput flag
///
/// gilrs reports face buttons by position, South being the Xbox "A".
const BUTTON_MAP: [(Button, u16); 14] = [
    (Button::South, button_flags::A),
    (Button::East, button_flags::B),
    (Button::West, button_flags::X),
    (Button::North, button_flags::Y),
    (Button::DPadUp, button_flags::DPAD_UP),
    (Button::DPadDown, button_flags::DPAD_DOWN),
    (Button::DPadLeft, button_flags::DPAD_LEFT),
    (Button::DPadRight, button_flags::DPAD_RIGHT),
    (Button::LeftTrigger, button_flags::LEFT_SHOULDER),
    (Button::RightTrigger, button_flags::RIGHT_SHOULDER),
    (Button::LeftThumb, button_flags::LEFT_THUMB),
    (Button::RightThumb, button_flags::RIGHT_THUMB),
    (Button::Select, button_flags::BACK),
    (Button::Start, button_flags::START),
];

pub struct GilrsBackend {
    gilrs: Gilrs,
    assignments: SlotAssignments<GamepadId>,
    rumble: [Option<Effect>; MAX_DEVICES],
    /// Bumped for every drained event and reported as the packet number
    packet: u32,
}

impl GilrsBackend {
    /// Initialize gilrs and assign every gamepad that is already connected
    pub fn new() -> Result<Self, BackendError> {
        let gilrs = Gilrs::new().map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let mut backend = Self {
            gilrs,
            assignments: SlotAssignments::new(),
            rumble: std::array::from_fn(|_| None),
            packet: 0,
        };

        let present: Vec<_> = backend
            .gilrs
            .gamepads()
            .filter(|(_, gp)| gp.is_connected())
            .map(|(id, gp)| (id, gp.name().to_string()))
            .collect();

        for (id, name) in present {
            if let Some(slot) = backend.assignments.try_assign(id) {
                info!("gilrs gamepad \"{}\" ({:?}) in slot {}", name, id, slot);
            }
        }

        Ok(backend)
    }

    fn gamepad_in(&self, slot: usize) -> Option<Gamepad<'_>> {
        let id = self.assignments.device_in(slot)?;
        self.gilrs.connected_gamepad(id)
    }

    fn release(&mut self, id: GamepadId) {
        if let Some(slot) = self.assignments.release(id) {
            // Dropping the effect stops any rumble still playing
            self.rumble[slot] = None;
        }
    }
}

impl GamepadBackend for GilrsBackend {
    fn name(&self) -> &'static str {
        "gilrs"
    }

    fn refresh(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            self.packet = self.packet.wrapping_add(1);
            match event {
                EventType::Connected => {
                    debug!("gilrs gamepad {:?} connected", id);
                    self.assignments.try_assign(id);
                },
                EventType::Disconnected => {
                    debug!("gilrs gamepad {:?} disconnected", id);
                    self.release(id);
                },
                _ => {},
            }
        }
    }

    fn query_raw_state(&mut self, slot: usize) -> Option<RawGamepadState> {
        let gamepad = self.gamepad_in(slot)?;
        Some(raw_state(&gamepad, self.packet))
    }

    fn query_device_name(&mut self, slot: usize) -> String {
        self.gamepad_in(slot)
            .map(|gp| gp.name().to_string())
            .unwrap_or_default()
    }

    fn set_motor_speeds(&mut self, slot: usize, left: u16, right: u16) -> Result<(), BackendError> {
        let rejected = |reason: String| BackendError::Rejected { slot, reason };

        let id = self
            .assignments
            .device_in(slot)
            .ok_or_else(|| rejected("no gamepad assigned".to_string()))?;

        // Replacing or dropping the previous effect stops it
        self.rumble[slot] = None;
        if left == 0 && right == 0 {
            trace!("Rumble stopped on slot {}", slot);
            return Ok(());
        }

        let supported = self
            .gilrs
            .connected_gamepad(id)
            .is_some_and(|gp| gp.is_ff_supported());
        if !supported {
            return Err(rejected("force feedback not supported".to_string()));
        }

        let effect = EffectBuilder::new()
            .add_effect(motor_effect(BaseEffectType::Strong { magnitude: left }))
            .add_effect(motor_effect(BaseEffectType::Weak { magnitude: right }))
            .repeat(Repeat::Infinitely)
            .gamepads(&[id])
            .finish(&mut self.gilrs)
            .map_err(|e| rejected(e.to_string()))?;
        effect.play().map_err(|e| rejected(e.to_string()))?;

        self.rumble[slot] = Some(effect);
        Ok(())
    }
}

fn motor_effect(kind: BaseEffectType) -> BaseEffect {
    BaseEffect {
        kind,
        scheduling: Replay {
            play_for: Ticks::from_ms(1000),
            ..Default::default()
        },
        envelope: Default::default(),
    }
}

fn raw_state(gamepad: &Gamepad<'_>, packet_number: u32) -> RawGamepadState {
    let trigger = |button| {
        gamepad
            .button_data(button)
            .map_or(0.0, |data| data.value())
    };

    RawGamepadState {
        packet_number,
        buttons: button_mask(|button| gamepad.is_pressed(button)),
        left_trigger: trigger_to_raw(trigger(Button::LeftTrigger2)),
        right_trigger: trigger_to_raw(trigger(Button::RightTrigger2)),
        thumb_lx: stick_to_raw(gamepad.value(Axis::LeftStickX)),
        thumb_ly: stick_to_raw(gamepad.value(Axis::LeftStickY)),
        thumb_rx: stick_to_raw(gamepad.value(Axis::RightStickX)),
        thumb_ry: stick_to_raw(gamepad.value(Axis::RightStickY)),
    }
}

/// Build an XInput button mask from a pressed predicate
fn button_mask(is_pressed: impl Fn(Button) -> bool) -> u16 {
    BUTTON_MAP
        .iter()
        .filter(|(button, _)| is_pressed(*button))
        .fold(0, |mask, (_, flag)| mask | flag)
}

/// gilrs trigger value (0.0..=1.0) to the XInput 8-bit range
fn trigger_to_raw(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// gilrs stick value (-1.0..=1.0) to the XInput 16-bit range
fn stick_to_raw(value: f32) -> i16 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_mask() {
        assert_eq!(button_mask(|_| false), 0);
        assert_eq!(button_mask(|b| b == Button::South), button_flags::A);
        assert_eq!(
            button_mask(|b| matches!(b, Button::Start | Button::DPadLeft)),
            button_flags::START | button_flags::DPAD_LEFT
        );
        assert_eq!(button_mask(|_| true), 0xF3FF);
    }

    #[test]
    fn test_trigger_conversion() {
        assert_eq!(trigger_to_raw(0.0), 0);
        assert_eq!(trigger_to_raw(1.0), 255);
        assert_eq!(trigger_to_raw(0.5), 128);
        assert_eq!(trigger_to_raw(2.0), 255);
    }

    #[test]
    fn test_stick_conversion() {
        assert_eq!(stick_to_raw(0.0), 0);
        assert_eq!(stick_to_raw(1.0), 32767);
        assert_eq!(stick_to_raw(-1.0), -32767);
        assert_eq!(stick_to_raw(-3.0), -32767);
        assert_eq!(stick_to_raw(f32::NAN), 0);
    }
}
