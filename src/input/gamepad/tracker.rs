//! Fixed four-slot gamepad state tracker
//!
//! [`GamepadTracker::tick`] re-polls the backend once per frame and keeps a
//! double-buffered snapshot per slot, so button and connection edges can be
//! answered by comparing the current frame with the previous one.
//!
//! The tracker has a single owner and no internal locking. Only async callback
//! dispatch introduces concurrency.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::backend::{create_backend, GamepadBackend};
use super::callbacks::{CallbackHandle, CallbackMap, ConnectionEvent, DispatchMode};
use super::dump::write_controls;
use super::error::TrackerError;
use super::normalize::{clamp_vibration, motor_speed, update_analog};
use super::slot::GamepadSlot;
use super::types::{
    AnalogChannel, AnalogState, Button, Controls, DeadZone, DigitalState, StreamType, DISCONNECTED,
    MAX_DEVICES,
};
use super::xinput_convert::{update_digital, RawGamepadState};
use crate::config::TrackerConfig;

#[cfg(test)]
mod tests;

/// Double-buffered controller state for [`MAX_DEVICES`] slots
pub struct GamepadTracker<B: GamepadBackend = Box<dyn GamepadBackend>> {
    backend: B,
    slots: [GamepadSlot; MAX_DEVICES],
    connected: usize,
    connected_callbacks: CallbackMap,
    disconnected_callbacks: CallbackMap,
    dispatch: DispatchMode,
    default_deadzone: DeadZone,
    /// Returned by reference for invalid slot indices
    fallback: Controls,
}

impl GamepadTracker {
    /// Build a tracker with the backend selected by `config`
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(create_backend(config.backend), config)
    }
}

impl<B: GamepadBackend> GamepadTracker<B> {
    /// Create a tracker with every slot disconnected and zeroed
    pub fn new(backend: B, config: &TrackerConfig) -> Self {
        let default_deadzone = config.deadzone.to_dead_zone();
        let dispatch = if config.async_callbacks {
            DispatchMode::Async
        } else {
            DispatchMode::Sync
        };

        debug!(
            "Gamepad tracker using {} backend ({:?} callbacks)",
            backend.name(),
            dispatch
        );

        Self {
            backend,
            slots: std::array::from_fn(|idx| GamepadSlot::new(idx, default_deadzone)),
            connected: 0,
            connected_callbacks: CallbackMap::default(),
            disconnected_callbacks: CallbackMap::default(),
            dispatch,
            default_deadzone,
            fallback: Controls {
                deadzone: default_deadzone,
                ..Controls::default()
            },
        }
    }

    /// Create a tracker with default configuration
    pub fn with_backend(backend: B) -> Self {
        Self::new(backend, &TrackerConfig::default())
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Discover devices before the first tick
    ///
    /// Only disconnected slots are queried, so repeated calls are harmless.
    pub fn init_devices(&mut self) {
        debug!("Scanning for gamepads...");
        self.backend.refresh();

        for idx in 0..MAX_DEVICES {
            if self.slots[idx].is_connected() {
                continue;
            }
            if let Some(raw) = self.backend.query_raw_state(idx) {
                self.handle_connect(idx, &raw);
            }
        }

        debug!("Initial scan found {} gamepad(s)", self.connected);
    }

    /// Re-poll every slot and recompute the double-buffered state
    ///
    /// Must be called once per frame before queries or edge checks are trusted.
    pub fn tick(&mut self) {
        self.backend.refresh();

        for idx in 0..MAX_DEVICES {
            self.slots[idx].advance();

            match self.backend.query_raw_state(idx) {
                Some(raw) => {
                    if raw.packet_number != self.slots[idx].packet_number {
                        trace!("Slot {} sample: {:?}", idx, raw);
                    }
                    if self.slots[idx].is_connected() {
                        self.apply_sample(idx, &raw);
                    } else {
                        self.handle_connect(idx, &raw);
                    }
                },
                None => {
                    if self.slots[idx].is_connected() {
                        self.handle_disconnect(idx);
                    }
                },
            }
        }
    }

    fn apply_sample(&mut self, idx: usize, raw: &RawGamepadState) {
        let slot = &mut self.slots[idx];
        slot.packet_number = raw.packet_number;
        let deadzone = slot.controls.deadzone;
        update_analog(&mut slot.controls.analog, raw, &deadzone);
        update_digital(&mut slot.controls.digital, raw.buttons);
    }

    fn handle_connect(&mut self, idx: usize, raw: &RawGamepadState) {
        let name = self.backend.query_device_name(idx);
        self.slots[idx].connect(&name);
        self.apply_sample(idx, raw);
        self.connected += 1;

        info!("✅ Gamepad {} connected: {}", idx, self.slots[idx].product_name);
        self.connected_callbacks
            .dispatch(ConnectionEvent::Connected, idx, self.dispatch);
    }

    fn handle_disconnect(&mut self, idx: usize) {
        let slot = &mut self.slots[idx];
        let Some(id) = slot.id else {
            return;
        };
        let name = std::mem::take(&mut slot.product_name);
        slot.disconnect(self.default_deadzone);
        self.connected = self.connected.saturating_sub(1);

        info!("🔌 Gamepad {} disconnected: {}", id, name);
        self.disconnected_callbacks
            .dispatch(ConnectionEvent::Disconnected, id, self.dispatch);
    }

    /// Look up a slot, reporting out-of-range indices
    fn slot(&self, index: usize) -> Option<&GamepadSlot> {
        let slot = self.slots.get(index);
        if slot.is_none() {
            warn!("{}", TrackerError::InvalidSlot { index });
        }
        slot
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut GamepadSlot, TrackerError> {
        self.slots
            .get_mut(index)
            .ok_or(TrackerError::InvalidSlot { index })
    }

    /// Read-only view of a slot's full state
    pub fn slot_state(&self, index: usize) -> Option<&GamepadSlot> {
        self.slot(index)
    }

    /// Number of currently connected slots
    pub fn connected_count(&self) -> usize {
        self.connected
    }

    pub fn is_connected(&self, index: usize) -> bool {
        self.slot(index).is_some_and(GamepadSlot::is_connected)
    }

    /// Numeric connection id: the slot index, or [`DISCONNECTED`]
    pub fn connection_id(&self, index: usize) -> i16 {
        self.slot(index).map_or(DISCONNECTED, GamepadSlot::connection_id)
    }

    /// Product name captured on connect (empty when disconnected)
    pub fn product_name(&self, index: usize) -> &str {
        self.slot(index).map_or("", |s| s.product_name.as_str())
    }

    pub fn is_just_connected(&self, index: usize) -> bool {
        self.slot(index).is_some_and(GamepadSlot::is_just_connected)
    }

    pub fn is_just_disconnected(&self, index: usize) -> bool {
        self.slot(index).is_some_and(GamepadSlot::is_just_disconnected)
    }

    pub fn analog_states(&self, index: usize) -> &AnalogState {
        self.slot(index).map_or(&self.fallback.analog, |s| &s.controls.analog)
    }

    pub fn digital_states(&self, index: usize) -> &DigitalState {
        self.slot(index).map_or(&self.fallback.digital, |s| &s.controls.digital)
    }

    /// Analog state as of the previous tick
    pub fn prev_analog_states(&self, index: usize) -> &AnalogState {
        self.slot(index).map_or(&self.fallback.analog, |s| &s.prev_controls.analog)
    }

    /// Digital state as of the previous tick
    pub fn prev_digital_states(&self, index: usize) -> &DigitalState {
        self.slot(index).map_or(&self.fallback.digital, |s| &s.prev_controls.digital)
    }

    /// Single analog channel (0.0 when disconnected)
    pub fn analog_state(&self, index: usize, channel: AnalogChannel) -> f32 {
        match self.slot(index) {
            Some(slot) if slot.is_connected() => slot.controls.analog[channel],
            _ => 0.0,
        }
    }

    /// Whether `button` is held this tick (false when disconnected)
    pub fn is_button_pressed(&self, index: usize, button: Button) -> bool {
        match self.slot(index) {
            Some(slot) if slot.is_connected() => slot.controls.digital[button],
            _ => false,
        }
    }

    /// Pressed this tick, released the previous tick
    pub fn is_triggered_down(&self, index: usize, button: Button) -> bool {
        match self.slot(index) {
            Some(slot) if slot.is_connected() => {
                slot.controls.digital[button] && !slot.prev_controls.digital[button]
            },
            _ => false,
        }
    }

    /// Released this tick, pressed the previous tick
    pub fn is_triggered_up(&self, index: usize, button: Button) -> bool {
        match self.slot(index) {
            Some(slot) if slot.is_connected() => {
                !slot.controls.digital[button] && slot.prev_controls.digital[button]
            },
            _ => false,
        }
    }

    /// Set per-axis thumbstick deadzones (stored as absolute values)
    pub fn set_dead_zone(&mut self, index: usize, x: f32, y: f32) -> Result<(), TrackerError> {
        let slot = self.slot_mut(index).inspect_err(|e| warn!("{}", e))?;
        slot.controls.deadzone = DeadZone::new(x, y);
        debug!("Slot {} deadzone set to {:?}", index, slot.controls.deadzone);
        Ok(())
    }

    pub fn dead_zone(&self, index: usize) -> DeadZone {
        self.slot(index).map_or(self.default_deadzone, |s| s.controls.deadzone)
    }

    /// Command the rumble motors of a connected slot
    ///
    /// Both set-points are clamped to 0.0..=1.0 and stored in the vibration
    /// channels before the command is sent, so they stay observable even if
    /// the backend rejects it.
    pub fn set_vibration(&mut self, index: usize, left: f32, right: f32) -> Result<(), TrackerError> {
        let slot = self.slot_mut(index).inspect_err(|e| warn!("{}", e))?;
        if !slot.is_connected() {
            return Err(TrackerError::NotConnected { slot: index });
        }

        let left = clamp_vibration(left);
        let right = clamp_vibration(right);
        slot.controls.analog[AnalogChannel::VibrationL] = left;
        slot.controls.analog[AnalogChannel::VibrationR] = right;

        let (left_speed, right_speed) = (motor_speed(left), motor_speed(right));
        trace!("Slot {} motors: left={} right={}", index, left_speed, right_speed);
        self.backend
            .set_motor_speeds(index, left_speed, right_speed)
            .inspect_err(|e| warn!("Failed to set vibration on slot {}: {}", index, e))?;
        Ok(())
    }

    /// Switch between synchronous and fire-and-forget callback dispatch
    pub fn set_async_callbacks(&mut self, enabled: bool) {
        self.dispatch = if enabled {
            DispatchMode::Async
        } else {
            DispatchMode::Sync
        };
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.dispatch
    }

    /// Register a callback fired with the slot index when a device connects
    pub fn on_connected<F>(&mut self, callback: F) -> CallbackHandle
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.connected_callbacks.insert(Arc::new(callback))
    }

    /// Register a callback fired with the slot index when a device disconnects
    pub fn on_disconnected<F>(&mut self, callback: F) -> CallbackHandle
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.disconnected_callbacks.insert(Arc::new(callback))
    }

    /// Register (or overwrite) a connect callback under an existing handle
    pub fn register_connected_at<F>(&mut self, handle: CallbackHandle, callback: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.connected_callbacks.insert_at(handle, Arc::new(callback));
    }

    /// Register (or overwrite) a disconnect callback under an existing handle
    pub fn register_disconnected_at<F>(&mut self, handle: CallbackHandle, callback: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.disconnected_callbacks.insert_at(handle, Arc::new(callback));
    }

    /// Unregister a connect callback; unknown handles are ignored
    pub fn remove_connected(&mut self, handle: CallbackHandle) -> bool {
        self.connected_callbacks.remove(handle)
    }

    /// Unregister a disconnect callback; unknown handles are ignored
    pub fn remove_disconnected(&mut self, handle: CallbackHandle) -> bool {
        self.disconnected_callbacks.remove(handle)
    }

    /// Append a text dump of the slot's current state to `out`
    pub fn dump_to<W: fmt::Write>(&self, index: usize, filter: StreamType, out: &mut W) -> fmt::Result {
        match self.slot(index) {
            Some(slot) => write_controls(out, &slot.controls, filter),
            None => Ok(()),
        }
    }

    pub fn dump(&self, index: usize, filter: StreamType) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.dump_to(index, filter, &mut out);
        out
    }
}

impl<B: GamepadBackend> fmt::Debug for GamepadTracker<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GamepadTracker")
            .field("backend", &self.backend.name())
            .field("connected", &self.connected)
            .field("dispatch", &self.dispatch)
            .field("connected_callbacks", &self.connected_callbacks)
            .field("disconnected_callbacks", &self.disconnected_callbacks)
            .finish()
    }
}
