//! Gamepad slot state and device-to-slot assignment
//!
//! Each slot represents a fixed controller port with:
//! - Slot index (0-3), never reassigned at runtime
//! - Connection id for this tick and the previous one
//! - Current and previous control snapshots (one frame of history)
//! - Product name captured on connect

use std::fmt::Debug;
use tracing::{debug, trace, warn};

use super::types::{Controls, DeadZone, DISCONNECTED, MAX_DEVICES, MAX_PRODUCT_NAME};

/// State of one controller port
#[derive(Debug, Clone)]
pub struct GamepadSlot {
    /// Slot index (0-based)
    pub slot_index: usize,

    /// Connection id this tick (`Some(slot_index)` when connected)
    pub id: Option<usize>,

    /// Connection id as of the previous tick
    pub prev_id: Option<usize>,

    /// Control state this tick
    pub controls: Controls,

    /// Control state as of the previous tick
    pub prev_controls: Controls,

    /// Product name of the connected device (empty when disconnected)
    pub product_name: String,

    /// Packet number of the last sample applied (0 when disconnected)
    pub packet_number: u32,
}

impl GamepadSlot {
    /// Create a disconnected slot with zeroed controls
    pub fn new(slot_index: usize, deadzone: DeadZone) -> Self {
        let controls = Controls {
            deadzone,
            ..Controls::default()
        };
        Self {
            slot_index,
            id: None,
            prev_id: None,
            controls,
            prev_controls: controls,
            product_name: String::new(),
            packet_number: 0,
        }
    }

    /// Shift the current snapshot into history
    pub fn advance(&mut self) {
        self.prev_controls = self.controls;
        self.prev_id = self.id;
    }

    /// Mark connected and capture the product name
    pub fn connect(&mut self, name: &str) {
        self.id = Some(self.slot_index);
        self.product_name = bounded_name(name);
    }

    /// Reset to the disconnected default state
    pub fn disconnect(&mut self, deadzone: DeadZone) {
        self.controls.reset(deadzone);
        self.product_name.clear();
        self.packet_number = 0;
        self.id = None;
    }

    /// Check if a gamepad is currently connected
    pub fn is_connected(&self) -> bool {
        self.id.is_some()
    }

    /// Numeric connection id (`DISCONNECTED` when no device)
    pub fn connection_id(&self) -> i16 {
        self.id.map_or(DISCONNECTED, |id| id as i16)
    }

    pub fn is_just_connected(&self) -> bool {
        self.id.is_some() && self.prev_id.is_none()
    }

    pub fn is_just_disconnected(&self) -> bool {
        self.id.is_none() && self.prev_id.is_some()
    }
}

/// Truncate a product name to `MAX_PRODUCT_NAME` bytes on a char boundary
pub fn bounded_name(name: &str) -> String {
    if name.len() <= MAX_PRODUCT_NAME {
        return name.to_string();
    }
    let mut end = MAX_PRODUCT_NAME;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

/// Maps backend device ids onto the fixed slot table
///
/// Used by backends whose devices have no natural port index. A device keeps
/// its slot until it is released.
#[derive(Debug, Clone)]
pub struct SlotAssignments<K> {
    slots: [Option<K>; MAX_DEVICES],
}

impl<K> Default for SlotAssignments<K> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl<K: Copy + Eq + Debug> SlotAssignments<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot currently held by `id`
    pub fn slot_of(&self, id: K) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(id))
    }

    /// Device currently assigned to `slot`
    pub fn device_in(&self, slot: usize) -> Option<K> {
        self.slots.get(slot).copied().flatten()
    }

    /// Assign `id` to the first free slot
    ///
    /// # Returns
    /// `Some(slot_index)` if assigned (or already assigned), `None` if all slots are taken
    pub fn try_assign(&mut self, id: K) -> Option<usize> {
        if let Some(idx) = self.slot_of(id) {
            trace!("Device {:?} already assigned to slot {}", id, idx);
            return Some(idx);
        }

        match self.slots.iter().position(Option::is_none) {
            Some(idx) => {
                self.slots[idx] = Some(id);
                debug!("Device {:?} assigned to slot {}", id, idx);
                Some(idx)
            },
            None => {
                warn!("Device {:?} connected but all {} slots are occupied", id, MAX_DEVICES);
                None
            },
        }
    }

    /// Release the slot held by `id`
    pub fn release(&mut self, id: K) -> Option<usize> {
        let idx = self.slot_of(id)?;
        self.slots[idx] = None;
        debug!("Device {:?} released slot {}", id, idx);
        Some(idx)
    }

    /// Number of assigned slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
