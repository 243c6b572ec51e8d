//! Per-slot diagnostics report for troubleshooting detection issues

use tracing::info;

use super::backend::GamepadBackend;
use super::tracker::GamepadTracker;
use super::types::{StreamType, MAX_DEVICES};

/// Log a report of every slot the tracker knows about
///
/// Useful when a controller is plugged in but never shows up in a slot.
pub fn print_gamepad_diagnostics<B: GamepadBackend>(tracker: &GamepadTracker<B>) {
    info!("=== Gamepad Diagnostics ===");
    info!("Platform: {}", std::env::consts::OS);
    info!("Backend: {}", tracker.backend_name());
    info!("Connected: {}/{}", tracker.connected_count(), MAX_DEVICES);
    info!("");

    for slot in 0..MAX_DEVICES {
        if !tracker.is_connected(slot) {
            info!("📋 Slot {}: (empty)", slot);
            continue;
        }

        info!("📋 Slot {}: \"{}\"", slot, tracker.product_name(slot));
        info!("   Deadzone: {:?}", tracker.dead_zone(slot));
        for line in tracker.dump(slot, StreamType::All).lines().filter(|l| !l.is_empty()) {
            info!("   {}", line);
        }
        info!("");
    }

    if tracker.connected_count() == 0 {
        info!("⚠️  No gamepads detected");
        info!("   Please check:");
        info!("   - Gamepad is connected (USB or Bluetooth paired)");
        info!("   - Drivers are installed");
    }
}
