//! Connect/disconnect callback registry and dispatch
//!
//! Callbacks receive only the slot index. Any user context lives in the
//! closure's captures, and async callbacks must not assume tracker state is
//! still as it was when the event fired.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// Callback type for connection events
pub type ConnectionCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// Opaque registration handle returned when a callback is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackHandle(u64);

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

impl CallbackHandle {
    /// Allocate a fresh handle, unique within the process
    pub fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Which connection edge a callback listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionEvent::Connected => write!(f, "connected"),
            ConnectionEvent::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// How registered callbacks are invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Invoke inline; `tick()` returns after every callback has returned
    #[default]
    Sync,
    /// Fire-and-forget: each callback runs as its own detached task
    Async,
}

/// One mapping of handle → callback
#[derive(Default)]
pub struct CallbackMap {
    callbacks: HashMap<CallbackHandle, ConnectionCallback>,
}

impl CallbackMap {
    /// Register under a fresh handle
    pub fn insert(&mut self, callback: ConnectionCallback) -> CallbackHandle {
        let handle = CallbackHandle::next();
        self.callbacks.insert(handle, callback);
        handle
    }

    /// Register under an existing handle, replacing any previous entry
    pub fn insert_at(&mut self, handle: CallbackHandle, callback: ConnectionCallback) {
        if self.callbacks.insert(handle, callback).is_some() {
            trace!("Callback {:?} replaced", handle);
        }
    }

    /// Remove a registration; unknown handles are a no-op
    pub fn remove(&mut self, handle: CallbackHandle) -> bool {
        self.callbacks.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Invoke every callback with `slot` (iteration order is unspecified)
    pub fn dispatch(&self, event: ConnectionEvent, slot: usize, mode: DispatchMode) {
        for (handle, callback) in &self.callbacks {
            match mode {
                DispatchMode::Sync => invoke_contained(*handle, event, callback, slot),
                DispatchMode::Async => spawn_detached(*handle, event, Arc::clone(callback), slot),
            }
        }
    }
}

impl std::fmt::Debug for CallbackMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackMap")
            .field("handles", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Run a callback inline, containing any panic
fn invoke_contained(handle: CallbackHandle, event: ConnectionEvent, callback: &ConnectionCallback, slot: usize) {
    if catch_unwind(AssertUnwindSafe(|| callback(slot))).is_err() {
        warn!("{} callback {:?} panicked for slot {}", event, handle, slot);
    }
}

/// Hand a callback to its own execution context without joining it
///
/// Uses the current tokio runtime's blocking pool when there is one,
/// otherwise a plain OS thread.
fn spawn_detached(handle: CallbackHandle, event: ConnectionEvent, callback: ConnectionCallback, slot: usize) {
    let run = move || invoke_contained(handle, event, &callback, slot);

    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn_blocking(run);
        },
        Err(_) => {
            let spawned = std::thread::Builder::new()
                .name(format!("gamepad-{}-cb", event))
                .spawn(run);
            if let Err(e) = spawned {
                warn!("Failed to spawn {} callback {:?}: {}", event, handle, e);
            }
        },
    }
}
