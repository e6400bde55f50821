// MIT License - Copyright (c) 2026 Peter Wright
// Keypad monitor events

use crate::devices::keypad::KeypadState;
use crate::devices::status::ArmedStatus;

/// Events emitted by the keypad monitor.
///
/// Subscribe via `monitor.subscribe()` to receive a
/// `tokio::sync::broadcast::Receiver<BridgeEvent>`.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// Location and device details were (re)loaded
    DetailsLoaded { locations: Vec<String> },
    /// A keypad's status was read and stored
    KeypadUpdated {
        keypad: String,
        location: String,
        state: KeypadState,
        /// The coarse state type differs from the previous reading
        changed: bool,
        /// False for the silent initial reading at startup
        trigger_events: bool,
    },
    /// The status could not be read; the previous state is kept
    StatusUnavailable { keypad: String, status: ArmedStatus },
}

pub type EventSender = tokio::sync::broadcast::Sender<BridgeEvent>;

pub type EventReceiver = tokio::sync::broadcast::Receiver<BridgeEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
