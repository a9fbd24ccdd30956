//! Events emitted by the scan pipeline.

use crate::key_switch::{SwitchId, Transition};

/// A debounced key event, produced at the moment a debouncer commits a
/// transition. Stable or still-bouncing input never produces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// The switch was pressed.
    Pressed(SwitchId),
    /// The switch was released.
    Released(SwitchId),
}

impl KeyEvent {
    /// Builds the event for a committed transition of the given switch.
    pub fn from_transition(transition: Transition, switch: SwitchId) -> Self {
        match transition {
            Transition::Pressed => KeyEvent::Pressed(switch),
            Transition::Released => KeyEvent::Released(switch),
        }
    }

    /// The switch the event belongs to.
    pub fn switch(self) -> SwitchId {
        match self {
            KeyEvent::Pressed(id) | KeyEvent::Released(id) => id,
        }
    }

    /// Returns `true` if the event is a key press.
    pub fn is_press(self) -> bool {
        match self {
            KeyEvent::Pressed(..) => true,
            KeyEvent::Released(..) => false,
        }
    }

    /// Returns `true` if the event is a key release.
    pub fn is_release(self) -> bool {
        !self.is_press()
    }
}

/// An event waiting in the queue, stamped with the monotonic time of
/// the scan that observed the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedEvent {
    /// The debounced event.
    pub event: KeyEvent,
    /// Monotonic timestamp of the scan, in nanoseconds.
    pub timestamp_ns: u64,
}
