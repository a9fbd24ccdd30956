//! The event processor contract and the modeless baseline.

use crate::key_code::KeyCode;
use crate::key_event::KeyEvent;
use crate::key_switch::KeySwitch;

/// The keyboard driver the processor talks to.
///
/// The implementation is expected to maintain the current HID report
/// across calls and get it to the host on its own schedule; there is no
/// separate "send report" primitive. A sink that currently cannot reach
/// the host must swallow the call while keeping its report consistent,
/// so a later reconnect does not replay stale keys.
pub trait HidSink {
    /// Adds a key code to the report.
    fn press(&mut self, kc: KeyCode);
    /// Removes a key code from the report.
    fn release(&mut self, kc: KeyCode);
}

/// Turns debounced key events into HID traffic.
///
/// `put` consumes one event with the timestamp of the scan that
/// observed it; `tick` advances time-driven state and must keep firing
/// while the queue is idle so hold timeouts do not depend on new input.
/// Neither reads a clock: time is injected by the caller.
pub trait Processor {
    /// Processes one debounced event.
    fn put(&mut self, event: KeyEvent, now_ns: u64, switches: &[KeySwitch]);
    /// Advances timers without new input.
    fn tick(&mut self, now_ns: u64);
}

/// The trivial processor: layer 0 actions mapped 1:1 onto the sink.
///
/// No layers, no hold/tap. Useful as a correctness baseline for the
/// scan pipeline, and sufficient for keyboards that don't use either.
pub struct ModelessProcessor<S> {
    sink: S,
}

impl<S: HidSink> ModelessProcessor<S> {
    /// Creates a processor driving the given sink.
    pub fn new(sink: S) -> Self {
        ModelessProcessor { sink }
    }

    /// The sink, for the caller's transport loop.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: HidSink> Processor for ModelessProcessor<S> {
    fn put(&mut self, event: KeyEvent, _now_ns: u64, switches: &[KeySwitch]) {
        let switch = match switches.get(event.switch().index()) {
            Some(s) => s,
            None => return,
        };
        let action = switch.action(0);
        match event {
            KeyEvent::Pressed(_) => {
                for kc in action.key_codes() {
                    self.sink.press(kc);
                }
            }
            KeyEvent::Released(_) => {
                for kc in action.key_codes() {
                    self.sink.release(kc);
                }
            }
        }
    }

    fn tick(&mut self, _now_ns: u64) {}
}

#[cfg(test)]
pub(crate) mod test_sink {
    extern crate std;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    use super::HidSink;
    use crate::key_code::KeyCode;

    /// A sink recording every call, shareable with the test body.
    #[derive(Clone, Default)]
    pub struct SpySink {
        calls: Rc<RefCell<Vec<(bool, KeyCode)>>>,
    }

    impl SpySink {
        pub fn new() -> Self {
            SpySink::default()
        }

        /// Every call so far as `(is_press, code)` pairs.
        pub fn calls(&self) -> Vec<(bool, KeyCode)> {
            self.calls.borrow().clone()
        }

        /// Drops the recorded history.
        pub fn clear(&self) {
            self.calls.borrow_mut().clear();
        }
    }

    impl HidSink for SpySink {
        fn press(&mut self, kc: KeyCode) {
            self.calls.borrow_mut().push((true, kc));
        }

        fn release(&mut self, kc: KeyCode) {
            self.calls.borrow_mut().push((false, kc));
        }
    }
}
