//! The layered action processor: layer stacking and hold/tap keys.

use heapless::Vec;

use crate::action::{Action, SimpleAction};
use crate::key_code::KeyCode;
use crate::key_event::KeyEvent;
use crate::key_switch::{KeySwitch, SwitchId};
use crate::processor::{HidSink, Processor};

/// Upper bound on simultaneously pressed switches the processor tracks.
pub const MAX_WAITING: usize = 16;

/// Bookkeeping for one currently pressed switch.
///
/// Created on press, removed on the matching release; holds everything
/// needed to undo the press without consulting the keymap again, so a
/// layer change between press and release cannot desynchronize the
/// release.
#[derive(Debug, Clone, Copy)]
struct WaitingState {
    switch: SwitchId,
    action: Action,
    pressed_at_ns: u64,
    hold_activated: bool,
    activated_layer: Option<usize>,
    modifier_key: Option<KeyCode>,
}

/// A processor resolving events against a stack of layers, with
/// deferred hold/tap decisions.
///
/// The effective layer at any instant is the numerically smallest
/// active `Layer` binding, or 0 when none is active. Hold/tap keys
/// produce no HID output until either the timeout expires (hold) or the
/// release arrives first (tap).
pub struct LayeredProcessor<S> {
    sink: S,
    waiting: Vec<WaitingState, MAX_WAITING>,
    current_layer: usize,
    active_modifiers: u8,
}

impl<S: HidSink> LayeredProcessor<S> {
    /// Creates a processor driving the given sink.
    pub fn new(sink: S) -> Self {
        LayeredProcessor {
            sink,
            waiting: Vec::new(),
            current_layer: 0,
            active_modifiers: 0,
        }
    }

    /// The sink, for the caller's transport loop.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The effective layer right now.
    pub fn current_layer(&self) -> usize {
        self.current_layer
    }

    /// Modifier bitfield currently reported to the host.
    pub fn active_modifiers(&self) -> u8 {
        self.active_modifiers
    }

    /// Number of switches currently held.
    pub fn pending(&self) -> usize {
        self.waiting.len()
    }

    fn refresh_layer(&mut self) {
        self.current_layer = self
            .waiting
            .iter()
            .filter_map(|w| w.activated_layer)
            .min()
            .unwrap_or(0);
    }

    fn press_code(&mut self, kc: KeyCode) {
        self.sink.press(kc);
        self.active_modifiers |= kc.as_modifier_bit();
    }

    fn release_code(&mut self, kc: KeyCode) {
        self.sink.release(kc);
        self.active_modifiers &= !kc.as_modifier_bit();
    }

    /// Resolves the action for a switch, walking `Trans` slots downward
    /// from `layer` to layer 0. `NoOp` if nothing concrete is found.
    fn find_action(switches: &[KeySwitch], id: SwitchId, layer: usize) -> Action {
        let switch = match switches.get(id.index()) {
            Some(s) => s,
            None => return Action::NoOp,
        };
        let mut layer = layer;
        loop {
            match switch.action(layer) {
                Action::Trans if layer > 0 => layer -= 1,
                Action::Trans => return Action::NoOp,
                action => return action,
            }
        }
    }

    fn on_pressed(&mut self, id: SwitchId, now_ns: u64, switches: &[KeySwitch]) {
        let action = Self::find_action(switches, id, self.current_layer);
        let mut state = WaitingState {
            switch: id,
            action,
            pressed_at_ns: now_ns,
            hold_activated: false,
            activated_layer: None,
            modifier_key: None,
        };
        match action {
            Action::NoOp | Action::Trans => return,
            Action::KeyCode(kc) => self.press_code(kc),
            Action::MultipleKeyCodes(kcs) => {
                for &kc in kcs {
                    self.press_code(kc);
                }
            }
            Action::Layer(layer) => state.activated_layer = Some(layer),
            // no output until the hold/tap decision
            Action::HoldTap { .. } => {}
        }
        let _ = self.waiting.push(state);
        self.refresh_layer();
    }

    fn on_released(&mut self, id: SwitchId, now_ns: u64) {
        // A release without a matching entry belongs to a press that
        // was never seen (dropped from the queue, or resolved to NoOp).
        let index = match self.waiting.iter().position(|w| w.switch == id) {
            Some(i) => i,
            None => return,
        };
        let state = self.waiting.swap_remove(index);
        match state.action {
            Action::NoOp | Action::Trans => {}
            Action::KeyCode(kc) => self.release_code(kc),
            Action::MultipleKeyCodes(kcs) => {
                for &kc in kcs.iter().rev() {
                    self.release_code(kc);
                }
            }
            Action::Layer(_) => {}
            Action::HoldTap {
                hold,
                tap,
                timeout_ns,
            } => {
                if state.hold_activated {
                    if let Some(kc) = state.modifier_key {
                        self.release_code(kc);
                    } else {
                        self.undo_simple(hold);
                    }
                } else if now_ns.saturating_sub(state.pressed_at_ns) >= timeout_ns {
                    // held past the deadline but no tick saw it fire
                    self.tap_simple(hold);
                } else {
                    self.tap_simple(tap);
                }
            }
        }
        self.refresh_layer();
    }

    /// Commits the hold branch of every expired, still undecided
    /// hold/tap entry. Called from `tick`, and before each event so a
    /// deadline inside a drained batch is honored ahead of the events
    /// that follow it.
    fn fire_expired(&mut self, now_ns: u64) {
        let mut layers_changed = false;
        for index in 0..self.waiting.len() {
            let state = self.waiting[index];
            if state.hold_activated {
                continue;
            }
            if let Action::HoldTap {
                hold, timeout_ns, ..
            } = state.action
            {
                if now_ns > state.pressed_at_ns.saturating_add(timeout_ns) {
                    let mut activated_layer = None;
                    let mut modifier_key = None;
                    match hold {
                        SimpleAction::NoOp => {}
                        SimpleAction::Layer(layer) => {
                            activated_layer = Some(layer);
                            layers_changed = true;
                        }
                        SimpleAction::KeyCode(kc) => {
                            self.press_code(kc);
                            if kc.is_modifier() {
                                modifier_key = Some(kc);
                            }
                        }
                        SimpleAction::MultipleKeyCodes(kcs) => {
                            for &kc in kcs {
                                self.press_code(kc);
                            }
                        }
                    }
                    let state = &mut self.waiting[index];
                    state.hold_activated = true;
                    state.activated_layer = activated_layer;
                    state.modifier_key = modifier_key;
                }
            }
        }
        if layers_changed {
            self.refresh_layer();
        }
    }

    /// Releases whatever a committed hold branch pressed. Layer
    /// activations are undone by the entry's removal.
    fn undo_simple(&mut self, action: SimpleAction) {
        match action {
            SimpleAction::NoOp | SimpleAction::Layer(_) => {}
            SimpleAction::KeyCode(kc) => self.release_code(kc),
            SimpleAction::MultipleKeyCodes(kcs) => {
                for &kc in kcs.iter().rev() {
                    self.release_code(kc);
                }
            }
        }
    }

    /// Synthesizes a complete press-then-release of a branch.
    fn tap_simple(&mut self, action: SimpleAction) {
        match action {
            // a zero-length layer activation has no observable effect
            SimpleAction::NoOp | SimpleAction::Layer(_) => {}
            SimpleAction::KeyCode(kc) => {
                self.press_code(kc);
                self.release_code(kc);
            }
            SimpleAction::MultipleKeyCodes(kcs) => {
                for &kc in kcs {
                    self.press_code(kc);
                }
                for &kc in kcs.iter().rev() {
                    self.release_code(kc);
                }
            }
        }
    }
}

impl<S: HidSink> Processor for LayeredProcessor<S> {
    fn put(&mut self, event: KeyEvent, now_ns: u64, switches: &[KeySwitch]) {
        self.fire_expired(now_ns);
        match event {
            KeyEvent::Pressed(id) => self.on_pressed(id, now_ns, switches),
            KeyEvent::Released(id) => self.on_released(id, now_ns),
        }
    }

    fn tick(&mut self, now_ns: u64) {
        self.fire_expired(now_ns);
    }
}
