//! A physical key switch: its debouncer and its per-layer actions.

use heapless::Vec;

use crate::action::Action;
use crate::debounce::Debouncer;

/// Number of layer slots a switch can carry.
pub const MAX_LAYERS: usize = 8;

/// Debounce limit used when none is given, in scans.
pub const DEFAULT_DEBOUNCE: u8 = 5;

/// Index of a switch in the switch arena.
///
/// Switch identity is the arena index; two switches never compare equal
/// by their contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchId(pub u16);

impl SwitchId {
    /// The arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A committed debouncer transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The switch closed.
    Pressed,
    /// The switch opened.
    Released,
}

/// One key switch: debouncer state plus an ordered action table with
/// one slot per layer.
#[derive(Debug, Clone)]
pub struct KeySwitch {
    debouncer: Debouncer,
    actions: Vec<Action, MAX_LAYERS>,
    default_action: Action,
}

impl KeySwitch {
    /// Creates a switch with the given action table, slot `i` being the
    /// action on layer `i`. Actions beyond [`MAX_LAYERS`] are ignored.
    pub fn new(actions: &[Action]) -> Self {
        let mut table = Vec::new();
        for &a in actions.iter().take(MAX_LAYERS) {
            let _ = table.push(a);
        }
        KeySwitch {
            debouncer: Debouncer::new(DEFAULT_DEBOUNCE),
            actions: table,
            default_action: Action::Trans,
        }
    }

    /// Overrides the debounce limit for this switch.
    pub fn with_debounce(mut self, limit: u8) -> Self {
        self.debouncer = Debouncer::new(limit);
        self
    }

    /// Overrides the action returned for layers past the end of the
    /// table (`Trans` if not set).
    pub fn with_default_action(mut self, action: Action) -> Self {
        self.default_action = action;
        self
    }

    /// Feeds one raw sample through the debouncer.
    pub fn update(&mut self, pressed: bool) -> Option<Transition> {
        if !self.debouncer.update(pressed) {
            None
        } else if self.debouncer.is_pressed() {
            Some(Transition::Pressed)
        } else {
            Some(Transition::Released)
        }
    }

    /// The action bound on the given layer, falling back to the default
    /// action past the end of the table.
    pub fn action(&self, layer: usize) -> Action {
        match self.actions.get(layer) {
            Some(&a) => a,
            None => self.default_action,
        }
    }

    /// The committed state of the switch.
    pub fn is_pressed(&self) -> bool {
        self.debouncer.is_pressed()
    }

    /// Number of layer slots currently bound.
    pub fn layer_count(&self) -> usize {
        self.actions.len()
    }

    /// Appends an action as the next layer slot. Layout-time only.
    pub fn append_action(&mut self, action: Action) -> Result<(), Action> {
        self.actions.push(action)
    }

    /// Replaces the action in an existing layer slot. Returns `false`
    /// if the slot is not bound. Layout-time only.
    pub fn set_action(&mut self, layer: usize, action: Action) -> bool {
        match self.actions.get_mut(layer) {
            Some(slot) => {
                *slot = action;
                true
            }
            None => false,
        }
    }

    /// Removes every layer slot. Layout-time only.
    pub fn clear_actions(&mut self) {
        self.actions.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::action::{k, la, trans};
    use crate::key_code::KeyCode::*;

    #[test]
    fn action_lookup_falls_back_to_default() {
        let switch = KeySwitch::new(&[k(A), la(1)]).with_default_action(Action::NoOp);
        assert_eq!(k(A), switch.action(0));
        assert_eq!(la(1), switch.action(1));
        assert_eq!(Action::NoOp, switch.action(2));
        assert_eq!(Action::NoOp, switch.action(7));
    }

    #[test]
    fn default_default_is_trans() {
        let switch = KeySwitch::new(&[k(A)]);
        assert_eq!(Action::Trans, switch.action(3));
    }

    #[test]
    fn update_reports_edges_only() {
        let mut switch = KeySwitch::new(&[k(A)]).with_debounce(1);
        assert_eq!(None, switch.update(true));
        assert_eq!(Some(Transition::Pressed), switch.update(true));
        assert_eq!(None, switch.update(true));
        assert_eq!(None, switch.update(false));
        assert_eq!(Some(Transition::Released), switch.update(false));
        assert_eq!(None, switch.update(false));
    }

    #[test]
    fn layout_time_mutation() {
        let mut switch = KeySwitch::new(&[k(A)]);
        assert!(switch.append_action(trans()).is_ok());
        assert_eq!(2, switch.layer_count());
        assert!(switch.set_action(1, k(B)));
        assert_eq!(k(B), switch.action(1));
        assert!(!switch.set_action(5, k(C)));
        switch.clear_actions();
        assert_eq!(0, switch.layer_count());
    }
}
