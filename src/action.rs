//! The different actions that can be bound to a key.

use crate::key_code::KeyCode;

const NANOS_PER_MS: u64 = 1_000_000;

/// Hold/tap decision window used by the [`lt`] and [`mt`] shortcuts.
pub const DEFAULT_HOLD_TIMEOUT_MS: u64 = 200;

/// The actions a hold/tap branch can resolve to.
///
/// This is the [`Action`] sum minus `Trans` and `HoldTap` itself, so a
/// nested hold/tap is unrepresentable rather than checked at runtime.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SimpleAction {
    /// Just do nothing.
    NoOp,
    /// A classic key.
    KeyCode(KeyCode),
    /// Several key codes sent as if pressed at the same time.
    MultipleKeyCodes(&'static [KeyCode]),
    /// While held, force the given layer active.
    Layer(usize),
}

/// The different actions that can be done.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Action {
    /// No operation action: just do nothing.
    NoOp,
    /// Transparent, i.e. get the action from the next lower layer.
    /// On layer 0, it is equivalent to `NoOp`.
    Trans,
    /// A key code, i.e. a classic key.
    KeyCode(KeyCode),
    /// Multiple key codes sent at the same time, as if these keys
    /// were pressed at the same time. Useful to send a shifted key,
    /// or complex shortcuts like Ctrl+Alt+Del in a single key press.
    MultipleKeyCodes(&'static [KeyCode]),
    /// While pressed, force the current layer. That's the classic
    /// Fn key. When several layer actions are active at the same
    /// time, the numerically smallest layer wins.
    Layer(usize),
    /// Dispatch to `hold` if the key is held longer than `timeout_ns`
    /// after the press, and to `tap` if it is released before that.
    /// No HID output happens until the decision is made.
    HoldTap {
        /// The action on timeout expiry.
        hold: SimpleAction,
        /// The action on early release.
        tap: SimpleAction,
        /// Decision window in nanoseconds after the press.
        timeout_ns: u64,
    },
}

impl Action {
    /// Gets the layer number if the action is the `Layer` action.
    pub fn layer(self) -> Option<usize> {
        match self {
            Action::Layer(l) => Some(l),
            _ => None,
        }
    }

    /// Returns an iterator on the `KeyCode`s corresponding to the action.
    pub fn key_codes(&self) -> impl Iterator<Item = KeyCode> + '_ {
        match self {
            Action::KeyCode(kc) => core::slice::from_ref(kc).iter().cloned(),
            Action::MultipleKeyCodes(kcs) => kcs.iter().cloned(),
            _ => [].iter().cloned(),
        }
    }
}

/// A shortcut to create a `Action::KeyCode`, useful to create compact
/// keymaps.
pub const fn k(kc: KeyCode) -> Action {
    Action::KeyCode(kc)
}

/// A shortcut to create a `Action::MultipleKeyCodes`, useful to
/// create compact keymaps. Put the modifier first so it reaches the
/// host before the key it modifies.
pub const fn m(kcs: &'static [KeyCode]) -> Action {
    Action::MultipleKeyCodes(kcs)
}

/// A shortcut to create a `Action::Layer`, useful to create compact
/// keymaps.
pub const fn la(layer: usize) -> Action {
    Action::Layer(layer)
}

/// A shortcut to create a `Action::Trans`.
pub const fn trans() -> Action {
    Action::Trans
}

/// Creates a hold/tap action with an explicit decision window in
/// milliseconds. Time inside the crate is nanoseconds; keymap authors
/// think in milliseconds, so the conversion lives here.
pub const fn hold_tap(hold: SimpleAction, tap: SimpleAction, timeout_ms: u64) -> Action {
    Action::HoldTap {
        hold,
        tap,
        timeout_ns: timeout_ms * NANOS_PER_MS,
    }
}

/// Layer on hold, key on tap.
pub const fn lt(layer: usize, kc: KeyCode) -> Action {
    hold_tap(
        SimpleAction::Layer(layer),
        SimpleAction::KeyCode(kc),
        DEFAULT_HOLD_TIMEOUT_MS,
    )
}

/// Modifier on hold, key on tap.
pub const fn mt(modifier: KeyCode, kc: KeyCode) -> Action {
    hold_tap(
        SimpleAction::KeyCode(modifier),
        SimpleAction::KeyCode(kc),
        DEFAULT_HOLD_TIMEOUT_MS,
    )
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;
    use crate::key_code::KeyCode::*;
    use std::vec::Vec;

    #[test]
    fn constructors() {
        assert_eq!(Action::KeyCode(A), k(A));
        assert_eq!(Action::MultipleKeyCodes(&[LShift, A]), m(&[LShift, A]));
        assert_eq!(Action::Layer(2), la(2));
        assert_eq!(Action::Trans, trans());
        assert_eq!(
            Action::HoldTap {
                hold: SimpleAction::Layer(1),
                tap: SimpleAction::KeyCode(Space),
                timeout_ns: 200_000_000,
            },
            lt(1, Space)
        );
        assert_eq!(
            Action::HoldTap {
                hold: SimpleAction::KeyCode(LCtrl),
                tap: SimpleAction::KeyCode(Escape),
                timeout_ns: 200_000_000,
            },
            mt(LCtrl, Escape)
        );
    }

    #[test]
    fn key_codes_iterator() {
        let codes: Vec<_> = k(A).key_codes().collect();
        assert_eq!(&[A], &codes[..]);
        let codes: Vec<_> = m(&[LShift, A]).key_codes().collect();
        assert_eq!(&[LShift, A], &codes[..]);
        assert_eq!(0, la(1).key_codes().count());
        assert_eq!(0, lt(1, Space).key_codes().count());
    }
}
