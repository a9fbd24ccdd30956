//! Firmware core for keyboards built on I²C I/O expanders.
//!
//! A microcontroller periodically samples key switches through one or
//! more TCA9554/TCA9555 expanders, debounces the raw signal, and turns
//! key activity into USB HID keyboard reports. Key bindings form a
//! stack of layers, and individual keys can carry dual-role hold/tap
//! behavior.
//!
//! The pieces, in data-flow order:
//!
//! - [`expander`], [`tca9554`], [`tca9555`]: the polled input banks.
//! - [`debounce`], [`key_switch`]: per-switch bounce suppression and
//!   the per-layer action tables.
//! - [`event_queue`], [`key_event`]: the bounded FIFO decoupling scan
//!   cadence from processing.
//! - [`scanner`]: the cooperative loop tying it together, with an
//!   injectable monotonic clock.
//! - [`processor`], [`layered`]: the event processors; the layered one
//!   is the full layer/hold-tap state machine.
//! - [`key_code`], [`action`], [`hid`]: HID usages, the action algebra
//!   for keymaps, and the USB boot keyboard class.
//!
//! Board bring-up stays on the caller's side: construct the expanders
//! with their wired addresses, assign switches to pins, hand bus,
//! switch arena and a processor to [`scanner::Scanner`], then call
//! `update()` from the main loop, polling the USB device and pushing
//! the report in between.

#![no_std]

pub mod action;
pub mod debounce;
pub mod diag;
pub mod event_queue;
pub mod expander;
pub mod hid;
pub mod key_code;
pub mod key_event;
pub mod key_switch;
pub mod layered;
pub mod processor;
pub mod scanner;
pub mod tca9554;
pub mod tca9555;
