//! The polled input bank the scanner reads switches through.

use crate::key_switch::SwitchId;

/// Fixed upper part of the TCA9554/TCA9555 slave address; the wired
/// A0..A2 pins select the low three bits.
pub const BASE_ADDRESS: u8 = 0x20;

/// The error type for expander bus traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A generic embedded-hal I2C error.
    I2c,
}

/// The result type for expander bus traffic.
pub type Result<T> = core::result::Result<T, Error>;

/// The pin levels read from one device, bit 0 being pin 0.
///
/// A set bit means *on* (pressed). Drivers for switches wired to ground
/// through pull-ups invert before building this, so consumers never see
/// electrical polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinStates {
    bits: u16,
    len: u8,
}

impl PinStates {
    /// Wraps a raw bit vector of `len` pins.
    pub fn new(bits: u16, len: u8) -> Self {
        PinStates { bits, len }
    }

    /// The level of one pin; out-of-range pins read as off.
    pub fn get(&self, pin: usize) -> bool {
        pin < self.len as usize && self.bits & (1 << pin) != 0
    }

    /// Number of pins in the vector.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` for an empty vector.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates the pin levels, pin 0 first.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len as usize).map(move |pin| self.get(pin))
    }
}

/// A polled input bank bound to a set of switches.
///
/// The bus itself is owned by the scanner and passed in per call, so a
/// single master serializes all device traffic. Implementations must
/// return a `PinStates` of constant length, report *on* as `true`, and
/// answer bus trouble with `Err` rather than stale data; a failing
/// device is skipped for the current scan and retried on the next one.
pub trait IoExpander<I2C> {
    /// Configures the device for input. Safe to call again after a
    /// failure; a device whose init never succeeded re-attempts it on
    /// first use.
    fn init_device(&mut self, i2c: &mut I2C) -> Result<()>;

    /// Reads the current pin levels.
    fn read_device(&mut self, i2c: &mut I2C) -> Result<PinStates>;

    /// Binds a switch to a pin. Out-of-range pins are ignored.
    fn assign(&mut self, pin: usize, switch: SwitchId);

    /// The switch bound to a pin, if any.
    fn switch(&self, pin: usize) -> Option<SwitchId>;

    /// Number of pins on the device.
    fn pin_count(&self) -> usize;
}

#[cfg(test)]
pub(crate) mod test_bus {
    extern crate std;
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;
    use std::rc::Rc;
    use std::vec::Vec;

    use embedded_hal::blocking::i2c::{Read, Write};

    /// Error type of the scripted bus.
    #[derive(Debug)]
    pub struct BusError;

    /// A scripted I2C bus double.
    ///
    /// State is behind `Rc` so a test can keep a clone while the
    /// scanner owns the bus, flipping pin levels and injecting faults
    /// mid-run.
    #[derive(Clone)]
    pub struct FakeBus {
        default_pins: Rc<Cell<u16>>,
        device_pins: Rc<RefCell<BTreeMap<u8, u16>>>,
        failing: Rc<RefCell<BTreeMap<u8, u32>>>,
        fail_all: Rc<Cell<u32>>,
        writes: Rc<RefCell<Vec<(u8, Vec<u8>)>>>,
    }

    impl FakeBus {
        /// Creates a bus whose reads return `initial` (little endian)
        /// for every address until overridden.
        pub fn new(initial: &[u8]) -> Self {
            let mut bits = 0u16;
            for (i, &b) in initial.iter().take(2).enumerate() {
                bits |= u16::from(b) << (8 * i);
            }
            FakeBus {
                default_pins: Rc::new(Cell::new(bits)),
                device_pins: Rc::new(RefCell::new(BTreeMap::new())),
                failing: Rc::new(RefCell::new(BTreeMap::new())),
                fail_all: Rc::new(Cell::new(0)),
                writes: Rc::new(RefCell::new(Vec::new())),
            }
        }

        /// Sets the pin levels returned for every address.
        pub fn set_pins(&self, bits: u16) {
            self.default_pins.set(bits);
        }

        /// Sets the pin levels returned for one address.
        pub fn set_device_pins(&self, address: u8, bits: u16) {
            self.device_pins.borrow_mut().insert(address, bits);
        }

        /// Fails the next bus operation, whatever the address.
        pub fn fail_next(&self) {
            self.fail_all.set(self.fail_all.get() + 1);
        }

        /// Fails the next `ops` operations addressed to `address`.
        pub fn fail_device(&self, address: u8, ops: u32) {
            self.failing.borrow_mut().insert(address, ops);
        }

        /// Every write so far, as `(address, bytes)` pairs.
        pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
            self.writes.borrow().clone()
        }

        fn check(&self, address: u8) -> core::result::Result<(), BusError> {
            if self.fail_all.get() > 0 {
                self.fail_all.set(self.fail_all.get() - 1);
                return Err(BusError);
            }
            if let Some(n) = self.failing.borrow_mut().get_mut(&address) {
                if *n > 0 {
                    *n -= 1;
                    return Err(BusError);
                }
            }
            Ok(())
        }
    }

    impl Write for FakeBus {
        type Error = BusError;

        fn write(&mut self, address: u8, bytes: &[u8]) -> core::result::Result<(), BusError> {
            self.check(address)?;
            self.writes.borrow_mut().push((address, bytes.to_vec()));
            Ok(())
        }
    }

    impl Read for FakeBus {
        type Error = BusError;

        fn read(&mut self, address: u8, buffer: &mut [u8]) -> core::result::Result<(), BusError> {
            self.check(address)?;
            let bits = match self.device_pins.borrow().get(&address) {
                Some(&bits) => bits,
                None => self.default_pins.get(),
            };
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = (bits >> (8 * i)) as u8;
            }
            Ok(())
        }
    }
}
