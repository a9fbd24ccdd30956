//! Driver for the TCA9554 (and PCA9554) 8-bit I/O expander.

use embedded_hal::blocking::i2c::{Read, Write};

use crate::expander::{Error, IoExpander, PinStates, Result, BASE_ADDRESS};
use crate::key_switch::SwitchId;

const INPUT_PORT: u8 = 0x00;
const CONFIG_PORT: u8 = 0x03;

/// A TCA9554 input bank: 8 pins behind one I2C address.
pub struct Tca9554 {
    address: u8,
    switches: [Option<SwitchId>; 8],
    configured: bool,
    invert: bool,
}

impl Tca9554 {
    /// Creates a driver for the device whose A0..A2 pins encode
    /// `address_offset` (only the low three bits are used).
    pub fn new(address_offset: u8) -> Self {
        Tca9554 {
            address: BASE_ADDRESS | (address_offset & 0x07),
            switches: [None; 8],
            configured: false,
            invert: false,
        }
    }

    /// Inverts the read levels, for switches wired to ground through
    /// pull-up resistors.
    pub fn with_inverted_inputs(mut self) -> Self {
        self.invert = true;
        self
    }

    /// The full 7-bit device address.
    pub fn address(&self) -> u8 {
        self.address
    }
}

impl<I2C> IoExpander<I2C> for Tca9554
where
    I2C: Write + Read,
{
    fn init_device(&mut self, i2c: &mut I2C) -> Result<()> {
        // all pins as inputs
        i2c.write(self.address, &[CONFIG_PORT, 0xFF])
            .map_err(|_| Error::I2c)?;
        self.configured = true;
        Ok(())
    }

    fn read_device(&mut self, i2c: &mut I2C) -> Result<PinStates> {
        if !self.configured {
            self.init_device(i2c)?;
        }
        i2c.write(self.address, &[INPUT_PORT])
            .map_err(|_| Error::I2c)?;
        let mut buffer = [0u8; 1];
        i2c.read(self.address, &mut buffer).map_err(|_| Error::I2c)?;
        let bits = if self.invert { !buffer[0] } else { buffer[0] };
        Ok(PinStates::new(u16::from(bits), 8))
    }

    fn assign(&mut self, pin: usize, switch: SwitchId) {
        if let Some(slot) = self.switches.get_mut(pin) {
            *slot = Some(switch);
        }
    }

    fn switch(&self, pin: usize) -> Option<SwitchId> {
        self.switches.get(pin).copied().flatten()
    }

    fn pin_count(&self) -> usize {
        self.switches.len()
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use super::*;
    use crate::expander::test_bus::FakeBus;
    use std::vec;

    #[test]
    fn address_offset() {
        assert_eq!(0x20, Tca9554::new(0).address());
        assert_eq!(0x23, Tca9554::new(3).address());
        // only the low three bits count
        assert_eq!(0x27, Tca9554::new(0xFF).address());
    }

    #[test]
    fn init_writes_config_register() {
        let mut bus = FakeBus::new(&[0x00]);
        let mut dev = Tca9554::new(1);
        dev.init_device(&mut bus).unwrap();
        assert_eq!(&[(0x21, vec![0x03, 0xFF])], &bus.writes()[..]);
    }

    #[test]
    fn read_points_then_reads_one_byte() {
        let mut bus = FakeBus::new(&[0b0000_0110]);
        let mut dev = Tca9554::new(0);
        dev.init_device(&mut bus).unwrap();
        let pins = dev.read_device(&mut bus).unwrap();
        assert_eq!(&(0x20, vec![0x00]), bus.writes().last().unwrap());
        assert_eq!(8, pins.len());
        assert!(!pins.get(0));
        assert!(pins.get(1));
        assert!(pins.get(2));
        assert!(!pins.get(3));
    }

    #[test]
    fn first_read_retries_init() {
        let mut bus = FakeBus::new(&[0x01]);
        let mut dev = Tca9554::new(0);
        // no explicit init: the first read configures the device
        let pins = dev.read_device(&mut bus).unwrap();
        assert!(pins.get(0));
        assert_eq!(
            &[(0x20, vec![0x03, 0xFF]), (0x20, vec![0x00])],
            &bus.writes()[..]
        );
        // init is not repeated on later reads
        dev.read_device(&mut bus).unwrap();
        assert_eq!(3, bus.writes().len());
    }

    #[test]
    fn bus_fault_surfaces_and_recovers() {
        let mut bus = FakeBus::new(&[0x01]);
        let mut dev = Tca9554::new(0);
        dev.init_device(&mut bus).unwrap();
        bus.fail_next();
        assert_eq!(Err(Error::I2c), dev.read_device(&mut bus));
        assert!(dev.read_device(&mut bus).is_ok());
    }

    #[test]
    fn failed_init_is_retried_on_next_read() {
        let mut bus = FakeBus::new(&[0x00]);
        let mut dev = Tca9554::new(0);
        bus.fail_next();
        assert_eq!(Err(Error::I2c), dev.init_device(&mut bus));
        // the next read configures the device before reading
        dev.read_device(&mut bus).unwrap();
        assert_eq!(
            &[(0x20, vec![0x03, 0xFF]), (0x20, vec![0x00])],
            &bus.writes()[..]
        );
    }

    #[test]
    fn inverted_inputs() {
        let mut bus = FakeBus::new(&[0b1111_1110]);
        let mut dev = Tca9554::new(0).with_inverted_inputs();
        let pins = dev.read_device(&mut bus).unwrap();
        assert!(pins.get(0));
        assert!(!pins.get(1));
    }

    #[test]
    fn pin_assignment() {
        let mut dev = Tca9554::new(0);
        let dev: &mut dyn IoExpander<FakeBus> = &mut dev;
        dev.assign(3, SwitchId(7));
        assert_eq!(Some(SwitchId(7)), dev.switch(3));
        assert_eq!(None, dev.switch(0));
        // out of range is ignored
        dev.assign(99, SwitchId(1));
        assert_eq!(None, dev.switch(99));
        assert_eq!(8, dev.pin_count());
    }
}
