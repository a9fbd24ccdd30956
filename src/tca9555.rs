//! Driver for the TCA9555 (and PCA9555) 16-bit I/O expander.

use embedded_hal::blocking::i2c::{Read, Write};

use crate::expander::{Error, IoExpander, PinStates, Result, BASE_ADDRESS};
use crate::key_switch::SwitchId;

const INPUT_PORT_0: u8 = 0x00;
const CONFIG_PORT_0: u8 = 0x06;
const CONFIG_PORT_1: u8 = 0x07;

/// A TCA9555 input bank: two 8-pin ports behind one I2C address.
///
/// Port 0 maps to pins 0..8, port 1 to pins 8..16.
pub struct Tca9555 {
    address: u8,
    switches: [Option<SwitchId>; 16],
    configured: bool,
    invert: bool,
}

impl Tca9555 {
    /// Creates a driver for the device whose A0..A2 pins encode
    /// `address_offset` (only the low three bits are used).
    pub fn new(address_offset: u8) -> Self {
        Tca9555 {
            address: BASE_ADDRESS | (address_offset & 0x07),
            switches: [None; 16],
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

impl<I2C> IoExpander<I2C> for Tca9555
where
    I2C: Write + Read,
{
    fn init_device(&mut self, i2c: &mut I2C) -> Result<()> {
        // both ports as inputs
        i2c.write(self.address, &[CONFIG_PORT_0, 0xFF])
            .map_err(|_| Error::I2c)?;
        i2c.write(self.address, &[CONFIG_PORT_1, 0xFF])
            .map_err(|_| Error::I2c)?;
        self.configured = true;
        Ok(())
    }

    fn read_device(&mut self, i2c: &mut I2C) -> Result<PinStates> {
        if !self.configured {
            self.init_device(i2c)?;
        }
        // the port 0 read auto-increments into port 1
        i2c.write(self.address, &[INPUT_PORT_0])
            .map_err(|_| Error::I2c)?;
        let mut buffer = [0u8; 2];
        i2c.read(self.address, &mut buffer).map_err(|_| Error::I2c)?;
        let bits = u16::from_le_bytes(buffer);
        let bits = if self.invert { !bits } else { bits };
        Ok(PinStates::new(bits, 16))
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
    fn init_configures_both_ports() {
        let mut bus = FakeBus::new(&[0x00, 0x00]);
        let mut dev = Tca9555::new(2);
        dev.init_device(&mut bus).unwrap();
        assert_eq!(
            &[(0x22, vec![0x06, 0xFF]), (0x22, vec![0x07, 0xFF])],
            &bus.writes()[..]
        );
    }

    #[test]
    fn read_returns_both_banks() {
        let mut bus = FakeBus::new(&[0b0000_0001, 0b1000_0000]);
        let mut dev = Tca9555::new(0);
        dev.init_device(&mut bus).unwrap();
        let pins = dev.read_device(&mut bus).unwrap();
        assert_eq!(&(0x20, vec![0x00]), bus.writes().last().unwrap());
        assert_eq!(16, pins.len());
        assert!(pins.get(0));
        assert!(!pins.get(1));
        // bank 1 bit 7 lands on pin 15
        assert!(pins.get(15));
        assert!(!pins.get(8));
    }

    #[test]
    fn inverted_inputs_cover_both_banks() {
        let mut bus = FakeBus::new(&[0xFF, 0xFE]);
        let mut dev = Tca9555::new(0).with_inverted_inputs();
        let pins = dev.read_device(&mut bus).unwrap();
        assert!(!pins.get(0));
        assert!(!pins.get(7));
        assert!(pins.get(8));
        assert!(!pins.get(15));
    }

    #[test]
    fn failed_init_is_retried_on_next_read() {
        let mut bus = FakeBus::new(&[0x00, 0x00]);
        let mut dev = Tca9555::new(0);
        bus.fail_next();
        assert_eq!(Err(Error::I2c), dev.init_device(&mut bus));
        // the next read re-runs the whole configuration first
        dev.read_device(&mut bus).unwrap();
        assert_eq!(
            &[
                (0x20, vec![0x06, 0xFF]),
                (0x20, vec![0x07, 0xFF]),
                (0x20, vec![0x00])
            ],
            &bus.writes()[..]
        );
    }

    #[test]
    fn sixteen_pin_assignment() {
        let mut dev = Tca9555::new(0);
        let dev: &mut dyn IoExpander<FakeBus> = &mut dev;
        dev.assign(15, SwitchId(3));
        assert_eq!(Some(SwitchId(3)), dev.switch(15));
        assert_eq!(16, dev.pin_count());
    }
}
