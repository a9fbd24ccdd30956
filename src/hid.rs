//! USB HID boot keyboard class implementing the processor's sink.

use usb_device::bus::{InterfaceNumber, StringIndex, UsbBus, UsbBusAllocator};
use usb_device::class::{ControlIn, ControlOut, UsbClass};
use usb_device::control;
use usb_device::control::{Recipient, RequestType};
use usb_device::descriptor::DescriptorWriter;
use usb_device::endpoint::{EndpointAddress, EndpointIn};

use crate::key_code::{KbHidReport, KeyCode};
use crate::processor::HidSink;

/// HID interface class code, for the device descriptor.
pub const INTERFACE_CLASS_HID: u8 = 0x03;

const SPECIFICATION_RELEASE: u16 = 0x111;
const SUBCLASS_BOOT_INTERFACE: u8 = 0x01;
const PROTOCOL_KEYBOARD: u8 = 0x01;
const DESCRIPTOR_TYPE_HID: u8 = 0x21;
const DESCRIPTOR_TYPE_REPORT: u8 = 0x22;
const REQUEST_GET_REPORT: u8 = 0x01;
const REQUEST_SET_REPORT: u8 = 0x09;
const REPORT_TYPE_INPUT: u8 = 1;
const REPORT_TYPE_OUTPUT: u8 = 2;

#[rustfmt::skip]
const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01,        // Usage Page (Generic Desktop)
    0x09, 0x06,        // Usage (Keyboard)
    0xA1, 0x01,        // Collection (Application)
    0x05, 0x07,        //   Usage Page (Key Codes)
    0x19, 0xE0,        //   Usage Minimum (224)
    0x29, 0xE7,        //   Usage Maximum (231)
    0x15, 0x00,        //   Logical Minimum (0)
    0x25, 0x01,        //   Logical Maximum (1)
    0x75, 0x01,        //   Report Size (1)
    0x95, 0x08,        //   Report Count (8)
    0x81, 0x02,        //   Input (Data, Variable, Absolute)
    0x95, 0x01,        //   Report Count (1)
    0x75, 0x08,        //   Report Size (8)
    0x81, 0x03,        //   Input (Constant)
    0x95, 0x05,        //   Report Count (5)
    0x75, 0x01,        //   Report Size (1)
    0x05, 0x08,        //   Usage Page (LEDs)
    0x19, 0x01,        //   Usage Minimum (1)
    0x29, 0x05,        //   Usage Maximum (5)
    0x91, 0x02,        //   Output (Data, Variable, Absolute)
    0x95, 0x01,        //   Report Count (1)
    0x75, 0x03,        //   Report Size (3)
    0x91, 0x03,        //   Output (Constant)
    0x95, 0x06,        //   Report Count (6)
    0x75, 0x08,        //   Report Size (8)
    0x15, 0x00,        //   Logical Minimum (0)
    0x26, 0xFB, 0x00,  //   Logical Maximum (251)
    0x05, 0x07,        //   Usage Page (Key Codes)
    0x19, 0x00,        //   Usage Minimum (0)
    0x29, 0xFB,        //   Usage Maximum (251)
    0x81, 0x00,        //   Input (Data, Array)
    0xC0,              // End Collection
];

/// A USB HID boot keyboard.
///
/// The class maintains the current report; the processor mutates it
/// through [`HidSink`], and the caller's poll loop pushes it with
/// [`UsbKeyboard::write_report`]. A host that cannot take the report
/// right now (`WouldBlock`, endpoint not ready) loses that snapshot
/// only — the next push carries the up-to-date state, so nothing
/// phantom survives a reconnect.
pub struct UsbKeyboard<'a, B: UsbBus> {
    report: KbHidReport,
    interface: InterfaceNumber,
    endpoint_interrupt_in: EndpointIn<'a, B>,
    expect_interrupt_in_complete: bool,
}

impl<'a, B: UsbBus> UsbKeyboard<'a, B> {
    /// Creates the keyboard class on the given bus.
    pub fn new(alloc: &'a UsbBusAllocator<B>) -> Self {
        UsbKeyboard {
            report: KbHidReport::default(),
            interface: alloc.interface(),
            endpoint_interrupt_in: alloc.interrupt(8, 10),
            expect_interrupt_in_complete: false,
        }
    }

    /// The report as the processor currently sees it.
    pub fn report(&self) -> &KbHidReport {
        &self.report
    }

    /// Pushes the current report on the interrupt endpoint. Returns
    /// the number of bytes written; a busy or faulted endpoint reads
    /// as zero rather than an error.
    pub fn write_report(&mut self) -> usize {
        if self.expect_interrupt_in_complete {
            return 0;
        }
        match self.endpoint_interrupt_in.write(self.report.as_bytes()) {
            Ok(count) => {
                self.expect_interrupt_in_complete = true;
                count
            }
            // WouldBlock and bus faults alike: skip this snapshot
            Err(_) => 0,
        }
    }

    fn interface_index(&self) -> u16 {
        let interface: u8 = self.interface.into();
        u16::from(interface)
    }
}

impl<B: UsbBus> HidSink for UsbKeyboard<'_, B> {
    fn press(&mut self, kc: KeyCode) {
        self.report.pressed(kc);
    }

    fn release(&mut self, kc: KeyCode) {
        self.report.released(kc);
    }
}

impl<B: UsbBus> UsbClass<B> for UsbKeyboard<'_, B> {
    fn reset(&mut self) {
        self.expect_interrupt_in_complete = false;
    }

    fn get_configuration_descriptors(
        &self,
        writer: &mut DescriptorWriter,
    ) -> usb_device::Result<()> {
        writer.interface(
            self.interface,
            INTERFACE_CLASS_HID,
            SUBCLASS_BOOT_INTERFACE,
            PROTOCOL_KEYBOARD,
        )?;
        let descriptor_len = (REPORT_DESCRIPTOR.len() as u16).to_le_bytes();
        let specification_release = SPECIFICATION_RELEASE.to_le_bytes();
        writer.write(
            DESCRIPTOR_TYPE_HID,
            &[
                specification_release[0],
                specification_release[1],
                0, // country code: not supported
                1, // one descriptor follows
                DESCRIPTOR_TYPE_REPORT,
                descriptor_len[0],
                descriptor_len[1],
            ],
        )?;
        writer.endpoint(&self.endpoint_interrupt_in)?;
        Ok(())
    }

    fn get_string(&self, _index: StringIndex, _lang_id: u16) -> Option<&str> {
        None
    }

    fn endpoint_in_complete(&mut self, addr: EndpointAddress) {
        if addr == self.endpoint_interrupt_in.address() {
            self.expect_interrupt_in_complete = false;
        }
    }

    fn control_in(&mut self, xfer: ControlIn<B>) {
        let req = xfer.request();
        match (req.request_type, req.recipient) {
            (RequestType::Standard, Recipient::Interface) => {
                if req.request == control::Request::GET_DESCRIPTOR {
                    let (dtype, index) = req.descriptor_type_index();
                    if dtype == DESCRIPTOR_TYPE_REPORT
                        && index == 0
                        && req.index == self.interface_index()
                    {
                        xfer.accept_with(REPORT_DESCRIPTOR).ok();
                    }
                }
            }
            (RequestType::Class, Recipient::Interface) => {
                if req.request == REQUEST_GET_REPORT && req.index == self.interface_index() {
                    let [report_type, _report_id] = req.value.to_be_bytes();
                    if report_type == REPORT_TYPE_INPUT {
                        xfer.accept_with(self.report.as_bytes()).ok();
                    } else {
                        xfer.reject().ok();
                    }
                }
            }
            _ => {}
        }
    }

    fn control_out(&mut self, xfer: ControlOut<B>) {
        let req = xfer.request();
        if req.request_type == RequestType::Class
            && req.recipient == Recipient::Interface
            && req.request == REQUEST_SET_REPORT
            && req.index == self.interface_index()
        {
            let [report_type, report_id] = req.value.to_be_bytes();
            // the LED output report is accepted and ignored
            if report_type == REPORT_TYPE_OUTPUT && report_id == 0 && xfer.data().len() == 1 {
                xfer.accept().ok();
            } else {
                xfer.reject().ok();
            }
        }
    }
}
