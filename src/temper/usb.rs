use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use rusb::{Context, DeviceDescriptor, DeviceHandle, UsbContext as _};

use crate::temper::{Descriptor, SensorBus, TemperDevice};

// Vendor/product pairs shipped under the TEMPer name.
const TEMPER_IDS: [(u16, u16); 4] = [
    (0x0c45, 0x7401),
    (0x0c45, 0x7402),
    (0x413d, 0x2107),
    (0x1a86, 0xe025),
];

const USB_TIMEOUT: Duration = Duration::from_secs(1);

const INTERFACES: [u8; 2] = [0, 1];

// HID class request, host to device, recipient interface.
const HID_SET_REPORT_REQUEST_TYPE: u8 = 0x21;
const HID_SET_REPORT: u8 = 0x09;

const INIT_REPORT_VALUE: u16 = 0x0201;
const INIT_REPORT: [u8; 2] = [0x01, 0x01];

const OUTPUT_REPORT_VALUE: u16 = 0x0200;
const READ_TEMPERATURE_REPORT: [u8; 8] = [0x01, 0x80, 0x33, 0x01, 0x00, 0x00, 0x00, 0x00];

const INTERRUPT_IN_ENDPOINT: u8 = 0x82;

/// TEMPer sensors reachable through libusb.
#[derive(Debug, Default)]
pub struct UsbBus;

impl UsbBus {
    pub fn new() -> Self {
        Self
    }
}

impl SensorBus for UsbBus {
    type Device = UsbTemper;

    fn enumerate(&self) -> Result<Vec<UsbTemper>> {
        let context = Context::new().context("failed to initialize libusb")?;
        let devices = context.devices().context("failed to list USB devices")?;

        let mut tempers = Vec::new();

        for device in devices.iter() {
            let Ok(descriptor) = device.device_descriptor() else {
                continue;
            };

            if !is_temper(descriptor.vendor_id(), descriptor.product_id()) {
                continue;
            }

            let handle = device.open().with_context(|| {
                format!(
                    "failed to open TEMPer device: bus {} address {}",
                    device.bus_number(),
                    device.address()
                )
            })?;

            tempers.push(UsbTemper::new(handle));
        }

        Ok(tempers)
    }
}

pub fn is_temper(vendor_id: u16, product_id: u16) -> bool {
    TEMPER_IDS.contains(&(vendor_id, product_id))
}

pub struct UsbTemper {
    handle: DeviceHandle<Context>,

    descriptor: Option<DeviceDescriptor>,

    claimed: Vec<u8>,
}

impl UsbTemper {
    fn new(handle: DeviceHandle<Context>) -> Self {
        let descriptor = handle.device().device_descriptor().ok();

        Self {
            handle,
            descriptor,
            claimed: Vec::new(),
        }
    }

    fn claim_interfaces(&mut self) -> Result<()> {
        if !self.claimed.is_empty() {
            return Ok(());
        }

        // Not supported on every platform; claiming reports the real problem.
        let _ = self.handle.set_auto_detach_kernel_driver(true);

        for interface in INTERFACES {
            self.handle
                .claim_interface(interface)
                .with_context(|| format!("failed to claim USB interface {interface}"))?;
            self.claimed.push(interface);
        }

        self.handle
            .write_control(
                HID_SET_REPORT_REQUEST_TYPE,
                HID_SET_REPORT,
                INIT_REPORT_VALUE,
                0,
                &INIT_REPORT,
                USB_TIMEOUT,
            )
            .context("failed to send TEMPer init report")?;

        Ok(())
    }
}

impl TemperDevice for UsbTemper {
    fn descriptor(&self) -> Option<Box<dyn Descriptor + '_>> {
        let descriptor = self.descriptor.as_ref()?;

        Some(Box::new(UsbDescriptor {
            handle: &self.handle,
            descriptor,
        }))
    }

    fn read_temperature(&mut self) -> Result<f64> {
        self.claim_interfaces()?;

        self.handle
            .write_control(
                HID_SET_REPORT_REQUEST_TYPE,
                HID_SET_REPORT,
                OUTPUT_REPORT_VALUE,
                1,
                &READ_TEMPERATURE_REPORT,
                USB_TIMEOUT,
            )
            .context("failed to send read temperature report")?;

        let mut report = [0u8; 8];
        let len = self
            .handle
            .read_interrupt(INTERRUPT_IN_ENDPOINT, &mut report, USB_TIMEOUT)
            .context("failed to read temperature report")?;

        decode_temperature(&report[..len])
    }
}

impl Drop for UsbTemper {
    fn drop(&mut self) {
        for interface in self.claimed.drain(..) {
            let _ = self.handle.release_interface(interface);
        }
    }
}

struct UsbDescriptor<'a> {
    handle: &'a DeviceHandle<Context>,

    descriptor: &'a DeviceDescriptor,
}

impl Descriptor for UsbDescriptor<'_> {
    fn vendor_id(&self) -> u16 {
        self.descriptor.vendor_id()
    }

    fn product_id(&self) -> u16 {
        self.descriptor.product_id()
    }

    fn manufacturer(&self) -> Result<String> {
        self.handle
            .read_manufacturer_string_ascii(self.descriptor)
            .context("failed to read manufacturer string")
    }

    fn product(&self) -> Result<String> {
        self.handle
            .read_product_string_ascii(self.descriptor)
            .context("failed to read product string")
    }

    fn serial_number(&self) -> Result<String> {
        self.handle
            .read_serial_number_string_ascii(self.descriptor)
            .context("failed to read serial number string")
    }
}

/// Decodes the temperature carried in bytes 2..4 of a TEMPer report:
/// a big-endian signed fixed-point value with 8 fractional bits.
pub fn decode_temperature(report: &[u8]) -> Result<f64> {
    if report.len() < 4 {
        bail!(
            "TEMPer report too short: expected at least 4 bytes, got {}",
            report.len()
        )
    }

    let raw = i16::from_be_bytes([report[2], report[3]]);

    Ok(f64::from(raw) / 256.0)
}
