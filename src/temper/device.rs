use anyhow::Result;

/// Identity fields exposed by a sensor's USB device descriptor.
///
/// Vendor and product ids come straight from the descriptor; the string
/// fields need a round-trip to the device and may fail individually.
pub trait Descriptor {
    fn vendor_id(&self) -> u16;

    fn product_id(&self) -> u16;

    fn manufacturer(&self) -> Result<String>;

    fn product(&self) -> Result<String>;

    fn serial_number(&self) -> Result<String>;
}

/// An attached TEMPer sensor.
pub trait TemperDevice {
    /// `None` when the driver does not expose a descriptor for this device.
    fn descriptor(&self) -> Option<Box<dyn Descriptor + '_>>;

    /// Raw temperature in degrees Celsius, before any calibration offset.
    fn read_temperature(&mut self) -> Result<f64>;
}

/// Device layer able to list the sensors currently attached to the host.
pub trait SensorBus {
    type Device: TemperDevice;

    fn enumerate(&self) -> Result<Vec<Self::Device>>;
}
