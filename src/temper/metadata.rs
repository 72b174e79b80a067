use serde::Serialize;

use crate::temper::TemperDevice;

/// Serial number reported when the device cannot provide one.
pub const UNKNOWN_SERIAL: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorMetadata {
    pub vendor_id: Option<String>,

    pub product_id: Option<String>,

    pub manufacturer: Option<String>,

    pub product: Option<String>,

    pub serial_number: String,
}

impl SensorMetadata {
    /// Metadata for a device whose descriptor is not exposed at all.
    pub fn unavailable() -> Self {
        Self {
            vendor_id: None,
            product_id: None,
            manufacturer: None,
            product: None,
            serial_number: UNKNOWN_SERIAL.to_string(),
        }
    }
}

/// Reads the identity fields of `device`.
///
/// Never fails: a string field that cannot be read is left empty, and a
/// device without a descriptor yields [`SensorMetadata::unavailable`].
pub fn extract_metadata<D: TemperDevice + ?Sized>(device: &D) -> SensorMetadata {
    let Some(descriptor) = device.descriptor() else {
        return SensorMetadata::unavailable();
    };

    let serial_number = descriptor
        .serial_number()
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_SERIAL.to_string());

    SensorMetadata {
        vendor_id: Some(format!("0x{:x}", descriptor.vendor_id())),
        product_id: Some(format!("0x{:x}", descriptor.product_id())),
        manufacturer: descriptor.manufacturer().ok(),
        product: descriptor.product().ok(),
        serial_number,
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, anyhow, bail};

    use super::*;
    use crate::temper::Descriptor;

    #[derive(Clone, Default)]
    struct FakeDescriptor {
        manufacturer: Option<&'static str>,
        product: Option<&'static str>,
        serial_number: Option<&'static str>,
    }

    impl Descriptor for FakeDescriptor {
        fn vendor_id(&self) -> u16 {
            0x413d
        }

        fn product_id(&self) -> u16 {
            0x2107
        }

        fn manufacturer(&self) -> Result<String> {
            self.manufacturer
                .map(str::to_string)
                .ok_or_else(|| anyhow!("string descriptor unreadable"))
        }

        fn product(&self) -> Result<String> {
            self.product
                .map(str::to_string)
                .ok_or_else(|| anyhow!("string descriptor unreadable"))
        }

        fn serial_number(&self) -> Result<String> {
            self.serial_number
                .map(str::to_string)
                .ok_or_else(|| anyhow!("string descriptor unreadable"))
        }
    }

    struct FakeDevice(Option<FakeDescriptor>);

    impl TemperDevice for FakeDevice {
        fn descriptor(&self) -> Option<Box<dyn Descriptor + '_>> {
            self.0
                .clone()
                .map(|d| Box::new(d) as Box<dyn Descriptor + '_>)
        }

        fn read_temperature(&mut self) -> Result<f64> {
            bail!("not used")
        }
    }

    fn complete() -> FakeDescriptor {
        FakeDescriptor {
            manufacturer: Some("RDing"),
            product: Some("TEMPer Sensor"),
            serial_number: Some("A1B2C3D4"),
        }
    }

    #[test]
    fn reads_every_field_from_a_complete_descriptor() {
        let metadata = extract_metadata(&FakeDevice(Some(complete())));

        assert_eq!(
            metadata,
            SensorMetadata {
                vendor_id: Some("0x413d".to_string()),
                product_id: Some("0x2107".to_string()),
                manufacturer: Some("RDing".to_string()),
                product: Some("TEMPer Sensor".to_string()),
                serial_number: "A1B2C3D4".to_string(),
            }
        );
    }

    #[test]
    fn missing_descriptor_leaves_only_the_unknown_serial() {
        let metadata = extract_metadata(&FakeDevice(None));

        assert_eq!(metadata.vendor_id, None);
        assert_eq!(metadata.product_id, None);
        assert_eq!(metadata.manufacturer, None);
        assert_eq!(metadata.product, None);
        assert_eq!(metadata.serial_number, UNKNOWN_SERIAL);
    }

    #[test]
    fn unreadable_product_only_clears_product() {
        let descriptor = FakeDescriptor {
            product: None,
            ..complete()
        };

        let metadata = extract_metadata(&FakeDevice(Some(descriptor)));

        assert_eq!(metadata.product, None);
        assert_eq!(metadata.manufacturer.as_deref(), Some("RDing"));
        assert_eq!(metadata.vendor_id.as_deref(), Some("0x413d"));
        assert_eq!(metadata.product_id.as_deref(), Some("0x2107"));
        assert_eq!(metadata.serial_number, "A1B2C3D4");
    }

    #[test]
    fn unreadable_manufacturer_only_clears_manufacturer() {
        let descriptor = FakeDescriptor {
            manufacturer: None,
            ..complete()
        };

        let metadata = extract_metadata(&FakeDevice(Some(descriptor)));

        assert_eq!(metadata.manufacturer, None);
        assert_eq!(metadata.product.as_deref(), Some("TEMPer Sensor"));
        assert_eq!(metadata.serial_number, "A1B2C3D4");
    }

    #[test]
    fn unreadable_or_empty_serial_falls_back_to_unknown() {
        let unreadable = FakeDescriptor {
            serial_number: None,
            ..complete()
        };
        let empty = FakeDescriptor {
            serial_number: Some(""),
            ..complete()
        };

        let unreadable = extract_metadata(&FakeDevice(Some(unreadable)));
        let empty = extract_metadata(&FakeDevice(Some(empty)));

        assert_eq!(unreadable.serial_number, UNKNOWN_SERIAL);
        assert_eq!(unreadable.product.as_deref(), Some("TEMPer Sensor"));
        assert_eq!(empty.serial_number, UNKNOWN_SERIAL);
    }
}
