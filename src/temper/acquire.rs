use anyhow::{Context as _, Result};

use crate::temper::{SensorBus, SensorReading, TemperDevice, extract_metadata};

/// Reads every attached sensor and applies `offset_celsius` to each value.
///
/// Readings keep the enumeration order of `bus`. No attached sensors is
/// not an error and yields an empty vector. A device that fails to report
/// a temperature fails the whole acquisition.
pub fn acquire<B: SensorBus>(bus: &B, offset_celsius: f64) -> Result<Vec<SensorReading>> {
    let devices = bus
        .enumerate()
        .context("failed to enumerate TEMPer devices")?;

    let mut readings = Vec::with_capacity(devices.len());

    for mut device in devices {
        let metadata = extract_metadata(&device);

        let raw_celsius = device.read_temperature().with_context(|| {
            format!(
                "failed to read temperature from sensor: {}",
                metadata.serial_number
            )
        })?;

        readings.push(SensorReading {
            metadata,
            temperature_celsius: raw_celsius + offset_celsius,
        });
    }

    Ok(readings)
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;
    use crate::temper::{Descriptor, UNKNOWN_SERIAL};

    struct FakeDevice {
        raw_celsius: Option<f64>,
    }

    impl TemperDevice for FakeDevice {
        fn descriptor(&self) -> Option<Box<dyn Descriptor + '_>> {
            None
        }

        fn read_temperature(&mut self) -> Result<f64> {
            match self.raw_celsius {
                Some(v) => Ok(v),
                None => bail!("interrupt transfer timed out"),
            }
        }
    }

    struct FakeBus(Vec<Option<f64>>);

    impl SensorBus for FakeBus {
        type Device = FakeDevice;

        fn enumerate(&self) -> Result<Vec<FakeDevice>> {
            Ok(self
                .0
                .iter()
                .map(|&raw_celsius| FakeDevice { raw_celsius })
                .collect())
        }
    }

    #[test]
    fn no_devices_yields_empty_readings() {
        let readings = acquire(&FakeBus(vec![]), -6.14).unwrap();

        assert!(readings.is_empty());
    }

    #[test]
    fn applies_offset_in_enumeration_order() {
        let readings = acquire(&FakeBus(vec![Some(28.5), Some(20.0)]), -6.0).unwrap();

        let temperatures: Vec<f64> = readings.iter().map(|r| r.temperature_celsius).collect();
        assert_eq!(temperatures, vec![22.5, 14.0]);
        assert_eq!(readings[0].metadata.serial_number, UNKNOWN_SERIAL);
    }

    #[test]
    fn read_failure_fails_the_acquisition() {
        let err = acquire(&FakeBus(vec![Some(21.0), None]), 0.0).unwrap_err();

        assert!(format!("{err:#}").contains("interrupt transfer timed out"));
    }
}
