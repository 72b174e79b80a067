use crate::temper::SensorMetadata;

#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub metadata: SensorMetadata,

    /// Offset-corrected temperature.
    pub temperature_celsius: f64,
}
