use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::{
    context::{HostContext, LocationContext},
    temper::SensorReading,
};

/// Sensor name stored when the device does not report a product string.
pub const UNKNOWN_SENSOR_NAME: &str = "Unknown";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of `telemetria_sensores`. Serializes with the column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    #[serde(rename = "fecha_hora", serialize_with = "serialize_timestamp")]
    pub measured_at: NaiveDateTime,

    #[serde(rename = "nombre_sensor")]
    pub sensor_name: String,

    #[serde(rename = "numero_serie")]
    pub serial_number: String,

    #[serde(rename = "ubicacion")]
    pub location: String,

    #[serde(rename = "hostname_maquina")]
    pub hostname: String,

    #[serde(rename = "ip_maquina")]
    pub ip: Option<String>,

    #[serde(rename = "id_maquina")]
    pub machine_id: Option<String>,

    #[serde(rename = "temperatura")]
    pub temperature_celsius: f64,

    /// No supported sensor reports humidity yet.
    #[serde(rename = "humedad")]
    pub humidity_percent: Option<f64>,

    /// No supported sensor is battery powered yet.
    #[serde(rename = "bateria")]
    pub battery: Option<f64>,

    #[serde(rename = "cpd")]
    pub data_center: String,

    #[serde(rename = "sala")]
    pub room: String,
}

impl TelemetryRecord {
    pub fn timestamp(&self) -> String {
        self.measured_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

fn serialize_timestamp<S: Serializer>(
    measured_at: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&measured_at.format(TIMESTAMP_FORMAT))
}

/// Builds the record for `reading` taken at `now`.
pub fn assemble(
    reading: SensorReading,
    host: &HostContext,
    location: &LocationContext,
    now: NaiveDateTime,
) -> TelemetryRecord {
    let SensorReading {
        metadata,
        temperature_celsius,
    } = reading;

    TelemetryRecord {
        measured_at: now,
        sensor_name: metadata
            .product
            .unwrap_or_else(|| UNKNOWN_SENSOR_NAME.to_string()),
        serial_number: metadata.serial_number,
        location: location.location.clone(),
        hostname: host.hostname.clone(),
        ip: host.ip.map(|ip| ip.to_string()),
        machine_id: host.machine_id.clone(),
        temperature_celsius: round_hundredths(temperature_celsius),
        humidity_percent: None,
        battery: None,
        data_center: location.data_center.clone(),
        room: location.room.clone(),
    }
}

/// Two decimals, ties to even.
fn round_hundredths(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}
