use anyhow::{Context as _, Result};
use sqlx::{
    Connection as _,
    mysql::{MySqlConnectOptions, MySqlConnection},
};

use crate::{context::Credentials, telemetry::TelemetryRecord};

const INSERT_TELEMETRY: &str = r#"
    INSERT INTO telemetria_sensores
    (fecha_hora, nombre_sensor, numero_serie, ubicacion, hostname_maquina,
     ip_maquina, id_maquina, temperatura, humedad, bateria, cpd, sala)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// Persistence boundary for telemetry records.
///
/// `deliver` reports the outcome instead of failing, so a caller can keep
/// going with the next record.
#[allow(async_fn_in_trait)]
pub trait TelemetrySink {
    async fn deliver(&self, record: TelemetryRecord) -> bool;
}

/// MariaDB/MySQL sink opening one connection per delivered record.
#[derive(Debug, Clone)]
pub struct MySqlSink {
    options: MySqlConnectOptions,
}

impl MySqlSink {
    pub fn new(credentials: &Credentials) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&credentials.host)
            .port(credentials.port)
            .username(&credentials.user)
            .password(&credentials.password)
            .database(&credentials.database);

        Self { options }
    }
}

impl TelemetrySink for MySqlSink {
    async fn deliver(&self, record: TelemetryRecord) -> bool {
        let mut conn = match MySqlConnection::connect_with(&self.options).await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::warn!("failed to connect to database: {err}");
                return false;
            }
        };

        let inserted = insert_record(&mut conn, &record).await;

        if let Err(err) = conn.close().await {
            tracing::warn!("failed to close database connection: {err}");
        }

        match inserted {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("{err:#}");
                false
            }
        }
    }
}

pub async fn insert_record(conn: &mut MySqlConnection, record: &TelemetryRecord) -> Result<()> {
    let mut tx = conn.begin().await.context("failed to begin transaction")?;

    sqlx::query(INSERT_TELEMETRY)
        .bind(record.timestamp())
        .bind(&record.sensor_name)
        .bind(&record.serial_number)
        .bind(&record.location)
        .bind(&record.hostname)
        .bind(&record.ip)
        .bind(&record.machine_id)
        .bind(record.temperature_celsius)
        .bind(record.humidity_percent)
        .bind(record.battery)
        .bind(&record.data_center)
        .bind(&record.room)
        .execute(&mut *tx)
        .await
        .context("failed to execute insert query")?;

    tx.commit().await.context("failed to commit transaction")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn unreachable_credentials() -> Credentials {
        Credentials {
            host: "127.0.0.1".to_string(),
            // Port 1 is reserved and never has a listener in test environments.
            port: 1,
            user: "telemetry".to_string(),
            password: "secret".to_string(),
            database: "sensores".to_string(),
        }
    }

    fn record() -> TelemetryRecord {
        TelemetryRecord {
            measured_at: NaiveDate::from_ymd_opt(2025, 11, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            sensor_name: "TEMPer Sensor".to_string(),
            serial_number: "A1B2C3D4".to_string(),
            location: "Planta 2".to_string(),
            hostname: "rack-07".to_string(),
            ip: None,
            machine_id: None,
            temperature_celsius: 22.37,
            humidity_percent: None,
            battery: None,
            data_center: "CPD1".to_string(),
            room: "Sala A".to_string(),
        }
    }

    #[test]
    fn insert_lists_twelve_columns_and_placeholders() {
        let columns = INSERT_TELEMETRY
            .split_once('(')
            .and_then(|(_, rest)| rest.split_once(')'))
            .map(|(columns, _)| columns)
            .unwrap();
        let columns: Vec<&str> = columns.split(',').map(str::trim).collect();

        assert_eq!(
            columns,
            vec![
                "fecha_hora",
                "nombre_sensor",
                "numero_serie",
                "ubicacion",
                "hostname_maquina",
                "ip_maquina",
                "id_maquina",
                "temperatura",
                "humedad",
                "bateria",
                "cpd",
                "sala",
            ]
        );
        assert_eq!(INSERT_TELEMETRY.matches('?').count(), 12);
    }

    #[tokio::test]
    async fn unreachable_store_reports_failure() {
        let sink = MySqlSink::new(&unreachable_credentials());

        assert!(!sink.deliver(record()).await);
    }
}
