//! One acquisition-and-delivery run.
//!
//! A run loads its context, reads every attached sensor once and hands one
//! record per sensor to the sink. Nothing escapes as an error or a panic:
//! every failure ends up in the log and in the returned [`RunOutcome`].

use std::{any::Any, panic::AssertUnwindSafe, path::PathBuf};

use anyhow::{Context as _, Result};
use chrono::{Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use futures::FutureExt as _;

use crate::{
    context::{Credentials, HostContext, LocationContext},
    db::TelemetrySink,
    telemetry::assemble,
    temper::{SensorBus, acquire},
};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub location_path: PathBuf,

    pub credentials_path: PathBuf,

    /// Detect the outbound IP address of the host.
    pub probe_ip: bool,

    /// Zone used for record timestamps; the system zone when `None`.
    pub timezone: Option<Tz>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Context could not be loaded; no sensor was touched.
    StartupFailed,

    NoSensors,

    Completed { delivered: usize, failed: usize },

    /// The run stopped on an error outside the per-record loop, or panicked.
    Aborted,
}

/// Read-only snapshot shared by every record of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub host: HostContext,

    pub location: LocationContext,

    pub credentials: Credentials,
}

pub fn load_context(config: &RunConfig) -> Result<RunContext> {
    let host = HostContext::detect(config.probe_ip).context("failed to detect host identity")?;
    let location = LocationContext::load(&config.location_path)
        .context("failed to load location configuration")?;
    let credentials = Credentials::load(&config.credentials_path)
        .context("failed to load database credentials")?;

    Ok(RunContext {
        host,
        location,
        credentials,
    })
}

/// Runs once against `bus`, delivering through the sink built by `connect`
/// from the loaded credentials.
pub async fn run<B, S, F>(config: &RunConfig, bus: &B, connect: F) -> RunOutcome
where
    B: SensorBus,
    S: TelemetrySink,
    F: FnOnce(&Credentials) -> S,
{
    match AssertUnwindSafe(run_once(config, bus, connect))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(panic) => {
            tracing::error!("run panicked: {}", panic_message(&*panic));
            RunOutcome::Aborted
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

async fn run_once<B, S, F>(config: &RunConfig, bus: &B, connect: F) -> RunOutcome
where
    B: SensorBus,
    S: TelemetrySink,
    F: FnOnce(&Credentials) -> S,
{
    let context = match load_context(config) {
        Ok(context) => context,
        Err(err) => {
            tracing::error!("{err:#}");
            return RunOutcome::StartupFailed;
        }
    };

    let sink = connect(&context.credentials);

    match deliver_all(&context, bus, &sink, config.timezone).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::error!("failed to read sensors: {err:#}");
            RunOutcome::Aborted
        }
    }
}

async fn deliver_all<B, S>(
    context: &RunContext,
    bus: &B,
    sink: &S,
    timezone: Option<Tz>,
) -> Result<RunOutcome>
where
    B: SensorBus,
    S: TelemetrySink,
{
    let readings = acquire(bus, context.location.offset_celsius)?;

    if readings.is_empty() {
        tracing::warn!("no TEMPer sensors detected");
        return Ok(RunOutcome::NoSensors);
    }

    let mut delivered = 0;
    let mut failed = 0;

    for reading in readings {
        let record = assemble(reading, &context.host, &context.location, now(timezone));

        match serde_json::to_string(&record) {
            Ok(payload) => tracing::info!("{payload}"),
            Err(_) => tracing::info!("{record:?}"),
        }

        let sensor_name = record.sensor_name.clone();
        let temperature_celsius = record.temperature_celsius;

        if sink.deliver(record).await {
            tracing::info!("record inserted into database: {sensor_name} | {temperature_celsius:.2}°C");
            delivered += 1;
        } else {
            tracing::error!("failed to insert record into database: {sensor_name}");
            failed += 1;
        }
    }

    Ok(RunOutcome::Completed { delivered, failed })
}

fn now(timezone: Option<Tz>) -> NaiveDateTime {
    match timezone {
        Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
        None => Local::now().naive_local(),
    }
}
