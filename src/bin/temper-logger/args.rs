use std::path::PathBuf;

use chrono_tz::Tz;
use clap::Parser;
use temper_telemetry::{
    logging::{DEFAULT_BACKUP_COUNT, DEFAULT_MAX_BYTES, LogConfig, RotationPolicy},
    run::RunConfig,
};

#[derive(Debug, Parser)]
pub struct Args {
    #[arg(long, env = "TEMPER_CONFIG", default_value = "config/config.json")]
    pub config: PathBuf,

    #[arg(long, env = "TEMPER_CREDENTIALS", default_value = "config/credenciales.json")]
    pub credentials: PathBuf,

    #[arg(long, env = "TEMPER_LOG_FILE", default_value = "temperatura.log")]
    pub log_file: PathBuf,

    #[arg(long, env = "TEMPER_LOG_MAX_BYTES", default_value_t = DEFAULT_MAX_BYTES)]
    pub log_max_bytes: u64,

    #[arg(long, env = "TEMPER_LOG_BACKUPS", default_value_t = DEFAULT_BACKUP_COUNT)]
    pub log_backups: usize,

    #[arg(long, env = "TZ")]
    pub timezone: Option<Tz>,

    /// Store no IP address instead of probing the outbound interface.
    #[arg(long)]
    pub no_ip: bool,

    /// Exit with status 1 when the configuration cannot be loaded.
    #[arg(long, env = "TEMPER_EXIT_CODE_ON_FAILURE")]
    pub exit_code_on_failure: bool,
}

impl Args {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            location_path: self.config.clone(),
            credentials_path: self.credentials.clone(),
            probe_ip: !self.no_ip,
            timezone: self.timezone,
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            path: self.log_file.clone(),
            policy: RotationPolicy {
                max_bytes: self.log_max_bytes,
                backup_count: self.log_backups,
            },
        }
    }
}
