pub mod context;
pub mod db;
pub mod logging;
pub mod run;
pub mod telemetry;
pub mod temper;
