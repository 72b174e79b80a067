mod args;

use std::process::ExitCode;

use args::Args;
use clap::Parser as _;
use temper_telemetry::{
    db::MySqlSink,
    logging,
    run::{RunOutcome, run},
    temper::usb::UsbBus,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log = match logging::install(&args.log_config()) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{e:#}");
            return exit_code(&args, RunOutcome::StartupFailed);
        }
    };

    let outcome = run(&args.run_config(), &UsbBus::new(), MySqlSink::new).await;

    exit_code(&args, outcome)
}

fn exit_code(args: &Args, outcome: RunOutcome) -> ExitCode {
    if args.exit_code_on_failure && outcome == RunOutcome::StartupFailed {
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}
