//! Report TapeAlert flags of a tape drive to the Bacula storage daemon
//!
//! Drop-in replacement for the `tapealert` script shipped with Bacula.
//! Configure it as the `AlertCommand` of a drive:
//!
//! ```text
//! AlertCommand = "/opt/bacula/scripts/bacula-tapealert %l"
//! ```
//!
//! Features:
//!
//! - automatically detects the generic SCSI node `tapeinfo` needs
//! - optional logging (with debug mode) to an append-only log file
//! - optional email notification via SMTP
//! - test mode with a built-in `tapeinfo` sample
//!
//! The program always exits with code 0 once its parameters are
//! parsed, so a failing check never blocks the storage daemon. Errors
//! are reported on stderr and in the log file.
use anyhow::Error;
use serde_json::Value;

use proxmox_router::cli::*;
use proxmox_schema::api;

use bacula_tapealert::{open_run_log, run, RunConfig};
use tapealert_buildcfg::TAPEALERT_LOG_ENV;

#[api(
    input: {
        properties: {
            "drive-device": {
                description: "The drive's /dev/nst#, /dev/tape/by-id/*-nst, or /dev/tape/by-path/* node.",
                type: String,
            },
            debug: {
                description: "Log a lot more output, including system utility outputs.",
                type: Boolean,
                optional: true,
                default: false,
            },
            logging: {
                description: "Write a log file at all.",
                type: Boolean,
                optional: true,
                default: false,
            },
            test: {
                description: "Run in test mode, using a built-in tapeinfo sample instead of the drive.",
                type: Boolean,
                optional: true,
                default: false,
            },
            file: {
                description: "The log file to append to.",
                type: String,
                optional: true,
                default: "/opt/bacula/log/bacula-tapealert.log",
            },
            jobid: {
                description: "The id of the job which triggered the check.",
                type: String,
                optional: true,
            },
            email: {
                description: "Send email to this address when TapeAlerts are detected.",
                type: String,
                optional: true,
            },
            "smtp-server": {
                description: "The SMTP server.",
                type: String,
                optional: true,
                default: "localhost",
            },
            "smtp-port": {
                description: "The SMTP port.",
                type: Integer,
                optional: true,
                minimum: 1,
                maximum: 65535,
                default: 25,
            },
            "smtp-user": {
                description: "The SMTP user.",
                type: String,
                optional: true,
            },
            "smtp-pass": {
                description: "The SMTP password.",
                type: String,
                optional: true,
            },
        },
    },
)]
/// Check a tape drive for TapeAlerts and print them for the storage daemon.
fn tapealert(param: Value) -> Result<(), Error> {
    let config = RunConfig::from_cli_param(&param)?;
    let log = open_run_log(&config);

    let mut stdout = std::io::stdout();
    if let Err(err) = run(&config, &log, &mut stdout) {
        log::error!("{}", err);
    }

    Ok(())
}

fn main() {
    init_cli_logger(TAPEALERT_LOG_ENV, "warn");

    let cmd_def = CliCommand::new(&API_METHOD_TAPEALERT).arg_param(&["drive-device"]);

    run_cli_command(cmd_def, CliEnvironment::new(), None);
}
