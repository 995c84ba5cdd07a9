//! Poll a tape drive for TapeAlert flags on behalf of the Bacula
//! storage daemon.
//!
//! A run resolves the configured drive device to its generic SCSI
//! control node ([resolve]), queries the drive with `tapeinfo`
//! ([alerts]) and prints one `TapeAlert[<code>]` token per active flag
//! to stdout. Optionally everything is logged to an append-only file
//! ([run_log]) and mailed ([notify]).

pub mod alert_flags;
pub mod alerts;
pub mod commands;
pub mod config;
pub mod error;
pub mod notify;
pub mod platform;
pub mod report;
pub mod resolve;
pub mod run_log;

mod run;
pub use run::{
    collect_alerts, collect_alerts_with, notify_alerts, open_run_log, poll_drive, report_alerts,
    run, run_with,
};

pub use alerts::AlertRecord;
pub use config::RunConfig;
pub use error::TapeAlertError;
