//! Text formatting for stdout, the run log and notification mails

use std::io::Write;

use tapealert_buildcfg::{BINARY_NAME, PROGRAM_AUTHORS, PROGRAM_NAME, TAPEALERT_PKG_VERSION};

use crate::alert_flags::AlertClassification;
use crate::alerts::AlertRecord;

/// One line program identification, used as log footer and mail signature
pub fn program_info() -> String {
    format!(
        "{} - v{} - {} - By: {}",
        PROGRAM_NAME, TAPEALERT_PKG_VERSION, BINARY_NAME, PROGRAM_AUTHORS
    )
}

/// Dashed rule as wide as [program_info]
pub fn program_info_rule() -> String {
    "-".repeat(program_info().len())
}

pub fn start_banner() -> String {
    format!("Starting {} v{}", PROGRAM_NAME, TAPEALERT_PKG_VERSION)
}

/// `(1) TapeAlert` or `(3) TapeAlerts`
pub fn alert_summary(count: usize) -> String {
    format!("({}) TapeAlert{}", count, if count > 1 { "s" } else { "" })
}

/// Write the `TapeAlert[<code>]` tokens for the storage daemon
///
/// The SD only looks for `TapeAlert[%d]` and ignores everything after
/// it, so the description is not printed. All tokens are written with a
/// single call, so a failing run never leaves partial output.
pub fn write_alert_tokens<W: Write>(out: &mut W, alerts: &[AlertRecord]) -> std::io::Result<()> {
    let mut text = String::new();
    for alert in alerts {
        text.push_str(&alert.token());
        text.push('\n');
    }
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// Log line for a single alert: `      [13]: Snapped Tape: ...`
pub fn alert_log_line(alert: &AlertRecord) -> String {
    format!("      [{}]: {}", alert.code(), alert.description())
}

pub fn email_subject(alert_count: usize, jobid: Option<&str>, device: &str) -> String {
    let mut subject = format!("{} - WARN: {} detected ", PROGRAM_NAME, alert_summary(alert_count));
    if let Some(jobid) = jobid {
        subject.push_str(&format!("during jobid: {} ", jobid));
    }
    subject.push_str(&format!("on device '{}'", device));
    subject
}

pub fn email_body(alerts: &[AlertRecord]) -> String {
    let header = format!(
        "The following {} {} detected:",
        alert_summary(alerts.len()),
        if alerts.len() > 1 { "were" } else { "was" }
    );

    let mut body = String::new();
    body.push_str(&header);
    body.push('\n');
    body.push_str(&"-".repeat(header.len()));
    body.push('\n');

    for alert in alerts {
        body.push_str(&alert.to_string());
        body.push('\n');
    }

    let remarks = AlertClassification::from_alerts(alerts).remarks();
    if !remarks.is_empty() {
        body.push('\n');
        for remark in remarks {
            body.push_str(remark);
            body.push('\n');
        }
    }

    body.push('\n');
    body.push_str(&program_info_rule());
    body.push('\n');
    body.push_str(&program_info());
    body.push('\n');

    body
}
