use std::io::Write;

use crate::alert_flags::AlertClassification;
use crate::alerts::{collect_test_alerts, AlertCollector, AlertRecord};
use crate::commands::{CommandMap, CommandRunner, SystemRunner};
use crate::config::RunConfig;
use crate::error::TapeAlertError;
use crate::notify::{send_email, Email};
use crate::platform::PlatformKind;
use crate::report;
use crate::resolve::DeviceNodeResolver;
use crate::run_log::RunLog;
use crate::{fdebug, flog};

/// Open the run log if logging is enabled
///
/// A log file which cannot be set up disables logging, the problem is
/// reported on stderr.
pub fn open_run_log(config: &RunConfig) -> RunLog {
    if !config.logging_enabled() {
        return RunLog::disabled();
    }

    match RunLog::new(&config.log_file, config.debug, config.jobid.clone()) {
        Ok(log) => log,
        Err(err) => {
            log::error!("{}", err);
            RunLog::disabled()
        }
    }
}

/// Resolve the control node of the configured drive and query it
pub fn poll_drive<R: CommandRunner + ?Sized>(
    config: &RunConfig,
    log: &RunLog,
    platform: &PlatformKind,
    runner: &R,
) -> Result<Vec<AlertRecord>, TapeAlertError> {
    let node = DeviceNodeResolver::new(runner, log).resolve(&config.device, platform)?;
    if node.is_unverified() {
        log::warn!(
            "{} is a generic SCSI node, unable to verify it belongs to the drive",
            node
        );
    }
    AlertCollector::new(runner, log)
        .test_mode(config.test)
        .collect(&node)
}

/// Collect the alerts of the configured drive on this host
pub fn collect_alerts(config: &RunConfig, log: &RunLog) -> Result<Vec<AlertRecord>, TapeAlertError> {
    if config.test {
        return test_alerts(log);
    }

    let platform = PlatformKind::detect()
        .map_err(|err| TapeAlertError::Query(format!("unable to get kernel name - {}", err)))?;
    fdebug!(log, "Platform: {}", platform);

    let commands = CommandMap::resolve(platform.required_commands(), log)?;
    let runner = SystemRunner::new(commands);

    collect_alerts_with(config, log, &platform, &runner)
}

/// Collect the alerts of the configured drive using `runner`
///
/// In test mode the built-in sample is parsed and `runner` is not used.
pub fn collect_alerts_with<R: CommandRunner + ?Sized>(
    config: &RunConfig,
    log: &RunLog,
    platform: &PlatformKind,
    runner: &R,
) -> Result<Vec<AlertRecord>, TapeAlertError> {
    if config.test {
        return test_alerts(log);
    }

    poll_drive(config, log, platform, runner)
}

fn test_alerts(log: &RunLog) -> Result<Vec<AlertRecord>, TapeAlertError> {
    flog!(log, "The 'test' option is set. Testing mode enabled!");
    collect_test_alerts()
}

/// Print the alert tokens to `out` and log the details
pub fn report_alerts<W: Write>(
    log: &RunLog,
    alerts: &[AlertRecord],
    out: &mut W,
) -> Result<(), TapeAlertError> {
    if alerts.is_empty() {
        flog!(log, "No TapeAlerts found");
        return Ok(());
    }

    report::write_alert_tokens(out, alerts)?;

    flog!(
        log,
        "WARN: {} detected on drive device:",
        report::alert_summary(alerts.len())
    );
    for alert in alerts {
        log.log(report::alert_log_line(alert));
    }
    for remark in AlertClassification::from_alerts(alerts).remarks() {
        log.log(remark);
    }

    Ok(())
}

/// Mail the alerts, if an address is configured
///
/// Failures are logged and otherwise ignored.
pub fn notify_alerts(config: &RunConfig, log: &RunLog, alerts: &[AlertRecord]) {
    let recipient = match config.email_recipient() {
        Some(recipient) if !alerts.is_empty() => recipient,
        _ => return,
    };

    let email = Email {
        from: recipient.to_string(),
        to: recipient.to_string(),
        subject: report::email_subject(alerts.len(), config.jobid.as_deref(), &config.device),
        body: report::email_body(alerts),
    };

    match send_email(&config.smtp, &email) {
        Ok(()) => flog!(log, "Successfully emailed TapeAlerts to: {}", recipient),
        Err(err) => {
            flog!(log, "{}", err);
            log::error!("{}", err);
        }
    }
}

fn log_run_start(config: &RunConfig, log: &RunLog) {
    log.log(report::start_banner());
    flog!(log, "Drive Device: {}", config.device);

    match (&config.email, config.email_recipient()) {
        (Some(email), None) => flog!(
            log,
            "email address '{}' does not look like a valid email, will not attempt to send",
            email
        ),
        (_, Some(email)) => flog!(log, "email is set to '{}', will attempt to send", email),
        (None, None) => {}
    }
}

fn log_run_end(log: &RunLog) {
    log.footer(report::program_info_rule());
    log.footer(report::program_info());
}

/// A complete TapeAlert run on this host
///
/// Writes the alert tokens to `out`, logs everything to `log` and sends
/// the notification mail. Errors are logged before they are returned,
/// nothing is written to `out` on failure.
pub fn run<W: Write>(
    config: &RunConfig,
    log: &RunLog,
    out: &mut W,
) -> Result<Vec<AlertRecord>, TapeAlertError> {
    run_collected(config, log, out, || collect_alerts(config, log))
}

/// Like [run], for a known platform and with utilities invoked through
/// `runner`
pub fn run_with<W: Write, R: CommandRunner + ?Sized>(
    config: &RunConfig,
    log: &RunLog,
    platform: &PlatformKind,
    runner: &R,
    out: &mut W,
) -> Result<Vec<AlertRecord>, TapeAlertError> {
    run_collected(config, log, out, || {
        collect_alerts_with(config, log, platform, runner)
    })
}

fn run_collected<W, F>(
    config: &RunConfig,
    log: &RunLog,
    out: &mut W,
    collect: F,
) -> Result<Vec<AlertRecord>, TapeAlertError>
where
    W: Write,
    F: FnOnce() -> Result<Vec<AlertRecord>, TapeAlertError>,
{
    log_run_start(config, log);

    let result = collect().and_then(|alerts| {
        report_alerts(log, &alerts, out)?;
        notify_alerts(config, log, &alerts);
        Ok(alerts)
    });

    if let Err(err) = &result {
        flog!(log, "ERROR: {}", err);
        flog!(log, "Exiting with return code 0");
    }

    log_run_end(log);

    result
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commands::test_runner::FakeRunner;
    use crate::commands::SystemCommand;
    use tapealert_tools::CommandOutput;

    #[test]
    fn test_run_test_mode() {
        let mut config = RunConfig::new("/dev/nst0");
        config.test = true;

        let mut out = Vec::new();
        let alerts = run(&config, &RunLog::disabled(), &mut out).unwrap();

        assert_eq!(alerts.len(), 7);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "TapeAlert[1]\nTapeAlert[2]\nTapeAlert[3]\nTapeAlert[5]\nTapeAlert[13]\nTapeAlert[20]\nTapeAlert[21]\n"
        );
    }

    #[test]
    fn test_poll_drive() {
        let config = RunConfig::new("/dev/nst0");
        let runner = FakeRunner::new()
            .with(SystemCommand::Ls, CommandOutput::success("crw-rw---- 1 root tape 9, 128 /dev/nst0\n"))
            .with(
                SystemCommand::Lsscsi,
                CommandOutput::success("[1:0:0:0] tape HP Ultrium 5-SCSI Z6ED /dev/st0 /dev/sg1\n"),
            )
            .with(
                SystemCommand::Tapeinfo,
                CommandOutput::success("Ready: yes\nTapeAlert[20]:     Clean Now: The tape drive needs cleaning NOW.\n"),
            );

        let alerts =
            poll_drive(&config, &RunLog::disabled(), &PlatformKind::Linux, &runner).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].token(), "TapeAlert[20]");
        assert_eq!(
            *runner.calls.borrow(),
            vec!["ls -l /dev/nst0", "lsscsi -g", "tapeinfo -f /dev/sg1"]
        );
    }

    #[test]
    fn test_report_nothing() {
        let mut out = Vec::new();
        report_alerts(&RunLog::disabled(), &[], &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_run_failure_logged() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("tapealert-run-{}", std::process::id()));
        let path = dir.join("run.log");
        let _ = std::fs::remove_dir_all(&dir);

        let mut config = RunConfig::new("/dev/nst0");
        config.logging = true;
        config.jobid = Some(String::from("42"));
        config.log_file = path.clone();
        let log = open_run_log(&config);

        let runner = FakeRunner::new()
            .with(SystemCommand::Ls, CommandOutput::success("crw-rw---- 1 root tape 9, 128 /dev/nst0\n"))
            .with(
                SystemCommand::Lsscsi,
                CommandOutput::success("[1:0:0:0] tape HP Ultrium 5-SCSI Z6ED /dev/st0 /dev/sg1\n"),
            )
            .with(
                SystemCommand::Tapeinfo,
                CommandOutput::failure(1, "mtx: Request Sense: Long Report=yes"),
            );

        let mut out = Vec::new();
        let result = run_with(&config, &log, &PlatformKind::Linux, &runner, &mut out);

        assert!(matches!(result, Err(TapeAlertError::Query(_))));
        assert!(out.is_empty());

        let content = std::fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        let count = lines.len();

        assert!(lines[count - 4].ends_with(
            " jobid: 42 - ERROR: drive query failed - tapeinfo -f /dev/sg1 failed - status code: 1 - mtx: Request Sense: Long Report=yes"
        ));
        assert!(lines[count - 3].ends_with(" jobid: 42 - Exiting with return code 0"));
        assert_eq!(lines[count - 2], format!("| {}", report::program_info_rule()));
        assert_eq!(lines[count - 1], format!("| {}", report::program_info()));

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_run_with_unresolved_platform() {
        let runner = FakeRunner::new();
        let mut out = Vec::new();

        let result = run_with(
            &RunConfig::new("/dev/nst0"),
            &RunLog::disabled(),
            &PlatformKind::Other(String::from("SunOS")),
            &runner,
            &mut out,
        );

        assert!(matches!(result, Err(TapeAlertError::UnsupportedPlatform(_))));
        assert!(out.is_empty());
        assert!(runner.calls.borrow().is_empty());
    }
}
