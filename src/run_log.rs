//! Append-only run log
//!
//! Every line carries a local timestamp and, when known, the job id of
//! the Bacula job which triggered the check. Footer lines are written
//! without timestamp, prefixed with `| `.
//!
//! The file is opened in append mode for each line and closed right
//! after, so no handle is held across external command invocations.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{format_err, Error};

use tapealert_tools::CommandOutput;

/// Log messages to a [RunLog](struct.RunLog.html)
#[macro_export]
macro_rules! flog {
    ($log:expr, $($arg:tt)*) => ({
        $log.log(format!($($arg)*));
    })
}

/// Log messages to a [RunLog](struct.RunLog.html), in debug mode only
#[macro_export]
macro_rules! fdebug {
    ($log:expr, $($arg:tt)*) => ({
        if $log.is_debug() {
            $log.log(format!($($arg)*));
        }
    })
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Debug, Default)]
pub struct RunLog {
    path: Option<PathBuf>,
    debug: bool,
    jobid: Option<String>,
}

impl RunLog {
    /// A log which silently drops everything
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Log to `file_name`, creating its parent directory if needed
    pub fn new<P: AsRef<Path>>(
        file_name: P,
        debug: bool,
        jobid: Option<String>,
    ) -> Result<Self, Error> {
        let path = file_name.as_ref().to_path_buf();

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|err| {
                    format_err!("unable to create log directory {:?} - {}", dir, err)
                })?;
            }
        }

        Ok(Self {
            path: Some(path),
            debug,
            jobid,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    pub fn is_debug(&self) -> bool {
        self.debug && self.is_enabled()
    }

    pub fn log<S: AsRef<str>>(&self, msg: S) {
        if self.path.is_none() {
            return;
        }
        let line = format_log_line(&timestamp(), self.jobid.as_deref(), msg.as_ref());
        self.append(&line);
    }

    pub fn footer<S: AsRef<str>>(&self, msg: S) {
        if self.path.is_none() {
            return;
        }
        self.append(&format_footer_line(msg.as_ref()));
    }

    /// Log exit code, stdout and stderr of a command (debug mode only)
    pub fn command_output(&self, output: &CommandOutput) {
        if !self.is_debug() {
            return;
        }
        for line in format_command_output(output) {
            self.log(line);
        }
    }

    fn append(&self, line: &str) {
        let path = match &self.path {
            Some(path) => path,
            None => return,
        };

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(err) = result {
            log::warn!("unable to write log file {:?} - {}", path, err);
        }
    }
}

fn timestamp() -> String {
    let now = proxmox_time::epoch_i64();
    proxmox_time::strftime_local(TIMESTAMP_FORMAT, now).unwrap_or_else(|_| now.to_string())
}

/// Format a regular log line
///
/// The `Starting` banner line gets a blank line in front, so that
/// consecutive runs are easy to tell apart.
pub fn format_log_line(timestamp: &str, jobid: Option<&str>, text: &str) -> String {
    let mut line = String::new();

    if text.starts_with("Starting") {
        line.push('\n');
    }
    line.push_str(timestamp);
    line.push(' ');
    if let Some(jobid) = jobid {
        line.push_str("jobid: ");
        line.push_str(jobid);
        line.push(' ');
    }
    line.push_str("- ");
    line.push_str(text.trim_end_matches('\n'));
    line.push('\n');

    line
}

pub fn format_footer_line(text: &str) -> String {
    format!("| {}\n", text.trim_end_matches('\n'))
}

fn format_stream(name: &str, data: &str) -> String {
    let data = data.trim_end_matches('\n');
    if data.is_empty() {
        format!("{}: N/A", name)
    } else if data.contains('\n') {
        format!("{0}: \n[begin {0}]\n{1}\n[end {0}]", name, data)
    } else {
        format!("{}: {}", name, data)
    }
}

pub fn format_command_output(output: &CommandOutput) -> Vec<String> {
    let code = match output.code {
        Some(code) => code.to_string(),
        None => String::from("terminated by signal"),
    };

    vec![
        format!("returncode: {}", code),
        format_stream("stdout", &output.stdout),
        format_stream("stderr", &output.stderr),
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    const TS: &str = "2024-08-08 12:00:00";

    #[test]
    fn test_log_line_format() {
        assert_eq!(
            format_log_line(TS, None, "Drive Device: /dev/nst0\n"),
            "2024-08-08 12:00:00 - Drive Device: /dev/nst0\n"
        );
        assert_eq!(
            format_log_line(TS, Some("4711"), "No TapeAlerts found"),
            "2024-08-08 12:00:00 jobid: 4711 - No TapeAlerts found\n"
        );
        assert_eq!(
            format_log_line(TS, None, "Starting Bacula TapeAlert v0.12"),
            "\n2024-08-08 12:00:00 - Starting Bacula TapeAlert v0.12\n"
        );
        assert_eq!(format_footer_line("-----\n"), "| -----\n");
    }

    #[test]
    fn test_command_output_format() {
        let output = CommandOutput {
            code: Some(0),
            stdout: String::from("line1\nline2\n"),
            stderr: String::new(),
        };
        assert_eq!(
            format_command_output(&output),
            vec![
                "returncode: 0".to_string(),
                "stdout: \n[begin stdout]\nline1\nline2\n[end stdout]".to_string(),
                "stderr: N/A".to_string(),
            ]
        );

        let output = CommandOutput::failure(2, "ls: cannot access '/dev/nst9'\n");
        assert_eq!(
            format_command_output(&output)[2],
            "stderr: ls: cannot access '/dev/nst9'"
        );
    }

    #[test]
    fn test_append_and_disabled() -> Result<(), Error> {
        let dir = std::env::temp_dir().join(format!("tapealert-runlog-{}", std::process::id()));
        let path = dir.join("sub").join("run.log");
        let _ = std::fs::remove_dir_all(&dir);

        let log = RunLog::new(&path, true, Some("12".to_string()))?;
        assert!(log.is_enabled() && log.is_debug());

        flog!(log, "Starting {}", "test");
        fdebug!(log, "debug {}", 1);
        log.footer("footer");

        let content = std::fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "");
        assert!(lines[1].ends_with(" jobid: 12 - Starting test"));
        assert!(lines[2].ends_with(" jobid: 12 - debug 1"));
        assert_eq!(lines[3], "| footer");

        let disabled = RunLog::disabled();
        assert!(!disabled.is_enabled() && !disabled.is_debug());
        disabled.log("dropped");

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
