use anyhow::{bail, format_err, Error};

/// Captured result of an external command
///
/// Unlike a plain `std::process::Output`, stdout and stderr are kept as
/// (lossy) UTF-8 text, so they can be logged and regex-parsed directly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a command which exited with code 0
    pub fn success<S: Into<String>>(stdout: S) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Output of a command which exited with a non-zero code
    pub fn failure<S: Into<String>>(code: i32, stderr: S) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Check the exit status.
    ///
    /// The exit_code_check() function should return true if the exit code
    /// is considered successful.
    pub fn check_status(&self, exit_code_check: Option<fn(i32) -> bool>) -> Result<(), Error> {
        match self.code {
            Some(code) => {
                let is_ok = match exit_code_check {
                    Some(check_fn) => check_fn(code),
                    None => code == 0,
                };
                if !is_ok {
                    let msg = self.stderr.trim_end();
                    let msg = if msg.is_empty() { "no error message" } else { msg };
                    bail!("status code: {} - {}", code, msg);
                }
                Ok(())
            }
            None => bail!("terminated by signal"),
        }
    }
}

/// Convert a std::process::Output into a `CommandOutput`
pub fn command_output(output: std::process::Output) -> CommandOutput {
    CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

/// Run a command and capture its output.
///
/// This only fails if the command cannot be executed at all, the exit
/// status is left to the caller (see [CommandOutput::check_status]).
pub fn run_command(mut command: std::process::Command) -> Result<CommandOutput, Error> {
    let output = command
        .output()
        .map_err(|err| format_err!("failed to execute {:?} - {}", command, err))?;

    Ok(command_output(output))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_check_status() {
        assert!(CommandOutput::success("ok").check_status(None).is_ok());

        let err = CommandOutput::failure(2, "No such file or directory\n")
            .check_status(None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "status code: 2 - No such file or directory"
        );

        let err = CommandOutput::failure(1, "").check_status(None).unwrap_err();
        assert_eq!(err.to_string(), "status code: 1 - no error message");

        assert!(CommandOutput::failure(1, "")
            .check_status(Some(|code| code <= 1))
            .is_ok());

        let killed = CommandOutput {
            code: None,
            ..Default::default()
        };
        assert!(killed.check_status(None).is_err());
    }

    #[test]
    fn test_run_command() -> Result<(), Error> {
        let mut command = std::process::Command::new("sh");
        command.args(["-c", "echo out; echo err >&2; exit 3"]);

        let output = run_command(command)?;
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");

        Ok(())
    }
}
