//! System utilities used to resolve and query tape drives
//!
//! Utilities are looked up once at startup and kept in a [CommandMap],
//! all invocations go through the [CommandRunner] trait so that the
//! resolver and collector can be exercised with canned outputs.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{format_err, Error};

use tapealert_tools::fs::find_executable;
use tapealert_tools::{run_command, CommandOutput};

use crate::error::TapeAlertError;
use crate::run_log::RunLog;
use crate::{fdebug, flog};

/// Logical names of the external utilities we depend on
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SystemCommand {
    /// `ls`, used to read the target of by-id/by-path links
    Ls,
    /// `lsscsi`, linux SCSI device enumeration
    Lsscsi,
    /// `tapeinfo` from the mtx package, the TapeAlert query itself
    Tapeinfo,
    /// `camcontrol`, FreeBSD CAM device enumeration
    Camcontrol,
}

impl SystemCommand {
    pub fn name(self) -> &'static str {
        match self {
            SystemCommand::Ls => "ls",
            SystemCommand::Lsscsi => "lsscsi",
            SystemCommand::Tapeinfo => "tapeinfo",
            SystemCommand::Camcontrol => "camcontrol",
        }
    }
}

impl fmt::Display for SystemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static mapping from logical command to executable path
#[derive(Clone, Debug, Default)]
pub struct CommandMap {
    paths: BTreeMap<SystemCommand, PathBuf>,
}

impl CommandMap {
    /// Locate all `commands` in the `PATH` of the current process
    pub fn resolve(commands: &[SystemCommand], log: &RunLog) -> Result<Self, TapeAlertError> {
        let search_path = std::env::var_os("PATH").unwrap_or_else(OsString::new);
        Self::resolve_in(commands, &search_path, log)
    }

    /// Locate all `commands` in `search_path`
    ///
    /// Fails on the first command which is missing or not executable.
    pub fn resolve_in(
        commands: &[SystemCommand],
        search_path: &OsStr,
        log: &RunLog,
    ) -> Result<Self, TapeAlertError> {
        let names: Vec<&str> = commands.iter().map(|cmd| cmd.name()).collect();
        flog!(log, "Checking that system utilities exist: {}", names.join(", "));

        let mut paths = BTreeMap::new();

        for cmd in commands {
            fdebug!(log, "Checking command: {}", cmd);
            let path = find_executable(cmd.name(), search_path);
            match &path {
                Some(path) => fdebug!(log, "Command {} ({:?}): OK", cmd, path),
                None => fdebug!(log, "Command {} (None): FAIL", cmd),
            }
            match path {
                Some(path) => {
                    paths.insert(*cmd, path);
                }
                None => return Err(TapeAlertError::MissingDependency(cmd.name().to_string())),
            }
        }

        Ok(Self { paths })
    }

    /// Build a map from already known paths
    pub fn with_paths<I: IntoIterator<Item = (SystemCommand, PathBuf)>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }

    pub fn path(&self, cmd: SystemCommand) -> Option<&Path> {
        self.paths.get(&cmd).map(PathBuf::as_path)
    }
}

/// Runs a system utility and captures its output
pub trait CommandRunner {
    /// Execute `cmd` with `args`.
    ///
    /// Only fails if the command cannot be executed, a non-zero exit
    /// status is part of the returned [CommandOutput].
    fn run(&self, cmd: SystemCommand, args: &[&str]) -> Result<CommandOutput, Error>;
}

/// Executes the utilities found in a [CommandMap]
pub struct SystemRunner {
    commands: CommandMap,
}

impl SystemRunner {
    pub fn new(commands: CommandMap) -> Self {
        Self { commands }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: SystemCommand, args: &[&str]) -> Result<CommandOutput, Error> {
        let path = self
            .commands
            .path(cmd)
            .ok_or_else(|| format_err!("command '{}' was not resolved", cmd))?;

        let mut command = std::process::Command::new(path);
        command.args(args);

        run_command(command)
    }
}

/// Run a query command, log its results and check the exit status
///
/// Returns the captured stdout. Execution failures and non-zero exit
/// codes are reported as [TapeAlertError::Query].
pub fn query_command<R: CommandRunner + ?Sized>(
    runner: &R,
    log: &RunLog,
    cmd: SystemCommand,
    args: &[&str],
) -> Result<String, TapeAlertError> {
    let cmdline = std::iter::once(cmd.name())
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ");

    fdebug!(log, "{} command: {}", cmd, cmdline);

    let output = runner
        .run(cmd, args)
        .map_err(|err| TapeAlertError::Query(err.to_string()))?;

    log.command_output(&output);

    if let Err(err) = output.check_status(None) {
        fdebug!(log, "ERROR calling: {}", cmdline);
        log.log(output.stderr.trim_end_matches('\n'));
        return Err(TapeAlertError::Query(format!("{} failed - {}", cmdline, err)));
    }

    Ok(output.stdout)
}


#[cfg(test)]
mod test {
    use super::test_runner::FakeRunner;
    use super::*;

    #[test]
    fn test_resolve_commands() {
        let log = RunLog::disabled();
        let search_path = OsStr::new("/bin:/usr/bin");

        let map = CommandMap::resolve_in(&[SystemCommand::Ls], search_path, &log).unwrap();
        assert!(map.path(SystemCommand::Ls).is_some());
        assert!(map.path(SystemCommand::Tapeinfo).is_none());

        match CommandMap::resolve_in(&[SystemCommand::Ls], OsStr::new("/nonexistent"), &log) {
            Err(TapeAlertError::MissingDependency(name)) => assert_eq!(name, "ls"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_system_runner() -> Result<(), Error> {
        let runner = SystemRunner::new(CommandMap::with_paths([(
            SystemCommand::Ls,
            PathBuf::from("/bin/ls"),
        )]));

        let output = runner.run(SystemCommand::Ls, &["-d", "/"])?;
        assert_eq!(output.code, Some(0));
        assert_eq!(output.stdout, "/\n");

        assert!(runner.run(SystemCommand::Tapeinfo, &[]).is_err());

        Ok(())
    }

    #[test]
    fn test_query_command_status() {
        let log = RunLog::disabled();
        let runner = FakeRunner::new()
            .with(SystemCommand::Lsscsi, CommandOutput::success("table\n"))
            .with(SystemCommand::Tapeinfo, CommandOutput::failure(1, "no such device"));

        let stdout = query_command(&runner, &log, SystemCommand::Lsscsi, &["-g"]).unwrap();
        assert_eq!(stdout, "table\n");

        match query_command(&runner, &log, SystemCommand::Tapeinfo, &["-f", "/dev/sg9"]) {
            Err(TapeAlertError::Query(msg)) => {
                assert_eq!(msg, "tapeinfo -f /dev/sg9 failed - status code: 1 - no such device")
            }
            other => panic!("unexpected result {:?}", other),
        }

        // execution failures are query errors too
        assert!(matches!(
            query_command(&runner, &log, SystemCommand::Ls, &["-l", "/dev/nst0"]),
            Err(TapeAlertError::Query(_))
        ));

        assert_eq!(
            *runner.calls.borrow(),
            vec!["lsscsi -g", "tapeinfo -f /dev/sg9", "ls -l /dev/nst0"]
        );
    }
}
