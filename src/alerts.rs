//! TapeAlert collection
//!
//! `tapeinfo` prints a lot of informational fields; every active
//! TapeAlert flag shows up as a line like:
//!
//! ```text
//! TapeAlert[13]:  Snapped Tape: The data cartridge contains a broken tape.
//! ```

use std::fmt;

use anyhow::{bail, Error};

use crate::commands::{query_command, CommandRunner, SystemCommand};
use crate::error::TapeAlertError;
use crate::resolve::ControlNode;
use crate::run_log::RunLog;
use crate::{fdebug, flog};

lazy_static::lazy_static! {
    static ref TAPE_ALERT_REGEX: regex::Regex =
        regex::Regex::new(r"TapeAlert\[(\d+)\]:[ \t]+(.*)").unwrap();
}

/// Highest flag number defined by the TapeAlert standard
pub const MAX_TAPE_ALERT_CODE: u8 = 64;

/// `tapeinfo` output used in test mode instead of querying a drive
pub const TEST_TAPEINFO_OUTPUT: &str = r###"
Product Type: Tape Drive
Vendor ID: 'STK     '
Product ID: 'T10000B         '
Revision: '0107'
Attached Changer API: No
SerialNumber: 'XYZZY_B1  '
TapeAlert[1]:          Read: Having problems reading (slowing down).
TapeAlert[2]:         Write: Having problems writing (losing capacity).
TapeAlert[3]:    Hard Error: Uncorrectable read/write error.
TapeAlert[5]:  Read Failure: Tape faulty or tape drive broken.
TapeAlert[13]:  Snapped Tape: The data cartridge contains a broken tape.
TapeAlert[20]:     Clean Now: The tape drive needs cleaning NOW.
TapeAlert[21]: Clean Periodic:The tape drive needs to be cleaned at next opportunity.
MinBlock: 1
MaxBlock: 2097152
SCSI ID: 9
SCSI LUN: 0
Ready: yes
BufferedMode: yes
Medium Type: 0x58
Density Code: 0x58
BlockSize: 0
DataCompEnabled: yes
DataCompCapable: yes
DataDeCompEnabled: yes
CompType: 0xff
DeCompType: 0xff
"###;

/// One active TapeAlert flag
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertRecord {
    code: u8,
    description: String,
}

impl AlertRecord {
    pub fn new<S: Into<String>>(code: u8, description: S) -> Result<Self, Error> {
        if code == 0 || code > MAX_TAPE_ALERT_CODE {
            bail!("TapeAlert code {} out of range (1-{})", code, MAX_TAPE_ALERT_CODE);
        }
        Ok(Self {
            code,
            description: description.into(),
        })
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The `TapeAlert[<code>]` token the storage daemon looks for
    pub fn token(&self) -> String {
        format!("TapeAlert[{}]", self.code)
    }
}

impl fmt::Display for AlertRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TapeAlert[{}]: {}", self.code, self.description)
    }
}

/// Extract all TapeAlert lines from `tapeinfo` output, in input order
///
/// Lines without TapeAlert are ignored, so an empty result is fine. A
/// flag number outside of 1-64 is treated as garbled output.
pub fn parse_tapeinfo_alerts(text: &str) -> Result<Vec<AlertRecord>, Error> {
    let mut list = Vec::new();

    for cap in TAPE_ALERT_REGEX.captures_iter(text) {
        let code = match cap[1].parse::<u8>() {
            Ok(code) => code,
            Err(_) => bail!("unable to parse TapeAlert code '{}'", &cap[1]),
        };
        list.push(AlertRecord::new(code, cap[2].trim())?);
    }

    Ok(list)
}

/// Queries a drive for active TapeAlert flags
pub struct AlertCollector<'a, R: ?Sized> {
    runner: &'a R,
    log: &'a RunLog,
    test_mode: bool,
}

impl<'a, R: CommandRunner + ?Sized> AlertCollector<'a, R> {
    pub fn new(runner: &'a R, log: &'a RunLog) -> Self {
        Self {
            runner,
            log,
            test_mode: false,
        }
    }

    /// Parse [TEST_TAPEINFO_OUTPUT] instead of calling `tapeinfo`
    pub fn test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Run `tapeinfo -f <node>` and return the active alerts
    ///
    /// In test mode `node` is ignored.
    pub fn collect(&self, node: &ControlNode) -> Result<Vec<AlertRecord>, TapeAlertError> {
        if self.test_mode {
            fdebug!(self.log, "test mode - ignoring control node {}", node);
            return collect_test_alerts();
        }

        flog!(self.log, "Calling tapeinfo to check drive for TapeAlerts");

        let output = query_command(
            self.runner,
            self.log,
            SystemCommand::Tapeinfo,
            &["-f", node.path()],
        )?;

        parse_tapeinfo_alerts(&output)
            .map_err(|err| TapeAlertError::Query(format!("tapeinfo output - {}", err)))
    }
}

/// Alerts of the embedded test fixture
pub fn collect_test_alerts() -> Result<Vec<AlertRecord>, TapeAlertError> {
    parse_tapeinfo_alerts(TEST_TAPEINFO_OUTPUT)
        .map_err(|err| TapeAlertError::Query(format!("test fixture - {}", err)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commands::test_runner::FakeRunner;
    use tapealert_tools::CommandOutput;

    fn codes(list: &[AlertRecord]) -> Vec<u8> {
        list.iter().map(AlertRecord::code).collect()
    }

    #[test]
    fn test_parse_fixture() -> Result<(), Error> {
        let list = parse_tapeinfo_alerts(TEST_TAPEINFO_OUTPUT)?;

        assert_eq!(codes(&list), vec![1, 2, 3, 5, 13, 20, 21]);
        assert_eq!(
            list[4].description(),
            "Snapped Tape: The data cartridge contains a broken tape."
        );
        assert_eq!(
            list[6].description(),
            "Clean Periodic:The tape drive needs to be cleaned at next opportunity."
        );
        assert_eq!(list[4].token(), "TapeAlert[13]");

        Ok(())
    }

    #[test]
    fn test_parse_keeps_input_order() -> Result<(), Error> {
        let output = "Vendor ID: 'HP      '\n\
                      TapeAlert[20]: Clean Now: The tape drive needs cleaning NOW.   \n\
                      Ready: yes\n\
                      TapeAlert[3]:\tHard Error: Uncorrectable read/write error.\r\n";

        let list = parse_tapeinfo_alerts(output)?;
        assert_eq!(
            list,
            vec![
                AlertRecord::new(20, "Clean Now: The tape drive needs cleaning NOW.")?,
                AlertRecord::new(3, "Hard Error: Uncorrectable read/write error.")?,
            ]
        );
        assert_eq!(
            list[0].to_string(),
            "TapeAlert[20]: Clean Now: The tape drive needs cleaning NOW."
        );

        Ok(())
    }

    #[test]
    fn test_parse_without_alerts() -> Result<(), Error> {
        let output = "Product Type: Tape Drive\nTapeAlert: none\nTapeAlert[4]:missing blank\n";
        assert!(parse_tapeinfo_alerts(output)?.is_empty());
        assert!(parse_tapeinfo_alerts("")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_garbled_code() {
        assert!(parse_tapeinfo_alerts("TapeAlert[0]: zero").is_err());
        assert!(parse_tapeinfo_alerts("TapeAlert[65]: too big").is_err());
        assert!(parse_tapeinfo_alerts("TapeAlert[99999]: overflow").is_err());
        assert!(AlertRecord::new(64, "last").is_ok());
    }

    #[test]
    fn test_collect() {
        let log = RunLog::disabled();
        let node = ControlNode::new("/dev/sg1");

        let runner = FakeRunner::new().with(
            SystemCommand::Tapeinfo,
            CommandOutput::success("Ready: yes\nTapeAlert[20]:     Clean Now: The tape drive needs cleaning NOW.\n"),
        );
        let list = AlertCollector::new(&runner, &log).collect(&node).unwrap();
        assert_eq!(codes(&list), vec![20]);
        assert_eq!(*runner.calls.borrow(), vec!["tapeinfo -f /dev/sg1"]);

        let failing = FakeRunner::new().with(
            SystemCommand::Tapeinfo,
            CommandOutput::failure(1, "mtx: Request Sense: Long Report=yes"),
        );
        assert!(matches!(
            AlertCollector::new(&failing, &log).collect(&node),
            Err(TapeAlertError::Query(_))
        ));
    }

    #[test]
    fn test_collect_test_mode() {
        let log = RunLog::disabled();
        let runner = FakeRunner::new();

        let list = AlertCollector::new(&runner, &log)
            .test_mode(true)
            .collect(&ControlNode::new("/dev/does-not-matter"))
            .unwrap();

        assert_eq!(codes(&list), vec![1, 2, 3, 5, 13, 20, 21]);
        assert!(runner.calls.borrow().is_empty());
    }
}
