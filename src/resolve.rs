//! Map a tape device path to the generic SCSI control node
//!
//! `tapeinfo` talks SCSI directly, so it needs the pass-through node
//! of a drive (`/dev/sg*` on Linux, `/dev/pass*` on FreeBSD) instead of
//! the sequential access device Bacula is configured with.

use std::fmt;

use crate::commands::{query_command, CommandRunner, SystemCommand};
use crate::error::TapeAlertError;
use crate::platform::PlatformKind;
use crate::run_log::RunLog;
use crate::{fdebug, flog};

lazy_static::lazy_static! {
    static ref SCSI_GENERIC_NODE_REGEX: regex::Regex =
        regex::Regex::new(r"^/dev/sg\d+$").unwrap();
    static ref LINK_TARGET_TAPE_REGEX: regex::Regex =
        regex::Regex::new(r"->\s+(?:\S*/)?n*(st\d+)").unwrap();
    static ref FREEBSD_SA_DEVICE_REGEX: regex::Regex =
        regex::Regex::new(r"^(?:/dev/)?[ne]?(sa\d+)$").unwrap();
    static ref FREEBSD_PASS_NODE_REGEX: regex::Regex =
        regex::Regex::new(r"^pass\d+$").unwrap();
}

/// Resolved control node
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlNode {
    path: String,
    unverified: bool,
}

impl ControlNode {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: path.into(),
            unverified: false,
        }
    }

    /// A node passed in by the caller, which we cannot cross-check
    pub fn unverified<S: Into<String>>(path: S) -> Self {
        Self {
            path: path.into(),
            unverified: true,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_unverified(&self) -> bool {
        self.unverified
    }
}

impl fmt::Display for ControlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Normalize a linux st/nst device to its rewinding form
///
/// `/dev/nst0` and `/dev/st0` both map to `/dev/st0`.
pub fn canonical_tape_name(device: &str) -> Option<String> {
    let start = device.rfind("/dev/")?;
    let name = &device[start + 5..];
    let name = name.strip_prefix('n').unwrap_or(name);

    if !name.starts_with("st") {
        return None;
    }

    Some(format!("/dev/{}", name))
}

/// Extract the st device from `ls -l` output of a by-id/by-path link
///
/// ```text
/// lrwxrwxrwx 1 root root 9 Aug  8 10:00 /dev/tape/by-id/scsi-35000e11167f7b001-nst -> ../../nst0
/// ```
pub fn link_target_tape_name(listing: &str) -> Option<String> {
    LINK_TARGET_TAPE_REGEX
        .captures(listing)
        .map(|cap| format!("/dev/{}", &cap[1]))
}

/// Find the generic SCSI node for `tape_name` in `lsscsi -g` output
///
/// ```text
/// [0:0:0:0]    tape    IBM      ULTRIUM-HH5      E6R3  /dev/st0   /dev/sg0
/// ```
///
/// The first matching row wins.
pub fn find_lsscsi_generic_node(table: &str, tape_name: &str) -> Option<String> {
    for line in table.lines() {
        let mut columns = line.split_whitespace();

        let found = columns
            .clone()
            .any(|column| canonical_tape_name(column).as_deref() == Some(tape_name));
        if !found {
            continue;
        }

        if let Some(node) = columns.find(|column| SCSI_GENERIC_NODE_REGEX.is_match(column)) {
            return Some(node.to_string());
        }
    }
    None
}

/// Strip `/dev/` and the non-rewind/eject prefix from a FreeBSD sa device
pub fn freebsd_sa_name(device: &str) -> Option<String> {
    FREEBSD_SA_DEVICE_REGEX
        .captures(device)
        .map(|cap| cap[1].to_string())
}

/// Find the pass node paired with `sa_name` in `camcontrol devlist` output
///
/// ```text
/// <HP Ultrium 5-SCSI Z6ED>           at scbus1 target 0 lun 0 (pass3,sa0)
/// ```
///
/// The first matching row wins.
pub fn find_camcontrol_pass_node(table: &str, sa_name: &str) -> Option<String> {
    for line in table.lines() {
        let start = match line.rfind('(') {
            Some(start) => start + 1,
            None => continue,
        };
        let end = match line[start..].find(')') {
            Some(end) => start + end,
            None => continue,
        };

        let mut periphs = line[start..end].split(',').map(str::trim);
        if !periphs.clone().any(|periph| periph == sa_name) {
            continue;
        }
        if let Some(pass) = periphs.find(|periph| FREEBSD_PASS_NODE_REGEX.is_match(periph)) {
            return Some(format!("/dev/{}", pass));
        }
    }
    None
}

fn check_device(device: &str) -> Result<&str, TapeAlertError> {
    if device.is_empty() {
        return Err(TapeAlertError::Resolution(String::from(
            "empty drive device path",
        )));
    }
    Ok(device)
}

/// Determines the control node of a tape drive
pub struct DeviceNodeResolver<'a, R: ?Sized> {
    runner: &'a R,
    log: &'a RunLog,
}

impl<'a, R: CommandRunner + ?Sized> DeviceNodeResolver<'a, R> {
    pub fn new(runner: &'a R, log: &'a RunLog) -> Self {
        Self { runner, log }
    }

    pub fn resolve(
        &self,
        device: &str,
        platform: &PlatformKind,
    ) -> Result<ControlNode, TapeAlertError> {
        flog!(
            self.log,
            "Determining the tape drive device's sg node required by tapeinfo"
        );

        match platform {
            PlatformKind::Linux => self.resolve_linux(check_device(device)?),
            PlatformKind::FreeBsd => self.resolve_freebsd(check_device(device)?),
            PlatformKind::Other(name) => {
                flog!(
                    self.log,
                    "Failed to identify an sg node device for drive device {}",
                    device
                );
                Err(TapeAlertError::UnsupportedPlatform(name.clone()))
            }
        }
    }

    fn resolve_linux(&self, device: &str) -> Result<ControlNode, TapeAlertError> {
        // also makes sure the device exists
        let listing = query_command(self.runner, self.log, SystemCommand::Ls, &["-l", device])?;

        if device.contains("/dev/sg") {
            flog!(self.log, "NOTE: A /dev/sg node was passed to this program");
            flog!(
                self.log,
                "      Be aware that this may not be the correct sg node for the drive being tested"
            );
            flog!(
                self.log,
                "      It is recommended to pass the same node set for the 'ArchiveDevice'"
            );
            return Ok(ControlNode::unverified(device));
        }

        let tape_name = if device.contains("/dev/st") || device.contains("/dev/nst") {
            canonical_tape_name(device).ok_or_else(|| {
                TapeAlertError::Resolution(format!("unable to parse tape device '{}'", device))
            })?
        } else if device.contains("/by-id") || device.contains("/by-path") {
            link_target_tape_name(&listing).ok_or_else(|| {
                TapeAlertError::Resolution(format!(
                    "link '{}' does not point to a st/nst tape device",
                    device
                ))
            })?
        } else {
            return Err(TapeAlertError::Resolution(format!(
                "'{}' is neither a sg, st/nst nor a by-id/by-path tape device",
                device
            )));
        };

        fdebug!(self.log, "canonical tape device: {}", tape_name);

        let table = query_command(self.runner, self.log, SystemCommand::Lsscsi, &["-g"])?;

        match find_lsscsi_generic_node(&table, &tape_name) {
            Some(node) => {
                flog!(self.log, "sg node determined for drive device: {}", node);
                Ok(ControlNode::new(node))
            }
            None => Err(TapeAlertError::Resolution(format!(
                "no sg node listed for '{}' in lsscsi output",
                tape_name
            ))),
        }
    }

    fn resolve_freebsd(&self, device: &str) -> Result<ControlNode, TapeAlertError> {
        let sa_name = freebsd_sa_name(device).ok_or_else(|| {
            TapeAlertError::Resolution(format!("'{}' is not a sa tape device", device))
        })?;

        let table = query_command(
            self.runner,
            self.log,
            SystemCommand::Camcontrol,
            &["devlist"],
        )?;

        match find_camcontrol_pass_node(&table, &sa_name) {
            Some(node) => {
                flog!(self.log, "SG node for drive device: {} --> {}", device, node);
                Ok(ControlNode::new(node))
            }
            None => Err(TapeAlertError::Resolution(format!(
                "no pass node listed for '{}' in camcontrol output",
                sa_name
            ))),
        }
    }
}
