use std::fmt;

use anyhow::Error;

use crate::commands::SystemCommand;

/// Host operating system family, drives the control node lookup strategy
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformKind {
    Linux,
    FreeBsd,
    /// Any other kernel, carries the reported kernel name
    Other(String),
}

impl PlatformKind {
    /// Map a kernel name as reported by `uname -s`
    pub fn from_kernel_name(name: &str) -> Self {
        match name.trim() {
            "Linux" => PlatformKind::Linux,
            "FreeBSD" => PlatformKind::FreeBsd,
            other => PlatformKind::Other(other.to_string()),
        }
    }

    /// Detect the platform of the running host
    pub fn detect() -> Result<Self, Error> {
        let uts = nix::sys::utsname::uname()?;
        Ok(Self::from_kernel_name(&uts.sysname().to_string_lossy()))
    }

    /// System utilities needed to resolve and query a drive
    pub fn required_commands(&self) -> &'static [SystemCommand] {
        match self {
            PlatformKind::Linux => &[
                SystemCommand::Ls,
                SystemCommand::Lsscsi,
                SystemCommand::Tapeinfo,
            ],
            PlatformKind::FreeBsd => &[SystemCommand::Camcontrol, SystemCommand::Tapeinfo],
            PlatformKind::Other(_) => &[],
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformKind::Linux => f.write_str("Linux"),
            PlatformKind::FreeBsd => f.write_str("FreeBSD"),
            PlatformKind::Other(name) => f.write_str(name),
        }
    }
}
