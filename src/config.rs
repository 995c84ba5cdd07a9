//! Run configuration
//!
//! Built once from the command line parameters and passed explicitly to
//! everything that needs it.

use std::path::PathBuf;

use anyhow::Error;
use serde_json::Value;

use tapealert_buildcfg::{DEFAULT_SMTP_PORT, DEFAULT_SMTP_SERVER, TAPEALERT_LOG_FN};
use tapealert_tools::json::{
    bool_param, optional_string_param, optional_u16_param, required_string_param,
};

/// Mail relay settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: String::from(DEFAULT_SMTP_SERVER),
            port: DEFAULT_SMTP_PORT,
            user: String::new(),
            password: String::new(),
        }
    }
}

impl SmtpConfig {
    /// Credentials, only if both user and password are set
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.user.is_empty() || self.password.is_empty() {
            None
        } else {
            Some((&self.user, &self.password))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Drive device as configured in the Bacula `ArchiveDevice`
    pub device: String,
    pub debug: bool,
    pub logging: bool,
    /// Parse the built-in tapeinfo fixture instead of querying a drive
    pub test: bool,
    pub log_file: PathBuf,
    pub jobid: Option<String>,
    pub email: Option<String>,
    pub smtp: SmtpConfig,
}

impl RunConfig {
    pub fn new<S: Into<String>>(device: S) -> Self {
        Self {
            device: device.into(),
            debug: false,
            logging: false,
            test: false,
            log_file: PathBuf::from(TAPEALERT_LOG_FN),
            jobid: None,
            email: None,
            smtp: SmtpConfig::default(),
        }
    }

    /// Build the configuration from parsed command line parameters
    pub fn from_cli_param(param: &Value) -> Result<Self, Error> {
        let mut config = Self::new(required_string_param(param, "drive-device")?);

        config.debug = bool_param(param, "debug", false);
        config.logging = bool_param(param, "logging", false);
        config.test = bool_param(param, "test", false);

        if let Some(file) = optional_string_param(param, "file") {
            config.log_file = PathBuf::from(file);
        }
        config.jobid = optional_string_param(param, "jobid").map(String::from);
        config.email = optional_string_param(param, "email").map(String::from);

        if let Some(server) = optional_string_param(param, "smtp-server") {
            config.smtp.server = server.to_string();
        }
        if let Some(port) = optional_u16_param(param, "smtp-port")? {
            config.smtp.port = port;
        }
        if let Some(user) = optional_string_param(param, "smtp-user") {
            config.smtp.user = user.to_string();
        }
        if let Some(password) = optional_string_param(param, "smtp-pass") {
            config.smtp.password = password.to_string();
        }

        Ok(config)
    }

    /// Debug mode implies logging
    pub fn logging_enabled(&self) -> bool {
        self.logging || self.debug
    }

    /// The notification address, if it looks like one
    pub fn email_recipient(&self) -> Option<&str> {
        self.email.as_deref().filter(|email| email.contains('@'))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() -> Result<(), Error> {
        let config = RunConfig::from_cli_param(&json!({ "drive-device": "/dev/nst0" }))?;

        assert_eq!(config, RunConfig::new("/dev/nst0"));
        assert_eq!(config.log_file, PathBuf::from("/opt/bacula/log/bacula-tapealert.log"));
        assert!(!config.logging_enabled());
        assert_eq!(config.email_recipient(), None);
        assert_eq!(config.smtp.server, "localhost");
        assert_eq!(config.smtp.port, 25);
        assert_eq!(config.smtp.credentials(), None);

        assert!(RunConfig::from_cli_param(&json!({})).is_err());

        Ok(())
    }

    #[test]
    fn test_cli_param() -> Result<(), Error> {
        let config = RunConfig::from_cli_param(&json!({
            "drive-device": "/dev/tape/by-id/scsi-35000e11167f7b001-nst",
            "debug": true,
            "test": true,
            "file": "/tmp/tapealert.log",
            "jobid": "1234",
            "email": "admin@example.com",
            "smtp-server": "mail.example.com",
            "smtp-port": "587",
            "smtp-user": "bacula",
            "smtp-pass": "secret",
        }))?;

        assert!(config.debug && config.test && !config.logging);
        assert!(config.logging_enabled());
        assert_eq!(config.log_file, PathBuf::from("/tmp/tapealert.log"));
        assert_eq!(config.jobid.as_deref(), Some("1234"));
        assert_eq!(config.email_recipient(), Some("admin@example.com"));
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.credentials(), Some(("bacula", "secret")));

        Ok(())
    }

    #[test]
    fn test_email_check() {
        let mut config = RunConfig::new("/dev/nst0");
        config.email = Some(String::from("root"));
        assert_eq!(config.email_recipient(), None);

        // credentials need both parts
        config.smtp.user = String::from("bacula");
        assert_eq!(config.smtp.credentials(), None);
    }
}
