//! Exports configuration data from the build system

pub const TAPEALERT_PKG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION_MAJOR"),
    ".",
    env!("CARGO_PKG_VERSION_MINOR"),
);

/// Human readable program name, used in log banners and mail subjects
pub const PROGRAM_NAME: &str = "Bacula TapeAlert";

/// Name of the installed binary
pub const BINARY_NAME: &str = "bacula-tapealert";

pub const PROGRAM_AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[macro_export]
macro_rules! BACULA_LOG_DIR_M {
    () => {
        "/opt/bacula/log"
    };
}

/// Prepend the bacula log directory to a file name
///
/// #### Example:
/// ```
/// use tapealert_buildcfg::logdir;
/// let log_path = logdir!("/bacula-tapealert.log");
/// assert_eq!(log_path, "/opt/bacula/log/bacula-tapealert.log");
/// ```
#[macro_export]
macro_rules! logdir {
    ($subdir:expr) => {
        concat!($crate::BACULA_LOG_DIR_M!(), $subdir)
    };
}

/// Default run log, appended to when logging is enabled
pub const TAPEALERT_LOG_FN: &str = logdir!("/bacula-tapealert.log");

/// Environment variable controlling the stderr log level
pub const TAPEALERT_LOG_ENV: &str = "TAPEALERT_LOG";

pub const DEFAULT_SMTP_SERVER: &str = "localhost";
pub const DEFAULT_SMTP_PORT: u16 = 25;
