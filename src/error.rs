//! Error taxonomy of a TapeAlert run

/// Errors terminating (or, for notifications, degrading) a run
///
/// None of these are retried. Everything but `Notification` halts the
/// run before any alert is printed.
#[derive(thiserror::Error, Debug)]
pub enum TapeAlertError {
    #[error("required system utility '{0}' not found or not executable")]
    MissingDependency(String),
    #[error("unable to determine control node - {0}")]
    Resolution(String),
    #[error("unsupported platform '{0}' - no control node mapping defined")]
    UnsupportedPlatform(String),
    #[error("drive query failed - {0}")]
    Query(String),
    #[error("unable to send notification - {0}")]
    Notification(String),
    #[error("unable to write alerts - {0}")]
    Output(#[from] std::io::Error),
}
