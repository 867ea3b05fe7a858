use thiserror::Error;

/// Why a consumer could not process a delivered event.
///
/// These never abort emulation: the notifier logs the failure and reports
/// [`HookStatus::Failed`](crate::HookStatus::Failed) to the emulator core,
/// which decides what to do with it.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The consumer inspected the event and refused it.
    #[error("event rejected: {0}")]
    Rejected(String),
    /// The analysis controller behind the sink is no longer reachable.
    #[error("controller unavailable: {0}")]
    ControllerUnavailable(String),
    /// A consumer writing events out hit an I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SinkError>;
