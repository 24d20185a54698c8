// Evsync Error Types
// Failure taxonomy shared by probing, reading and mode switching

/// A valuator or button class could not be built from the probed device.
///
/// This is reported, never fatal: the session keeps running with the
/// classes that could be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("device reports no {0} axes")]
    NoAxes(&'static str),

    #[error("device does not support event type {0:#x}")]
    MissingEventType(u16),
}

/// Outcome of a failed device read
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The device node went away (ENODEV). The session must be torn down.
    #[error("device removed")]
    Removed,

    /// Nothing to read right now (EAGAIN, EINTR). Retry on the next wakeup.
    #[error("no data available")]
    Transient,

    /// Any other read failure. No further reads should be attempted.
    #[error("read error: {0}")]
    Fatal(#[source] std::io::Error),

    /// The read returned a length that is not a whole number of records.
    #[error("partial input_event record ({len} bytes)")]
    PartialRecord { len: usize },
}

impl ReadError {
    /// Classify an I/O error from `read(2)`
    pub fn from_io(err: std::io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::ENODEV) => ReadError::Removed,
            Some(libc::EAGAIN) | Some(libc::EINTR) => ReadError::Transient,
            _ if err.kind() == std::io::ErrorKind::WouldBlock => ReadError::Transient,
            _ => ReadError::Fatal(err),
        }
    }

    /// Whether the caller may read again on the next readiness callback
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReadError::Transient | ReadError::PartialRecord { .. })
    }

    /// Whether the device is gone and the session should be released
    pub fn is_removed(&self) -> bool {
        matches!(self, ReadError::Removed)
    }
}

/// Session registry failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("device {0:#x} is already attached")]
    Duplicate(u64),

    #[error("too many devices attached (limit {0})")]
    Full(usize),

    #[error("no session for device {0:#x}")]
    UnknownSession(u64),
}

/// Errors that can occur when loading configuration or option values
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid device pattern: {0}")]
    InvalidPattern(String),
}

/// A runtime mode switch the device cannot honour
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    #[error("relative-only device cannot switch to absolute mode")]
    BadMode,
}

/// Errors from opening and polling device nodes
#[derive(Debug, thiserror::Error)]
pub enum EventLoopError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
