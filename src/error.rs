/*!
 * Error types for jujuctl
 */

use jujulib_connect::{ClientError, ErrorKind};
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(String),

    /// Invalid command-line input (bad tag, empty name)
    Usage(String),

    /// I/O error
    Io(io::Error),

    /// The controller did not answer in time
    Timeout { secs: u64 },

    /// Error from the controller client
    Client(ClientError),

    /// Some entities in a bulk call failed; the rest succeeded
    Partial { failed: usize, total: usize },
}

impl CliError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Partial { .. } => EXIT_PARTIAL,
            // A protocol error on an otherwise healthy session is not fatal
            CliError::Client(err) if err.kind() == ErrorKind::Protocol => EXIT_PARTIAL,
            _ => EXIT_FATAL,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            CliError::Config(_) => ErrorCategory::Configuration,
            CliError::Usage(_) => ErrorCategory::Validation,
            CliError::Io(_) => ErrorCategory::IoError,
            CliError::Timeout { .. } => ErrorCategory::Network,
            CliError::Partial { .. } => ErrorCategory::Partial,
            CliError::Client(err) => match err.kind() {
                ErrorKind::TransportUnavailable => ErrorCategory::Network,
                ErrorKind::Protocol => ErrorCategory::Protocol,
                ErrorKind::Consistency => ErrorCategory::Protocol,
                ErrorKind::Authentication => ErrorCategory::Security,
                ErrorKind::Usage => ErrorCategory::Validation,
                ErrorKind::Codec => ErrorCategory::Codec,
            },
        }
    }

    /// A hint printed under the error in human mode
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::Config(_) => {
                Some("set --controller or JUJU_CONTROLLER, or write ~/.config/jujuctl/config.toml")
            }
            CliError::Timeout { .. } => Some("raise request_timeout_secs in the config file"),
            CliError::Client(err) if err.kind() == ErrorKind::Authentication => {
                Some("check --user/--password or JUJU_USER/JUJU_PASSWORD")
            }
            _ => None,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid input
    Validation,
    /// Configuration errors
    Configuration,
    /// Local I/O
    IoError,
    /// Connection and timeout errors
    Network,
    /// The controller rejected or mangled a request
    Protocol,
    /// Authentication/authorization errors
    Security,
    /// Frame encoding/decoding
    Codec,
    /// Per-entity failures in a bulk call
    Partial,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Security => write!(f, "security"),
            ErrorCategory::Codec => write!(f, "codec"),
            ErrorCategory::Partial => write!(f, "partial"),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::Io(err) => write!(f, "I/O error: {}", err),
            CliError::Timeout { secs } => {
                write!(f, "No answer from the controller within {}s", secs)
            }
            CliError::Client(err) => write!(f, "{}", err),
            CliError::Partial { failed, total } => {
                write!(f, "{} of {} operations failed", failed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            CliError::Client(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        CliError::Client(err)
    }
}

impl From<jujulib_wire::TagError> for CliError {
    fn from(err: jujulib_wire::TagError) -> Self {
        CliError::Usage(err.to_string())
    }
}
