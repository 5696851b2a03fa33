//! Error types for report construction
//!
//! Every variant here is fatal to the report being built. Identity lookups
//! (reverse DNS, organization labels) never produce one of these; they
//! degrade to empty strings instead.

use crate::target::AddressFamily;
use thiserror::Error;

/// Result type alias for report operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the mtr report pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Target string is empty, contains a space, or looks like a flag
    #[error("Invalid target: {0:?}")]
    InvalidTarget(String),

    /// Forward DNS produced no addresses for the host
    #[error("Host not found: {0}")]
    HostNotFound(String),

    /// DNS produced addresses, but none of the requested family
    #[error("No {family} address found for {host}")]
    NoAddressOfFamily {
        /// Host that was resolved
        host: String,
        /// Family the caller asked for
        family: AddressFamily,
    },

    /// Automatic family selection found neither a usable IPv6 nor IPv4 address
    #[error("No IP address found for {0}")]
    NoAddressFound(String),

    /// Probe exited with a non-zero status
    #[error("Probe failed ({status}): {stderr}")]
    Process {
        /// Exit status as reported by the OS
        status: String,
        /// Captured standard error, verbatim
        stderr: String,
    },

    /// Cancellation signal fired while the probe was running
    #[error("Canceled: {0}")]
    Canceled(String),

    /// A latency record carried a value that is not an integer
    #[error("Malformed latency value {value:?} on line {line}")]
    Format {
        /// 1-based line number in the raw output
        line: usize,
        /// The offending token
        value: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (spawning the probe, reading captured output)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid target error
    pub fn invalid_target(target: impl Into<String>) -> Self {
        Self::InvalidTarget(target.into())
    }

    /// Create a "host not found" error
    pub fn host_not_found(host: impl Into<String>) -> Self {
        Self::HostNotFound(host.into())
    }

    /// Create a "no address of family" error
    pub fn no_address_of_family(host: impl Into<String>, family: AddressFamily) -> Self {
        Self::NoAddressOfFamily {
            host: host.into(),
            family,
        }
    }

    /// Create a "no address found" error
    pub fn no_address_found(host: impl Into<String>) -> Self {
        Self::NoAddressFound(host.into())
    }

    /// Create a process failure error
    pub fn process(status: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Process {
            status: status.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a cancellation error
    pub fn canceled(reason: impl Into<String>) -> Self {
        Self::Canceled(reason.into())
    }

    /// Create a format error
    pub fn format(line: usize, value: impl Into<String>) -> Self {
        Self::Format {
            line,
            value: value.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
