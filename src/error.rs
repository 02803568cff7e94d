//! Error types module.
//!
//! This module defines the error types used throughout dnsck.
//! It uses `thiserror` for structured error handling and provides
//! a custom `Result` type alias for convenience.

use thiserror::Error;
use trust_dns_resolver::proto::error::ProtoError;

/// A specialized `Result` type for dnsck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for dnsck.
///
/// Setup variants (`UnknownRecordType`, `InvalidDomain`, `InvalidServer`,
/// `Config`) are fatal and abort a run before the first query. `Timeout` and
/// the transport variants are recorded per iteration by the probe loop.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (config files, sockets, report output)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (config files, JSON report)
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// DNS wire format error (encoding a query, decoding a reply)
    #[error("DNS protocol error: {0}")]
    Proto(#[from] ProtoError),

    /// Record type string is not a known resource record type
    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),

    /// Domain could not be turned into a DNS name
    #[error("Invalid domain name: {0}")]
    InvalidDomain(String),

    /// Server is not an IPv4 or IPv6 literal
    #[error("Invalid IP address: {0}")]
    InvalidServer(String),

    /// Network-related error other than a timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration error (invalid config, missing files)
    #[error("Config error: {0}")]
    Config(String),

    /// Parse error (invalid input format, malformed data)
    #[error("Parse error: {0}")]
    Parse(String),

    /// No reply within the query timeout
    #[error("Operation timed out")]
    Timeout,
}

impl Error {
    /// Create a new network error with a message.
    #[must_use]
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new configuration error with a message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new parse error with a message.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Process exit status for a fatal error.
    ///
    /// An invalid server literal is a usage error (2); everything else is 1.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidServer(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::InvalidServer("::Z".into()).exit_code(), 2);
        assert_eq!(Error::UnknownRecordType("abc".into()).exit_code(), 1);
        assert_eq!(Error::config("bad").exit_code(), 1);
    }
}
