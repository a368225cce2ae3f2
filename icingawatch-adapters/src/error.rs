//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when talking to upstream APIs.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The server stayed unreachable after every retry.
    #[error("{target} unavailable after {attempts} attempts")]
    Unavailable {
        /// URL that was requested.
        target: String,
        /// Total attempts made, including the first one.
        attempts: u32,
    },

    /// Connection refused or host unreachable. Retried by [`crate::RetryPolicy`].
    #[error("Connection failed: {0}")]
    Connection(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Client certificate, key or CA could not be loaded.
    #[error("Certificate error: {0}")]
    Certificate(String),
}

impl AdapterError {
    /// Whether this error is worth retrying after a delay.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdapterError::Connection(_))
    }
}

#[cfg(any(feature = "icinga", feature = "pihole"))]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() && is_unreachable(&err) {
            AdapterError::Connection(err.to_string())
        } else if err.is_decode() {
            AdapterError::Parse(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

/// Whether the error chain bottoms out in a refused or unreachable socket.
///
/// Connect-stage failures against a reachable server (TLS handshake, wrong
/// protocol) are not included.
#[cfg_attr(not(any(feature = "icinga", feature = "pihole")), allow(dead_code))]
pub(crate) fn is_unreachable(err: &(dyn std::error::Error + 'static)) -> bool {
    use std::io::ErrorKind;

    let mut source = Some(err);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                ErrorKind::ConnectionRefused
                    | ErrorKind::HostUnreachable
                    | ErrorKind::NetworkUnreachable
            );
        }
        source = err.source();
    }
    false
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connection_errors_retry() {
        assert!(AdapterError::Connection("refused".into()).is_retryable());
        assert!(!AdapterError::Parse("eof".into()).is_retryable());
        assert!(!AdapterError::Timeout.is_retryable());
        assert!(!AdapterError::Unavailable {
            target: "x".into(),
            attempts: 31
        }
        .is_retryable());
    }

    #[test]
    fn unavailable_message_names_target() {
        let err = AdapterError::Unavailable {
            target: "https://icinga:5665/v1/status".into(),
            attempts: 31,
        };
        assert_eq!(
            err.to_string(),
            "https://icinga:5665/v1/status unavailable after 31 attempts"
        );
    }

    #[derive(Debug, Error)]
    #[error("connect failed")]
    struct Wrapped(#[source] std::io::Error);

    #[test]
    fn refused_and_unreachable_sockets_are_unreachable() {
        use std::io::{Error as IoError, ErrorKind};

        for kind in [
            ErrorKind::ConnectionRefused,
            ErrorKind::HostUnreachable,
            ErrorKind::NetworkUnreachable,
        ] {
            assert!(is_unreachable(&Wrapped(IoError::from(kind))), "{:?}", kind);
        }
    }

    #[test]
    fn handshake_failures_are_not_unreachable() {
        use std::io::{Error as IoError, ErrorKind};

        let tls = Wrapped(IoError::new(ErrorKind::InvalidData, "corrupt message"));
        assert!(!is_unreachable(&tls));
        assert!(!is_unreachable(&Wrapped(IoError::from(ErrorKind::ConnectionReset))));

        let no_io = AdapterError::Http("x".into());
        assert!(!is_unreachable(&no_io));
    }

    #[test]
    fn json_errors_are_parse_errors() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(matches!(AdapterError::from(err), AdapterError::Parse(_)));
    }
}
