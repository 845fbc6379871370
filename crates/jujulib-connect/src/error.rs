//! Error types for the jujulib-connect crate

use jujulib_wire::{RemoteError, TagError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The transport is not ready; the request was dropped without consuming an id.
    #[error("not connected to the controller")]
    NotConnected,

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    /// The connection went away while the request was pending.
    #[error("connection to the controller closed")]
    TransportClosed,

    #[error("request {0} was cancelled")]
    Cancelled(u64),

    /// Top-level `error` field of a response.
    #[error("{0}")]
    Remote(RemoteError),

    /// The response shape does not match the request.
    #[error("unexpected results: {0}")]
    UnexpectedResults(String),

    #[error("malformed {method} response: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A frame carried a known `request-id` but could not be read.
    #[error("malformed response to request {id}: {source}")]
    MalformedFrame {
        id: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("facade {facade} does not support any of versions {versions:?}")]
    FacadeNotSupported {
        facade: &'static str,
        versions: &'static [u32],
    },

    #[error("called without credentials")]
    MissingCredentials,

    #[error("a login is already in progress")]
    LoginInProgress,

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("macaroon discharge failed: {0}")]
    Discharge(String),

    #[error("invalid tag: {0}")]
    Tag(#[from] TagError),
}

/// Coarse classification used by callers to decide on recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The transport dropped or refused the request
    TransportUnavailable,
    /// The controller answered with an error
    Protocol,
    /// The controller answered with something that does not fit the request
    Consistency,
    /// Login or discharge failed
    Authentication,
    /// The call was invalid before anything was sent
    Usage,
    /// A frame could not be encoded or decoded
    Codec,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::NotConnected
            | ClientError::WebSocket(_)
            | ClientError::TransportClosed
            | ClientError::Cancelled(_) => ErrorKind::TransportUnavailable,
            ClientError::Remote(_) => ErrorKind::Protocol,
            ClientError::UnexpectedResults(_) => ErrorKind::Consistency,
            ClientError::Authentication(_) | ClientError::Discharge(_) => {
                ErrorKind::Authentication
            }
            ClientError::FacadeNotSupported { .. }
            | ClientError::MissingCredentials
            | ClientError::LoginInProgress
            | ClientError::Tag(_) => ErrorKind::Usage,
            ClientError::Decode { .. }
            | ClientError::MalformedFrame { .. }
            | ClientError::Encode(_) => ErrorKind::Codec,
        }
    }

    /// The message as the controller phrased it, for protocol errors.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            ClientError::Remote(err) => Some(&err.message),
            _ => None,
        }
    }
}

impl From<RemoteError> for ClientError {
    fn from(err: RemoteError) -> Self {
        ClientError::Remote(err)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::WebSocket(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ClientError::Remote(RemoteError::new("bad wolf")).to_string(),
            "bad wolf"
        );
        assert_eq!(
            ClientError::UnexpectedResults("[]".to_string()).to_string(),
            "unexpected results: []"
        );
        assert_eq!(
            ClientError::MissingCredentials.to_string(),
            "called without credentials"
        );
        assert_eq!(
            ClientError::Authentication("use a proper Juju 2 release".to_string()).to_string(),
            "authentication failed: use a proper Juju 2 release"
        );
        assert_eq!(
            ClientError::Discharge("bad wolf".to_string()).to_string(),
            "macaroon discharge failed: bad wolf"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ClientError::NotConnected.kind(),
            ErrorKind::TransportUnavailable
        );
        assert_eq!(
            ClientError::Remote(RemoteError::new("x")).kind(),
            ErrorKind::Protocol
        );
        assert_eq!(
            ClientError::UnexpectedResults("[]".into()).kind(),
            ErrorKind::Consistency
        );
        assert_eq!(
            ClientError::Discharge("x".into()).kind(),
            ErrorKind::Authentication
        );
        assert_eq!(ClientError::LoginInProgress.kind(), ErrorKind::Usage);
    }

    #[test]
    fn test_remote_message() {
        let err = ClientError::from(RemoteError::new("bad wolf"));
        assert_eq!(err.remote_message(), Some("bad wolf"));
        assert_eq!(ClientError::TransportClosed.remote_message(), None);
    }
}
