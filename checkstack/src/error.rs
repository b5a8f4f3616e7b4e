//! Error types for checkstack.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::session::SessionState;

/// Main error type for checkstack operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session (jump host / switch) errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Writing capture artifacts failed
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// Reading operator credentials failed
    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),

    /// Reading the host list failed
    #[error("Host list error: {0}")]
    HostList(#[from] HostListError),

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    /// Whether the error leaves the jump-host transport unusable.
    ///
    /// Such errors abort the whole run regardless of the failure policy.
    pub fn is_transport_fatal(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::Channel(ChannelError::Closed)
                | Error::Channel(ChannelError::Ssh(_))
                | Error::Session(SessionError::ResyncFailed { .. })
        )
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is not known")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Channel layer errors (pattern matching, shell I/O).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern '{pattern}' not found within {timeout:?}")]
    PatternTimeout { pattern: String, timeout: Duration },

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Session layer errors (login state machine, nested switch shell).
#[derive(Error, Debug)]
pub enum SessionError {
    /// An operation needs a ready shell but the session is elsewhere
    #[error("Session not ready (state: {state})")]
    NotReady { state: SessionState },

    /// The switch refused the nested login
    #[error("Login to {host} rejected: {reason}")]
    LoginRejected { host: String, reason: String },

    /// The nested ssh asked to confirm an unknown host key
    #[error("Host key for {host} is unknown to the jump host; rerun with --accept-new-switch-keys")]
    HostKeyConfirmation { host: String },

    /// A switch login was attempted while another switch shell is open
    #[error("Switch session to {host} is still open")]
    NestedSessionActive { host: String },

    /// A switch operation was attempted with no switch shell open
    #[error("No switch session is open")]
    NoNestedSession,

    /// The jump-host shell could not be brought back to its prompt
    #[error("Could not return to the jump-host prompt after failure on {host}")]
    ResyncFailed { host: String },
}

/// Artifact writing errors.
#[derive(Error, Debug)]
#[error("{path}: {source}")]
pub struct CaptureError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl CaptureError {
    pub(crate) fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Operator credential prompt errors.
#[derive(Error, Debug)]
#[error("Failed to read {field}: {source}")]
pub struct CredentialError {
    pub field: &'static str,
    #[source]
    pub source: io::Error,
}

/// Host list file errors.
#[derive(Error, Debug)]
#[error("Cannot read host list {path}: {source}")]
pub struct HostListError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Result type alias using checkstack's Error.
pub type Result<T> = std::result::Result<T, Error>;
