//! SSH transport layer wrapping russh.
//!
//! This module provides the connection to the jump host: connection setup,
//! authentication, host key checks and the PTY shell the sessions run in.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, JumpHostConfig};
pub use ssh::{SshShell, SshTransport};
