//! Byte-stream seam between the expect engine and a live shell.

use std::future::Future;

use crate::error::Result;

/// An interactive shell the expect engine can drive.
///
/// The SSH transport implements this for a PTY channel on the jump host;
/// anything else that speaks a line-oriented terminal can be plugged in.
pub trait ShellIo: Send {
    /// Write raw bytes to the shell.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Read the next chunk of output.
    ///
    /// Returns `Ok(None)` once the remote side has closed the shell.
    fn read_chunk(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Tear down the shell and its connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}
