//! Send/expect exchange with timeout handling.

use std::io::Write;
use std::time::Duration;

use log::{debug, trace};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::buffer::PatternBuffer;
use super::shell::ShellIo;
use crate::error::{ChannelError, Result};

/// Configuration for expect behavior.
#[derive(Debug, Clone)]
pub struct ExpectConfig {
    /// Time allowed for each expected pattern to appear.
    pub timeout: Duration,

    /// Search depth for pattern matching.
    pub search_depth: usize,

    /// Copy all session traffic to stdout. Passwords are included.
    pub echo: bool,
}

impl Default for ExpectConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            search_depth: 1000,
            echo: false,
        }
    }
}

/// Output captured by a successful `expect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// Everything received between the previous match and this one.
    pub before: String,

    /// The text the pattern matched.
    pub matched: String,
}

impl Expectation {
    /// The unterminated last line of the captured output, i.e. the text
    /// on the same line as the match.
    pub fn last_line(&self) -> &str {
        let start = memchr::memrchr(b'\n', self.before.as_bytes()).map_or(0, |i| i + 1);
        self.before[start..].trim_end_matches('\r')
    }
}

/// Expect-style driver over a [`ShellIo`].
///
/// Each `expect` blocks until one of its patterns shows up in the tail of
/// the received output or the configured timeout elapses.
pub struct ExpectChannel<S> {
    io: S,
    buffer: PatternBuffer,
    config: ExpectConfig,
}

impl<S: ShellIo> ExpectChannel<S> {
    /// Wrap a shell with the given configuration.
    pub fn new(io: S, config: ExpectConfig) -> Self {
        Self {
            io,
            buffer: PatternBuffer::new(config.search_depth),
            config,
        }
    }

    /// Send a line of input.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        debug!("send: {:?}", line);
        self.write(format!("{}\n", line).as_bytes()).await
    }

    /// Send a secret followed by a newline. The secret is never logged.
    pub async fn send_secret(&mut self, secret: &SecretString) -> Result<()> {
        debug!("send: <hidden>");
        let mut line = secret.expose_secret().as_bytes().to_vec();
        line.push(b'\n');
        self.write(&line).await
    }

    /// Send raw bytes, e.g. a control character.
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        debug!("send raw: {:?}", data);
        self.write(data).await
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.config.echo {
            echo(data);
        }
        self.io.write_all(data).await
    }

    /// Wait for `pattern` and return the output that preceded it.
    pub async fn expect(&mut self, pattern: &Regex) -> Result<Expectation> {
        self.expect_any(&[pattern]).await.map(|(_, found)| found)
    }

    /// Wait for whichever of `patterns` appears first.
    ///
    /// Returns the index of the matching pattern with the captured output.
    /// Output received after the match is kept for the next call.
    pub async fn expect_any(&mut self, patterns: &[&Regex]) -> Result<(usize, Expectation)> {
        let timeout = self.config.timeout;
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some((index, range)) = self.buffer.search_tail_any(patterns) {
                let (before, matched) = self.buffer.consume_through(range);
                let found = Expectation {
                    before: String::from_utf8_lossy(&before).into_owned(),
                    matched: String::from_utf8_lossy(&matched).into_owned(),
                };
                debug!(
                    "matched {:?} after {} bytes",
                    patterns[index].as_str(),
                    found.before.len()
                );
                return Ok((index, found));
            }

            let chunk = match tokio::time::timeout_at(deadline, self.io.read_chunk()).await {
                Ok(chunk) => chunk?,
                Err(_) => {
                    let pattern = patterns
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(" | ");
                    debug!(
                        "timed out waiting for {:?}; buffer tail: {:?}",
                        pattern,
                        String::from_utf8_lossy(self.tail())
                    );
                    return Err(ChannelError::PatternTimeout { pattern, timeout }.into());
                }
            };

            let Some(chunk) = chunk else {
                return Err(ChannelError::Closed.into());
            };

            trace!("recv chunk: {} bytes", chunk.len());
            if self.config.echo {
                echo(&chunk);
            }
            self.buffer.extend(&chunk);
        }
    }

    /// Drop any output received but not yet matched.
    pub fn discard_pending(&mut self) {
        let dropped = self.buffer.take();
        if !dropped.is_empty() {
            trace!("discarding {} pending bytes", dropped.len());
        }
    }

    fn tail(&self) -> &[u8] {
        let data = self.buffer.as_slice();
        &data[data.len().saturating_sub(200)..]
    }

    /// Get a mutable reference to the underlying shell.
    pub fn io_mut(&mut self) -> &mut S {
        &mut self.io
    }
}

fn echo(data: &[u8]) {
    let mut stdout = std::io::stdout().lock();
    // Echo is best effort; a closed stdout must not break the session
    let _ = stdout.write_all(data);
    let _ = stdout.flush();
}
