//! Login state machine shared by the jump-host and switch shells.

use std::fmt;

use log::{debug, warn};
use regex::bytes::Regex;
use secrecy::SecretString;

use crate::channel::{ExpectChannel, ShellIo, patterns};
use crate::error::{Result, SessionError};

/// Where a shell session stands in its login sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport is being established.
    Connecting,

    /// Waiting for the password prompt.
    AwaitingPassword,

    /// Password sent, waiting for the shell prompt.
    AwaitingPrompt,

    /// Prompt seen; commands can be sent.
    Ready,

    /// A wait timed out or the login was refused.
    Failed,

    /// The shell has been exited.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::AwaitingPassword => "awaiting password",
            Self::AwaitingPrompt => "awaiting prompt",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Closed => "closed",
        })
    }
}

/// Compiled patterns a login waits on.
#[derive(Debug, Clone)]
pub(crate) struct LoginPatterns {
    pub password: Regex,
    /// Only a prompt still waiting for input; banners may mention passwords.
    pub password_reprompt: Regex,
    pub prompt: Regex,
    pub host_key_confirm: Regex,
    pub refused: Regex,
}

impl LoginPatterns {
    /// Patterns for a nested login that ends at `prompt`.
    pub fn new(prompt: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            password: Regex::new(patterns::PASSWORD)?,
            password_reprompt: Regex::new(patterns::PASSWORD_PROMPT)?,
            prompt: patterns::compile_prompt_pattern(prompt)?,
            host_key_confirm: Regex::new(patterns::HOST_KEY_CONFIRM)?,
            refused: Regex::new(patterns::LOGIN_REFUSED)?,
        })
    }
}

/// One nested login attempt.
pub(crate) struct Login<'a> {
    pub host: &'a str,
    pub password: &'a SecretString,
    pub patterns: &'a LoginPatterns,
    pub accept_new_host_key: bool,
}

impl Login<'_> {
    /// Drive the login from `state` until it is `Ready`.
    ///
    /// `state` is updated on every transition and left at `Failed` when
    /// a wait times out or the login is refused.
    pub async fn run<S: ShellIo>(
        &self,
        channel: &mut ExpectChannel<S>,
        state: &mut SessionState,
    ) -> Result<()> {
        let result = self.step_until_ready(channel, state).await;
        if result.is_err() {
            *state = SessionState::Failed;
        }
        result
    }

    async fn step_until_ready<S: ShellIo>(
        &self,
        channel: &mut ExpectChannel<S>,
        state: &mut SessionState,
    ) -> Result<()> {
        let p = self.patterns;

        loop {
            debug!("{}: login state {}", self.host, state);

            match *state {
                SessionState::AwaitingPassword => {
                    let (index, found) = channel
                        .expect_any(&[&p.password, &p.host_key_confirm, &p.refused])
                        .await?;
                    match index {
                        0 => {
                            channel.send_secret(self.password).await?;
                            *state = SessionState::AwaitingPrompt;
                        }
                        1 if self.accept_new_host_key => {
                            warn!("{}: accepting unknown host key on the jump host", self.host);
                            channel.send_line("yes").await?;
                        }
                        1 => {
                            return Err(SessionError::HostKeyConfirmation {
                                host: self.host.to_string(),
                            }
                            .into());
                        }
                        _ => return Err(self.rejected(found.matched)),
                    }
                }

                SessionState::AwaitingPrompt => {
                    let (index, found) = channel
                        .expect_any(&[&p.prompt, &p.password_reprompt, &p.refused])
                        .await?;
                    match index {
                        0 => *state = SessionState::Ready,
                        1 => return Err(self.rejected("password not accepted".to_string())),
                        _ => return Err(self.rejected(found.matched)),
                    }
                }

                SessionState::Ready => return Ok(()),

                other => return Err(SessionError::NotReady { state: other }.into()),
            }
        }
    }

    fn rejected(&self, reason: String) -> crate::Error {
        SessionError::LoginRejected {
            host: self.host.to_string(),
            reason: reason.trim().to_string(),
        }
        .into()
    }
}
