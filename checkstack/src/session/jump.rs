//! The single relay shell on the jump host.

use log::{debug, info, warn};
use regex::bytes::Regex;

use super::state::SessionState;
use super::switch::SwitchContext;
use crate::channel::{ExpectChannel, ExpectConfig, ShellIo, patterns};
use crate::config::RunConfig;
use crate::credentials::{Credentials, duplicate_secret};
use crate::error::{ChannelError, Result, SessionError};
use crate::transport::{AuthMethod, JumpHostConfig, SshShell, SshTransport};

/// Keeps later commands (and the nested ssh with its user name) out of
/// the jump host's shell history.
pub const DISABLE_HISTORY: &str = "HISTCONTROL=ignoreboth; export HISTCONTROL; set | grep -i histcon";

/// Command whose output, unlike its echo, contains `SYNC_MARKER`.
const SYNC_COMMAND: &str = "echo checkstack-sync-$((6*7))";
const SYNC_MARKER: &str = "checkstack-sync-42";

/// Ctrl-C ends an ssh client still logging in. The `~.` escape at the
/// start of a line ends one connected to a shell that ignores Ctrl-C.
/// The final return leaves the jump-host command line empty either way.
const LEAVE_PENDING_LOGIN: &[u8] = b"\x03\r~.\r";

/// Interactive session on the jump host.
///
/// Switch logins run as nested shells inside this one; the nested slot
/// records which switch currently owns the terminal.
pub struct JumpHostSession<S> {
    pub(crate) channel: ExpectChannel<S>,
    host: String,
    state: SessionState,
    pub(crate) nested: Option<SwitchContext>,
    pub(crate) shell_prompt: Regex,
}

impl JumpHostSession<SshShell> {
    /// Connect to the configured jump host and prepare its shell.
    pub async fn open(config: &RunConfig, credentials: &Credentials) -> Result<Self> {
        let auth = match (&config.jump_key, &credentials.jump_password) {
            (Some(path), passphrase) => AuthMethod::PrivateKey {
                path: path.clone(),
                passphrase: passphrase.as_ref().map(duplicate_secret),
            },
            (None, Some(password)) => AuthMethod::Password(duplicate_secret(password)),
            (None, None) => {
                return Err(crate::Error::InvalidConfig {
                    message: "no password or key for the jump host".to_string(),
                });
            }
        };

        let transport_config = JumpHostConfig {
            host: config.jump_host.clone(),
            port: config.jump_port,
            username: credentials.jump_user.clone(),
            auth,
            timeout: config.timeout,
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: config.host_key_verification,
            known_hosts_path: config.known_hosts_path.clone(),
        };

        let transport = SshTransport::connect(&transport_config).await?;
        let shell = transport.open_shell().await?;

        Self::establish(shell, &config.jump_host, config.expect_config()).await
    }
}

impl<S: ShellIo> JumpHostSession<S> {
    /// Take over an authenticated shell: wait for the prompt, then turn
    /// off history recording.
    pub async fn establish(shell: S, host: &str, config: ExpectConfig) -> Result<Self> {
        if config.echo {
            warn!("session echo is on: passwords will be shown on this terminal");
        }

        let mut session = Self {
            channel: ExpectChannel::new(shell, config),
            host: host.to_string(),
            state: SessionState::AwaitingPrompt,
            nested: None,
            shell_prompt: Regex::new(patterns::SHELL_PROMPT).map_err(ChannelError::from)?,
        };

        let result = session.prepare_shell().await;
        if result.is_err() {
            session.state = SessionState::Failed;
        }
        result.map(|()| session)
    }

    async fn prepare_shell(&mut self) -> Result<()> {
        self.channel.expect(&self.shell_prompt).await?;
        self.state = SessionState::Ready;

        self.channel.send_line(DISABLE_HISTORY).await?;
        self.channel.expect(&self.shell_prompt).await?;

        info!("jump host {} ready", self.host);
        Ok(())
    }

    /// Name of the jump host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Current state of the jump-host shell.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The switch whose shell is nested in this session, if any.
    pub fn nested(&self) -> Option<&SwitchContext> {
        self.nested.as_ref()
    }

    pub(crate) fn ensure_ready(&self) -> Result<()> {
        if self.state != SessionState::Ready {
            return Err(SessionError::NotReady { state: self.state }.into());
        }
        Ok(())
    }

    /// Bring the terminal back to a clean jump-host prompt after a
    /// failed switch operation.
    ///
    /// Leaves the nested shell (`exit` once logged in, otherwise Ctrl-C
    /// followed by the ssh `~.` escape), then round-trips a marker command
    /// so stale output cannot pair with the next host's commands.
    pub async fn resync(&mut self) -> Result<()> {
        let host = match self.nested.take() {
            Some(context) => {
                if context.state == SessionState::Ready {
                    debug!("{}: leaving switch shell", context.host);
                    self.channel.send_line("exit").await?;
                } else {
                    debug!("{}: abandoning login ({})", context.host, context.state);
                    self.channel.send_raw(LEAVE_PENDING_LOGIN).await?;
                }
                context.host
            }
            None => self.host.clone(),
        };

        let marker = Regex::new(SYNC_MARKER).map_err(ChannelError::from)?;
        let synced = async {
            self.channel.expect(&self.shell_prompt).await?;
            self.channel.discard_pending();
            self.channel.send_line(SYNC_COMMAND).await?;
            self.channel.expect(&marker).await?;
            self.channel.expect(&self.shell_prompt).await?;
            Ok::<_, crate::Error>(())
        }
        .await;

        match synced {
            Ok(()) => {
                info!("back at the {} prompt", self.host);
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                warn!("resync after {} failed: {}", host, e);
                self.state = SessionState::Failed;
                Err(SessionError::ResyncFailed { host }.into())
            }
        }
    }

    /// Leave the jump host and drop the connection.
    pub async fn close(mut self) -> Result<()> {
        if self.state == SessionState::Ready && self.nested.is_none() {
            // The shell may hang up before the prompt could come back
            if let Err(e) = self.channel.send_line("exit").await {
                debug!("exit not delivered: {}", e);
            }
        }
        self.state = SessionState::Closed;
        self.channel.io_mut().close().await
    }
}
