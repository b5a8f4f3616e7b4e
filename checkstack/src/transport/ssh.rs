//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use russh::client::{self, Handle, KeyboardInteractiveAuthResponse, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg};
use secrecy::{ExposeSecret, SecretString};

use super::config::{AuthMethod, HostKeyVerification, JumpHostConfig};
use crate::channel::{ShellIo, patterns};
use crate::error::{ChannelError, Result, TransportError};

/// Authenticated SSH connection to the jump host.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Terminal size requested for the shell.
    terminal: (u32, u32),
}

impl SshTransport {
    /// Connect to the jump host and authenticate.
    ///
    /// The whole exchange is bounded by the configured timeout.
    pub async fn connect(config: &JumpHostConfig) -> Result<Self> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(std::time::Duration::from_secs(30)),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification,
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        info!("connecting to jump host {}", config.socket_addr());

        let connect = async {
            let mut session =
                client::connect(ssh_config, (config.host.as_str(), config.port), handler)
                    .await
                    .map_err(|e| {
                        // check_server_key leaves a more precise error behind
                        let stored = host_key_error
                            .lock()
                            .ok()
                            .and_then(|mut slot| slot.take());
                        stored.unwrap_or(TransportError::Ssh(e))
                    })?;

            Self::authenticate(&mut session, config).await?;
            Ok::<_, crate::Error>(session)
        };

        let session = tokio::time::timeout(config.timeout, connect)
            .await
            .map_err(|_| TransportError::Timeout(config.timeout))??;

        Ok(Self {
            session,
            terminal: (config.terminal_width, config.terminal_height),
        })
    }

    /// Open a PTY shell on this connection.
    pub async fn open_shell(self) -> Result<SshShell> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        let (width, height) = self.terminal;
        channel
            .request_pty(true, "vt100", width, height, 0, 0, &[])
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        Ok(SshShell {
            channel,
            transport: Some(self),
        })
    }

    /// Authenticate with the server.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &JumpHostConfig) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::Password(password) => {
                let accepted = session
                    .authenticate_password(&config.username, password.expose_secret())
                    .await
                    .map_err(TransportError::Ssh)?
                    .success();

                if accepted {
                    true
                } else {
                    debug!("password auth refused, trying keyboard-interactive");
                    Self::keyboard_interactive(session, &config.username, password).await?
                }
            }
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                    .map_err(|e| TransportError::Key(format!("{}: {}", path.display(), e)))?;

                // Get the best RSA hash algorithm supported by the server
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        info!("authenticated to jump host as {}", config.username);
        Ok(())
    }

    /// Answer every password-looking keyboard-interactive prompt.
    ///
    /// Prompts that do not ask for a password get an empty answer.
    async fn keyboard_interactive(
        session: &mut Handle<SshHandler>,
        username: &str,
        password: &SecretString,
    ) -> Result<bool> {
        let mut response = session
            .authenticate_keyboard_interactive_start(username, None::<String>)
            .await
            .map_err(TransportError::Ssh)?;

        loop {
            let prompts = match response {
                KeyboardInteractiveAuthResponse::Success => return Ok(true),
                KeyboardInteractiveAuthResponse::Failure { .. } => return Ok(false),
                KeyboardInteractiveAuthResponse::InfoRequest { prompts, .. } => prompts,
            };

            let answers: Vec<String> = prompts
                .iter()
                .map(|prompt| {
                    if prompt.prompt.contains(patterns::PASSWORD) {
                        password.expose_secret().to_string()
                    } else {
                        debug!("no answer for prompt {:?}", prompt.prompt);
                        String::new()
                    }
                })
                .collect();

            response = session
                .authenticate_keyboard_interactive_respond(answers)
                .await
                .map_err(TransportError::Ssh)?;
        }
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Interactive PTY shell on the jump host.
pub struct SshShell {
    channel: Channel<Msg>,
    transport: Option<SshTransport>,
}

impl ShellIo for SshShell {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.channel
            .data(data)
            .await
            .map_err(|e| ChannelError::Ssh(e).into())
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::ExtendedData { data, .. }) => return Ok(Some(data.to_vec())),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => return Ok(None),
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    debug!("jump-host shell exited with status {}", exit_status);
                }
                Some(_) => {}
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        // The channel may already be gone after "exit"
        let _ = self.channel.eof().await;
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Stores a detailed host-key error so connect() can surface it
    /// instead of the generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found,
    /// `Err(TransportError::HostKeyChanged)` if key changed.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(Default::default());

        match self.host_key_verification {
            HostKeyVerification::Disabled => {
                warn!(
                    "accepting host key {} for {} without verification",
                    fingerprint, self.host
                );
                Ok(true)
            }

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    info!("learning new host key {} for {}", fingerprint, self.host);
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    Ok(true)
                }
                Err(e) => Ok(self.reject(e)),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => Ok(self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                })),
                Err(e) => Ok(self.reject(e)),
            },
        }
    }
}
