//! Run configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::channel::ExpectConfig;
use crate::error::{Error, Result};
use crate::reachability::ReachabilityMode;
use crate::transport::HostKeyVerification;

/// Jump host used when none is configured.
pub const DEFAULT_JUMP_HOST: &str = "somehost.somewhere.com";

/// Time allowed for each expected prompt, and for the jump-host connect.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// What a failed switch does to the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Report the host, resync the jump-host shell and carry on.
    #[default]
    IsolateHost,

    /// Stop at the first failed host.
    AbortRun,
}

/// Everything one run needs besides the operator's credentials.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub jump_host: String,
    pub jump_port: u16,
    /// Private key for the jump host instead of a password.
    pub jump_key: Option<PathBuf>,
    pub host_key_verification: HostKeyVerification,
    pub known_hosts_path: Option<PathBuf>,
    pub timeout: Duration,
    /// Where host logs and member files are written.
    pub output_dir: PathBuf,
    pub reachability: ReachabilityMode,
    /// Answer "yes" when the jump host's ssh asks about a switch key.
    pub accept_new_switch_keys: bool,
    pub failure_policy: FailurePolicy,
    /// Copy session traffic to stdout.
    pub echo_session: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jump_host: DEFAULT_JUMP_HOST.to_string(),
            jump_port: 22,
            jump_key: None,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            timeout: DEFAULT_TIMEOUT,
            output_dir: PathBuf::from("."),
            reachability: ReachabilityMode::default(),
            accept_new_switch_keys: false,
            failure_policy: FailurePolicy::default(),
            echo_session: false,
        }
    }
}

impl RunConfig {
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Expect settings for the jump-host shell.
    pub fn expect_config(&self) -> ExpectConfig {
        ExpectConfig {
            timeout: self.timeout,
            echo: self.echo_session,
            ..ExpectConfig::default()
        }
    }
}

/// Builder for [`RunConfig`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use checkstack::RunConfig;
///
/// let config = RunConfig::builder()
///     .jump_host("bastion.example.net")
///     .timeout(Duration::from_secs(60))
///     .build()
///     .unwrap();
/// assert_eq!(config.jump_port, 22);
/// ```
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Set the jump host (default: `somehost.somewhere.com`).
    pub fn jump_host(mut self, host: impl Into<String>) -> Self {
        self.config.jump_host = host.into();
        self
    }

    /// Set the jump host SSH port (default: 22).
    pub fn jump_port(mut self, port: u16) -> Self {
        self.config.jump_port = port;
        self
    }

    /// Authenticate to the jump host with a private key.
    pub fn jump_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.jump_key = Some(path.into());
        self
    }

    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.config.host_key_verification = mode;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.known_hosts_path = Some(path.into());
        self
    }

    /// Set the per-prompt timeout (default: 300 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn reachability(mut self, mode: ReachabilityMode) -> Self {
        self.config.reachability = mode;
        self
    }

    pub fn accept_new_switch_keys(mut self, accept: bool) -> Self {
        self.config.accept_new_switch_keys = accept;
        self
    }

    /// Abort the run at the first failed host.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.config.failure_policy = if fail_fast {
            FailurePolicy::AbortRun
        } else {
            FailurePolicy::IsolateHost
        };
        self
    }

    pub fn echo_session(mut self, echo: bool) -> Self {
        self.config.echo_session = echo;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<RunConfig> {
        let config = self.config;

        if config.jump_host.trim().is_empty() {
            return Err(invalid("jump host must not be empty"));
        }
        if config.jump_port == 0 {
            return Err(invalid("jump port must not be 0"));
        }
        if config.timeout.is_zero() {
            return Err(invalid("timeout must be at least one second"));
        }

        Ok(config)
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidConfig {
        message: message.to_string(),
    }
}
