//! Nested switch shells opened from the jump host.

use log::{debug, info};
use regex::bytes::Regex;

use super::jump::JumpHostSession;
use super::state::{Login, LoginPatterns, SessionState};
use crate::channel::{Expectation, ShellIo, patterns};
use crate::credentials::SwitchCredentials;
use crate::error::{ChannelError, Result, SessionError};

/// Turns off `--More--` paging for the rest of the switch session.
pub const DISABLE_PAGING: &str = "term len 0";

/// The switch currently nested in the jump-host shell.
#[derive(Debug, Clone)]
pub struct SwitchContext {
    /// Target switch hostname.
    pub host: String,

    /// Login progress of the nested shell.
    pub state: SessionState,

    /// Full prompt text (e.g. `sw-b#`) once discovered.
    pub prompt: Option<String>,
}

impl<S: ShellIo> JumpHostSession<S> {
    /// Log into `host` from the jump-host shell and disable paging.
    ///
    /// On failure the nested slot keeps the half-open switch so that
    /// [`resync`](Self::resync) knows how to get out of it.
    pub async fn login_switch(
        &mut self,
        host: &str,
        credentials: &SwitchCredentials,
        accept_new_host_key: bool,
    ) -> Result<()> {
        self.ensure_ready()?;
        if let Some(active) = &self.nested {
            return Err(SessionError::NestedSessionActive {
                host: active.host.clone(),
            }
            .into());
        }

        self.nested = Some(SwitchContext {
            host: host.to_string(),
            state: SessionState::AwaitingPassword,
            prompt: None,
        });

        // Leading space keeps the command out of history (HISTCONTROL)
        self.channel
            .send_line(&format!(" ssh {}@{}", credentials.username, host))
            .await?;

        let login_patterns =
            LoginPatterns::new(patterns::PRIVILEGED_PROMPT).map_err(ChannelError::from)?;
        let login = Login {
            host,
            password: &credentials.password,
            patterns: &login_patterns,
            accept_new_host_key,
        };

        let mut state = SessionState::AwaitingPassword;
        let result = login.run(&mut self.channel, &mut state).await;
        if let Some(context) = self.nested.as_mut() {
            context.state = state;
        }
        result?;

        self.channel.send_line(DISABLE_PAGING).await?;
        self.channel.expect(&login_patterns.prompt).await?;

        info!("logged into {}", host);
        Ok(())
    }

    fn switch_context(&mut self) -> Result<&mut SwitchContext> {
        match self.nested.as_mut() {
            Some(context) if context.state == SessionState::Ready => Ok(context),
            _ => Err(SessionError::NoNestedSession.into()),
        }
    }

    /// Learn the switch's exact prompt.
    ///
    /// Sends an empty line and takes the last line before the next `#`.
    pub async fn discover_prompt(&mut self) -> Result<String> {
        self.switch_context()?;

        let privileged = Regex::new(patterns::PRIVILEGED_PROMPT).map_err(ChannelError::from)?;
        self.channel.send_line("").await?;
        let found = self.channel.expect(&privileged).await?;

        let name = found.last_line().trim();
        let prompt = format!("{}#", name);
        debug!("discovered prompt {:?}", prompt);

        self.switch_context()?.prompt = Some(prompt.clone());
        Ok(prompt)
    }

    /// Run a command on the switch and return everything printed before
    /// the prompt came back, command echo included.
    pub async fn run_command(&mut self, command: &str) -> Result<Expectation> {
        let known = self.switch_context()?.prompt.clone();
        let prompt = match known {
            Some(prompt) => prompt,
            None => self.discover_prompt().await?,
        };
        let pattern = patterns::literal_prompt(&prompt).map_err(ChannelError::from)?;

        self.channel.send_line(command).await?;
        self.channel.expect(&pattern).await
    }

    /// Exit the switch shell and wait for the jump-host prompt.
    pub async fn logout_switch(&mut self) -> Result<()> {
        let host = self.switch_context()?.host.clone();

        self.channel.send_line("exit").await?;
        self.channel.expect(&self.shell_prompt).await?;

        self.nested = None;
        debug!("left {}", host);
        Ok(())
    }
}
