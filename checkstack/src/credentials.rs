//! Operator credentials for the jump host and the switches.

use std::io::{self, BufRead, Write};

use secrecy::{ExposeSecret, SecretString};

use crate::error::{CredentialError, Result};

/// User name offered when the operator just presses enter.
pub const DEFAULT_JUMP_USER: &str = "user";

/// Prefix turning a jump-host user into its privileged (LA) account.
pub const PRIVILEGED_PREFIX: &str = "la-";

/// Privileged account used for every switch login.
#[derive(Debug)]
pub struct SwitchCredentials {
    pub username: String,
    pub password: SecretString,
}

/// Everything the operator is asked for once per run.
#[derive(Debug)]
pub struct Credentials {
    pub jump_user: String,
    /// Jump-host password, or key passphrase when a key is used.
    pub jump_password: Option<SecretString>,
    pub switch: SwitchCredentials,
}

/// Source of operator input.
pub trait Prompter {
    /// Show `prompt` and read one line of visible input.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Show `prompt` and read one line without echoing it.
    fn read_secret(&mut self, prompt: &str) -> io::Result<String>;
}

/// Prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        rpassword::prompt_password(prompt)
    }
}

/// Ask for all credentials.
///
/// With `key_auth` the jump-host prompt asks for the key passphrase
/// instead, and an empty answer means the key is not encrypted.
pub fn collect<P: Prompter>(prompter: &mut P, jump_host: &str, key_auth: bool) -> Result<Credentials> {
    println!("\nGathering usernames and passwords for network access.");

    let jump_user = read(prompter, "jump-host username", |p| {
        p.read_line(&format!("Enter username for {} [{}]: ", jump_host, DEFAULT_JUMP_USER))
    })?;
    let jump_user = or_default(jump_user, DEFAULT_JUMP_USER.to_string());

    let jump_password = if key_auth {
        let passphrase = read(prompter, "key passphrase", |p| {
            p.read_secret("Enter passphrase for key (empty for none): ")
        })?;
        (!passphrase.is_empty()).then(|| SecretString::from(passphrase))
    } else {
        let password = read(prompter, "jump-host password", |p| {
            p.read_secret(&format!("Enter password for {}: ", jump_host))
        })?;
        Some(SecretString::from(password))
    };

    let derived = format!("{}{}", PRIVILEGED_PREFIX, jump_user);
    let switch_user = read(prompter, "LA username", |p| {
        p.read_line(&format!("Enter LA username [{}]: ", derived))
    })?;
    let switch_user = or_default(switch_user, derived);

    let switch_password = read(prompter, "LA password", |p| p.read_secret("Enter LA password: "))?;

    Ok(Credentials {
        jump_user,
        jump_password,
        switch: SwitchCredentials {
            username: switch_user,
            password: SecretString::from(switch_password),
        },
    })
}

fn read<P: Prompter>(
    prompter: &mut P,
    field: &'static str,
    ask: impl FnOnce(&mut P) -> io::Result<String>,
) -> Result<String> {
    ask(prompter).map_err(|source| CredentialError { field, source }.into())
}

fn or_default(value: String, default: String) -> String {
    if value.is_empty() { default } else { value }
}

/// Copy a secret without exposing it anywhere but the new box.
pub(crate) fn duplicate_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}
