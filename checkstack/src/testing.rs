//! In-memory shells for exercising sessions without a network.
//!
//! [`ScriptedShell`] replays fixed output chunks. [`FakeShell`] emulates
//! a jump-host bash prompt with IOS switches reachable through a nested
//! `ssh`, answering every input line the way the real devices do.

use std::collections::VecDeque;
use std::time::Duration;

use secrecy::SecretString;

use crate::capture::REGISTER_READ;
use crate::channel::{ExpectConfig, ShellIo};
use crate::credentials::SwitchCredentials;
use crate::error::Result;
use crate::reachability::ReachabilityProbe;

pub(crate) const JUMP_PROMPT: &str = "[ops@jump ~]$ ";
pub(crate) const SWITCH_PASSWORD: &str = "la-secret";

/// Short enough that timeout tests stay fast; the fakes answer
/// immediately otherwise.
pub(crate) fn test_expect_config() -> ExpectConfig {
    ExpectConfig {
        timeout: Duration::from_millis(200),
        ..ExpectConfig::default()
    }
}

pub(crate) fn switch_credentials() -> SwitchCredentials {
    SwitchCredentials {
        username: "la-ops".to_string(),
        password: SecretString::from(SWITCH_PASSWORD.to_string()),
    }
}

async fn idle() -> Result<Option<Vec<u8>>> {
    std::future::pending().await
}

/// Replays canned output chunks and records what was written.
pub(crate) struct ScriptedShell {
    chunks: VecDeque<Vec<u8>>,
    written: Vec<u8>,
    hold_open: bool,
}

impl ScriptedShell {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
            written: Vec::new(),
            hold_open: false,
        }
    }

    /// Stay silent instead of closing once the chunks run out.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

impl ShellIo for ScriptedShell {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.written.extend_from_slice(data);
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        match self.chunks.pop_front() {
            Some(chunk) => Ok(Some(chunk)),
            None if self.hold_open => idle().await,
            None => Ok(None),
        }
    }
}

/// One emulated stack behind the jump host.
#[derive(Debug, Clone)]
pub(crate) struct FakeSwitch {
    host: String,
    members: Vec<String>,
    password: String,
    hang_on: Option<String>,
    silent_after_password: bool,
    unknown_host_key: bool,
    user_exec: bool,
}

impl FakeSwitch {
    pub fn new(host: &str, members: &[&str]) -> Self {
        Self {
            host: host.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
            password: SWITCH_PASSWORD.to_string(),
            hang_on: None,
            silent_after_password: false,
            unknown_host_key: false,
            user_exec: false,
        }
    }

    /// Print partial output for `command` and never return the prompt.
    pub fn hang_on(mut self, command: &str) -> Self {
        self.hang_on = Some(command.to_string());
        self
    }

    /// Accept a different password than [`switch_credentials`] sends.
    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    /// Never show a prompt after the password.
    pub fn silent_after_password(mut self) -> Self {
        self.silent_after_password = true;
        self
    }

    /// Make the jump host's ssh ask to confirm the switch's host key.
    pub fn unknown_host_key(mut self) -> Self {
        self.unknown_host_key = true;
        self
    }

    /// Land in user EXEC mode (`sw-a>`) instead of privileged mode.
    pub fn user_exec(mut self) -> Self {
        self.user_exec = true;
        self
    }

    fn prompt(&self) -> String {
        let mode = if self.user_exec { '>' } else { '#' };
        format!("{}{}", self.host, mode)
    }

    fn show_switch(&self) -> String {
        let mut out = String::from(
            "Switch/Stack Mac Address : 0011.2233.4401 - Local Mac Address\r\n\
             Mac persistency wait time: Indefinite\r\n\
             \x20                                            H/W   Current\r\n\
             Switch#   Role    Mac Address     Priority Version  State\r\n\
             ------------------------------------------------------------\r\n",
        );
        for (index, member) in self.members.iter().enumerate() {
            let (marker, role) = match index {
                0 => ('*', "Active "),
                1 => (' ', "Standby"),
                _ => (' ', "Member "),
            };
            out.push_str(&format!(
                "{}{}       {}  0011.2233.44{:02}     {:<2}     V01     Ready\r\n",
                marker,
                member,
                role,
                index + 1,
                15 - index.min(14)
            ));
        }
        out
    }

    fn stack_ports(&self) -> String {
        let mut out = String::from("  Switch#  Port#  Status  Neighbor\r\n  -------  -----  ------  --------\r\n");
        for member in &self.members {
            out.push_str(&format!("    {}        1      OK        {}\r\n", member, member));
            out.push_str(&format!("    {}        2      OK        {}\r\n", member, member));
        }
        out
    }

    fn stack_ports_summary(&self) -> String {
        let mut out = String::from(
            "Sw#/Port#  Port Status  Neighbor  Cable Length  Link OK  Link Active  Sync OK  #Changes to LinkOK  In Loopback\r\n\
             --------------------------------------------------------------------------------------------------------------\r\n",
        );
        for member in &self.members {
            for port in 1..=2 {
                out.push_str(&format!(
                    "{}/{}        OK           {}         50cm          Yes      Yes          Yes      1                   No\r\n",
                    member, port, member
                ));
            }
        }
        out
    }

    fn register_dump(&self, member: &str) -> Option<String> {
        let unit: u32 = member.parse().ok()?;
        self.members.iter().any(|m| m == member).then(|| {
            format!(
                "For asic 0 core 0\r\n\
                 SifRacRwCrcErrorCnt on Asic 0 switch {member}\r\n\
                 [0]: 0x{:08x}\r\n\
                 [1]: 0x00000000\r\n",
                unit * 21
            )
        })
    }
}

/// Builder for a [`FakeShell`].
#[derive(Debug, Default)]
pub(crate) struct FakeNetwork {
    switches: Vec<FakeSwitch>,
    silent_jump_host: bool,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_switch(mut self, switch: FakeSwitch) -> Self {
        self.switches.push(switch);
        self
    }

    /// The jump host never shows its prompt.
    pub fn silent_jump_host(mut self) -> Self {
        self.silent_jump_host = true;
        self
    }

    pub fn into_shell(self) -> FakeShell {
        let mut output = VecDeque::new();
        if !self.silent_jump_host {
            output.push_back(format!("Last login: Mon Oct 19 08:00:00 2026\r\n{}", JUMP_PROMPT).into_bytes());
        }
        FakeShell {
            switches: self.switches,
            mode: Mode::Jump,
            line: Vec::new(),
            line_start: true,
            tilde_pending: false,
            output,
            written: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Jump,
    HostKey(usize),
    Password(usize),
    /// Nested ssh waiting on a switch that never answers.
    Stalled,
    Switch(usize),
    Closed,
}

/// Jump-host shell emulator.
pub(crate) struct FakeShell {
    switches: Vec<FakeSwitch>,
    mode: Mode,
    line: Vec<u8>,
    /// Last byte ended a line, so the nested ssh would take `~` as its escape.
    line_start: bool,
    tilde_pending: bool,
    output: VecDeque<Vec<u8>>,
    written: Vec<u8>,
}

impl FakeShell {
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    fn emit(&mut self, text: String) {
        self.output.push_back(text.into_bytes());
    }

    fn interrupt(&mut self) {
        self.line.clear();
        match self.mode {
            Mode::Closed => {}
            // IOS ignores Ctrl-C at the exec prompt
            Mode::Switch(_) => {}
            _ => {
                self.mode = Mode::Jump;
                self.emit(format!("^C\r\n{}", JUMP_PROMPT));
            }
        }
    }

    /// The nested ssh client's `~.` escape: drop the switch connection.
    fn disconnect(&mut self) {
        if let Mode::Switch(index) = self.mode {
            let host = self.switches[index].host.clone();
            self.line.clear();
            self.mode = Mode::Jump;
            self.emit(format!("Connection to {} closed.\r\n{}", host, JUMP_PROMPT));
        }
    }

    fn handle_line(&mut self, line: &str) {
        match self.mode {
            Mode::Jump => self.jump_command(line),
            Mode::HostKey(index) => {
                let host = self.switches[index].host.clone();
                if line.trim() == "yes" {
                    self.switches[index].unknown_host_key = false;
                    self.mode = Mode::Password(index);
                    self.emit(format!(
                        "yes\r\nWarning: Permanently added '{}' (RSA) to the list of known hosts.\r\nPassword: ",
                        host
                    ));
                } else {
                    self.mode = Mode::Jump;
                    self.emit(format!("{}\r\nHost key verification failed.\r\n{}", line, JUMP_PROMPT));
                }
            }
            Mode::Password(index) => {
                let switch = &self.switches[index];
                if line != switch.password {
                    self.emit("\r\nPermission denied, please try again.\r\nPassword: ".to_string());
                } else if switch.silent_after_password {
                    self.mode = Mode::Stalled;
                } else {
                    let prompt = switch.prompt();
                    self.mode = Mode::Switch(index);
                    self.emit(format!("\r\n\r\n{}", prompt));
                }
            }
            Mode::Stalled | Mode::Closed => {}
            Mode::Switch(index) => self.switch_command(index, line),
        }
    }

    fn jump_command(&mut self, line: &str) {
        let command = line.trim();

        let reply = if command.is_empty() {
            String::new()
        } else if command.starts_with("HISTCONTROL=") {
            "HISTCONTROL=ignoreboth\r\n".to_string()
        } else if let Some(text) = command.strip_prefix("echo ") {
            format!("{}\r\n", text.replace("$((6*7))", "42"))
        } else if let Some(target) = command.strip_prefix("ssh ") {
            let host = target.rsplit('@').next().unwrap_or(target);
            match self.switches.iter().position(|s| s.host == host) {
                Some(index) if self.switches[index].unknown_host_key => {
                    self.mode = Mode::HostKey(index);
                    self.emit(format!(
                        "{}\r\nThe authenticity of host '{}' can't be established.\r\n\
                         Are you sure you want to continue connecting (yes/no/[fingerprint])? ",
                        line, host
                    ));
                    return;
                }
                Some(index) => {
                    self.mode = Mode::Password(index);
                    self.emit(format!("{}\r\n({}) Password: ", line, target));
                    return;
                }
                None => format!(
                    "ssh: Could not resolve hostname {}: Name or service not known\r\n",
                    host
                ),
            }
        } else if command == "exit" {
            self.mode = Mode::Closed;
            self.emit(format!("{}\r\nlogout\r\n", line));
            return;
        } else {
            format!("-bash: {}: command not found\r\n", command)
        };

        self.emit(format!("{}\r\n{}{}", line, reply, JUMP_PROMPT));
    }

    fn switch_command(&mut self, index: usize, line: &str) {
        let switch = &self.switches[index];
        let command = line.trim();

        if switch.hang_on.as_deref() == Some(command) {
            self.emit(format!("{}\r\nBuilding stack port table...\r\n", line));
            return;
        }

        let reply = match command {
            "" | "term len 0" => String::new(),
            "show clock" => "*08:15:02.123 UTC Mon Oct 19 2026\r\n".to_string(),
            "show switch" => switch.show_switch(),
            "show switch stack-ports" => switch.stack_ports(),
            "show switch stack-ports summ" => switch.stack_ports_summary(),
            "exit" => {
                let host = switch.host.clone();
                self.mode = Mode::Jump;
                self.emit(format!("{}\r\nConnection to {} closed.\r\n{}", line, host, JUMP_PROMPT));
                return;
            }
            other => other
                .strip_prefix(REGISTER_READ)
                .and_then(|rest| rest.strip_prefix(" switch "))
                .and_then(|member| switch.register_dump(member))
                .unwrap_or_else(|| "                  ^\r\n% Invalid input detected at '^' marker.\r\n".to_string()),
        };

        let prompt = switch.prompt();
        self.emit(format!("{}\r\n{}{}", line, reply, prompt));
    }
}

impl ShellIo for FakeShell {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.written.extend_from_slice(data);
        for &byte in data {
            if self.tilde_pending {
                self.tilde_pending = false;
                if byte == b'.' {
                    self.disconnect();
                    continue;
                }
                self.line.push(b'~');
            }
            if byte == b'~' && self.line_start && matches!(self.mode, Mode::Switch(_)) {
                self.tilde_pending = true;
                continue;
            }
            self.line_start = matches!(byte, b'\r' | b'\n');

            match byte {
                0x03 => self.interrupt(),
                b'\r' | b'\n' => {
                    let line = String::from_utf8_lossy(&std::mem::take(&mut self.line)).into_owned();
                    self.handle_line(&line);
                }
                other => self.line.push(other),
            }
        }
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        match self.output.pop_front() {
            Some(chunk) => Ok(Some(chunk)),
            None if self.mode == Mode::Closed => Ok(None),
            None => idle().await,
        }
    }
}

/// Reachability answered from a fixed list of hosts.
pub(crate) struct ReachableHosts(pub Vec<&'static str>);

impl ReachabilityProbe for ReachableHosts {
    async fn is_reachable(&self, host: &str) -> bool {
        self.0.iter().any(|reachable| *reachable == host)
    }
}
