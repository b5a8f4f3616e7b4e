//! Local reachability checks run before each switch login.
//!
//! The check runs on the operator's machine, not on the jump host, so how
//! to ping depends on where checkstack itself is running. Each supported
//! environment gets its own strategy; anything else fails closed.

use std::fmt;
use std::future::Future;
use std::process::Stdio;
use std::str::FromStr;
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use tokio::process::Command;

/// Windows `ping` summary: `Packets: Sent = 1, Received = 1, Lost = 0`.
static WINDOWS_SUMMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Packets.*Sent.*Received = ([0-9]+)").unwrap());

/// iputils/BSD summary: `1 packets transmitted, 1 (packets )?received`.
static UNIX_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+) packets transmitted, ([0-9]+) (?:packets )?received").unwrap()
});

/// Decides whether a switch is worth a login attempt.
///
/// A `true` is only a hint: the login that follows still handles its
/// own failures.
pub trait ReachabilityProbe: Send + Sync {
    fn is_reachable(&self, host: &str) -> impl Future<Output = bool> + Send;
}

/// Command-line flavor of the local `ping` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingSyntax {
    /// `ping -n 1 -w 2000 <host>` (Windows, also under Cygwin).
    Windows,
    /// `ping -c 1 -W 2 <host>` (Linux, macOS, BSD).
    Unix,
}

impl PingSyntax {
    fn args<'a>(&self, host: &'a str) -> [&'a str; 5] {
        match self {
            Self::Windows => ["-n", "1", "-w", "2000", host],
            Self::Unix => ["-c", "1", "-W", "2", host],
        }
    }

    /// Packets received according to one summary line, if it is one.
    pub fn received(&self, line: &str) -> Option<u64> {
        let (pattern, group) = match self {
            Self::Windows => (&*WINDOWS_SUMMARY, 1),
            Self::Unix => (&*UNIX_SUMMARY, 2),
        };
        pattern
            .captures(line)
            .and_then(|caps| caps.get(group))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Scan full ping output; reachable iff the first summary line
    /// reports at least one reply.
    pub fn reachable_from_output(&self, output: &str) -> bool {
        output
            .lines()
            .find_map(|line| self.received(line))
            .is_some_and(|received| received > 0)
    }
}

/// Runs the system `ping` once.
#[derive(Debug, Clone)]
pub struct SystemPing {
    syntax: PingSyntax,
    program: String,
}

impl SystemPing {
    pub fn new(syntax: PingSyntax) -> Self {
        Self {
            syntax,
            program: "ping".to_string(),
        }
    }

    /// Use a different ping executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn syntax(&self) -> PingSyntax {
        self.syntax
    }
}

impl ReachabilityProbe for SystemPing {
    async fn is_reachable(&self, host: &str) -> bool {
        let output = Command::new(&self.program)
            .args(self.syntax.args(host))
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => match String::from_utf8(output.stdout) {
                Ok(text) => {
                    let reachable = self.syntax.reachable_from_output(&text);
                    debug!("ping {}: reachable={}", host, reachable);
                    reachable
                }
                Err(_) => {
                    debug!("ping {}: output is not UTF-8", host);
                    false
                }
            },
            Err(e) => {
                warn!("could not run {}: {}", self.program, e);
                false
            }
        }
    }
}

/// Stand-in for environments with no known ping syntax.
#[derive(Debug, Clone)]
pub struct Unsupported {
    platform: String,
}

impl Unsupported {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }

    fn notice(&self, host: &str) -> String {
        format!(
            "running on unknown system type '{}'; cannot issue correct ping for {}",
            self.platform, host
        )
    }
}

impl ReachabilityProbe for Unsupported {
    async fn is_reachable(&self, host: &str) -> bool {
        let notice = self.notice(host);
        // Shown with the other per-host notices even when logging is off
        println!("{}", notice);
        warn!("{}", notice);
        false
    }
}

/// Skips the check entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeReachable;

impl ReachabilityProbe for AssumeReachable {
    async fn is_reachable(&self, _host: &str) -> bool {
        true
    }
}

/// Operator's choice of reachability check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReachabilityMode {
    /// Pick by the operating system checkstack runs on.
    #[default]
    Auto,
    Windows,
    Unix,
    /// Log into every host without pinging.
    Skip,
}

impl FromStr for ReachabilityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "windows" => Ok(Self::Windows),
            "unix" => Ok(Self::Unix),
            "skip" => Ok(Self::Skip),
            other => Err(format!(
                "unknown reachability mode '{other}' (expected auto, windows, unix or skip)"
            )),
        }
    }
}

impl fmt::Display for ReachabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Windows => "windows",
            Self::Unix => "unix",
            Self::Skip => "skip",
        })
    }
}

/// The strategy chosen for this run.
#[derive(Debug, Clone)]
pub enum ReachabilityStrategy {
    Ping(SystemPing),
    Unsupported(Unsupported),
    Skip(AssumeReachable),
}

impl ReachabilityStrategy {
    pub fn from_mode(mode: ReachabilityMode) -> Self {
        match mode {
            ReachabilityMode::Auto => Self::detect(),
            ReachabilityMode::Windows => Self::Ping(SystemPing::new(PingSyntax::Windows)),
            ReachabilityMode::Unix => Self::Ping(SystemPing::new(PingSyntax::Unix)),
            ReachabilityMode::Skip => Self::Skip(AssumeReachable),
        }
    }

    /// Strategy for the operating system checkstack was built for.
    pub fn detect() -> Self {
        Self::for_platform(std::env::consts::OS)
    }

    /// Strategy for an operating system name as in `std::env::consts::OS`.
    pub fn for_platform(os: &str) -> Self {
        match os {
            "windows" | "cygwin" => Self::Ping(SystemPing::new(PingSyntax::Windows)),
            "linux" | "macos" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" | "illumos"
            | "solaris" => Self::Ping(SystemPing::new(PingSyntax::Unix)),
            other => Self::Unsupported(Unsupported::new(other)),
        }
    }
}

impl ReachabilityProbe for ReachabilityStrategy {
    async fn is_reachable(&self, host: &str) -> bool {
        match self {
            Self::Ping(ping) => ping.is_reachable(host).await,
            Self::Unsupported(unsupported) => unsupported.is_reachable(host).await,
            Self::Skip(skip) => skip.is_reachable(host).await,
        }
    }
}
